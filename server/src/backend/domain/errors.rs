use thiserror::Error;

/// Failure kinds the REST layer turns into specific status codes.
///
/// Raised through `anyhow` and recovered with `downcast_ref`; any error that
/// is not a `DomainError` is a store or transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }
}

/// Message used whenever an operation needs the user's child and there is none
pub const NO_CHILD_PROFILE: &str = "No child profile found";
