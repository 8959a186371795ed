//! Translation of service errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

use crate::backend::domain::errors::DomainError;
use shared::ErrorResponse;

/// Status code for a service error; anything that is not a `DomainError`
/// is a store or transport failure
pub fn status_for(e: &anyhow::Error) -> StatusCode {
    match e.downcast_ref::<DomainError>() {
        Some(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
        Some(DomainError::Conflict(_)) => StatusCode::CONFLICT,
        Some(DomainError::Unauthorized) => StatusCode::UNAUTHORIZED,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON `{error}` response for a failed operation, logged under `context`
pub fn error_response(context: &str, e: anyhow::Error) -> Response {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("{}: {:#}", context, e);
    } else {
        warn!("{}: {}", context, e);
    }
    json_error(status, e.to_string())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_pick_status() {
        assert_eq!(status_for(&DomainError::not_found("x").into()), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&DomainError::validation("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::conflict("x").into()), StatusCode::CONFLICT);
        assert_eq!(status_for(&DomainError::Unauthorized.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&anyhow::anyhow!("database is locked")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
