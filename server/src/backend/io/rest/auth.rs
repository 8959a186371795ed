//! Request principals.
//!
//! Authentication happens in front of this service; the proxy forwards the
//! authenticated user id in a header (configurable, `x-user-id` by default).
//! Server-to-server triggers present the dispatch token as a bearer token.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Response,
};
use tracing::warn;

use crate::backend::domain::errors::DomainError;
use crate::backend::io::rest::error::error_response;
use crate::backend::AppState;

/// The authenticated user of the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(state.principal_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match user_id {
            Some(user_id) => Ok(CurrentUser(user_id.to_string())),
            None => Err(error_response(
                &format!("{} {}", parts.method, parts.uri.path()),
                DomainError::Unauthorized.into(),
            )),
        }
    }
}

/// Caller allowed to trigger notifications for any user.
///
/// Open when no dispatch token is configured.
#[derive(Debug, Clone, Copy)]
pub struct DispatchCaller;

#[async_trait]
impl FromRequestParts<AppState> for DispatchCaller {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.dispatch_token.as_deref() else {
            return Ok(DispatchCaller);
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if presented == Some(expected) {
            Ok(DispatchCaller)
        } else {
            warn!("Rejected dispatch call to {} without a valid token", parts.uri.path());
            Err(error_response("Dispatch authorization", DomainError::Unauthorized.into()))
        }
    }
}
