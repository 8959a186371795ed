//! # REST API Interface Layer
//!
//! JSON over HTTP under `/api`. Each `*_apis` module exposes a `router()`
//! nested at its resource path. Handlers resolve the principal with
//! `auth::CurrentUser`, call one service operation, and turn the outcome
//! into a response: domain models through the mappers, failures through
//! `error::error_response` as `{error}` bodies.
//! Request bodies, query strings and paths go through the `extract`
//! wrappers, so malformed input is answered with an `{error}` body as well.

pub mod auth;
pub mod calendar_apis;
pub mod child_apis;
pub mod error;
pub mod extract;
pub mod health_event_apis;
pub mod intake_log_apis;
pub mod mappers;
pub mod notification_apis;
pub mod reminder_apis;
pub mod schedule_apis;
pub mod substance_apis;

use axum::Router;

use crate::backend::AppState;

/// All API routes, relative to `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/child", child_apis::router())
        .nest("/substances", substance_apis::router())
        .nest("/schedules", schedule_apis::router())
        .nest("/intake-logs", intake_log_apis::router())
        .nest("/health-events", health_event_apis::router())
        .nest("/calendar", calendar_apis::router())
        .nest("/notifications", notification_apis::router())
        .nest("/reminders", reminder_apis::router())
}
