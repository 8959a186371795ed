//! # REST API for the Reminder Sweep
//!
//! Triggered by an external scheduler (cron, queue worker) with the dispatch
//! token; there is no in-process timer.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use tracing::info;

use crate::backend::domain::models::datetime::{local_now, parse_local_timestamp};
use crate::backend::io::rest::auth::DispatchCaller;
use crate::backend::io::rest::extract::ApiJson;
use crate::backend::io::rest::error::{error_response, json_error};
use crate::backend::AppState;
use shared::RunRemindersRequest;

/// Create a router for reminder APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(run_reminders))
}

async fn run_reminders(
    State(state): State<AppState>,
    _caller: DispatchCaller,
    ApiJson(request): ApiJson<RunRemindersRequest>,
) -> impl IntoResponse {
    info!("POST /api/reminders/run - user: {:?}", request.user_id);

    let Some(user_id) = request.user_id.filter(|id| !id.trim().is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing userId");
    };
    let now = match request.now.as_deref() {
        Some(value) => match parse_local_timestamp(value) {
            Ok(now) => now,
            Err(e) => return json_error(StatusCode::BAD_REQUEST, e.to_string()),
        },
        None => local_now(),
    };

    match state.reminder_service.run(&user_id, now).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response("Failed to run reminders", e),
    }
}
