//! # REST API for Intake Logs
//!
//! Daily dosing checklist: log generation from schedules, status changes
//! (including the device notification actions) and progress.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::backend::domain::models::datetime::{local_now, local_today, parse_date, parse_local_timestamp};
use crate::backend::io::rest::auth::CurrentUser;
use crate::backend::io::rest::extract::{ApiJson, ApiPath, ApiQuery, OptionalJson};
use crate::backend::io::rest::error::{error_response, json_error};
use crate::backend::io::rest::mappers::IntakeLogMapper;
use crate::backend::AppState;
use shared::{
    CreateManualLogRequest, GenerateLogsRequest, MarkIntakeRequest, SnoozeRequest,
    UpdateIntakeLogRequest,
};

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Create a router for intake log APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_intake_logs).post(create_manual_log))
        .route("/today", get(get_today_logs))
        .route("/today/progress", get(get_today_progress))
        .route("/generate", post(generate_logs))
        .route("/:log_id", get(get_intake_log).put(update_intake_log))
        .route("/:log_id/taken", post(mark_taken))
        .route("/:log_id/skipped", post(mark_skipped))
        .route("/:log_id/snooze", post(snooze_log))
}

/// A calendar date, or the date part of a local timestamp
fn parse_day(value: &str) -> Option<NaiveDate> {
    parse_date(value)
        .or_else(|_| parse_local_timestamp(value).map(|instant| instant.date()))
        .ok()
}

async fn list_intake_logs(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<DateRangeQuery>,
) -> impl IntoResponse {
    info!("GET /api/intake-logs - query: {:?}", query);

    let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing start or end date");
    };
    let (Some(start), Some(end)) = (parse_day(start), parse_day(end)) else {
        return json_error(StatusCode::BAD_REQUEST, "Invalid start or end date, expected YYYY-MM-DD");
    };

    match state.intake_log_service.logs_between(&user_id, start, end).await {
        Ok(logs) => (StatusCode::OK, Json(IntakeLogMapper::to_list_dto(logs))).into_response(),
        Err(e) => error_response("Failed to list intake logs", e),
    }
}

async fn get_today_logs(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/intake-logs/today");

    match state.intake_log_service.today_logs(&user_id).await {
        Ok(logs) => (StatusCode::OK, Json(IntakeLogMapper::to_list_dto(logs))).into_response(),
        Err(e) => error_response("Failed to get today's intake logs", e),
    }
}

async fn get_today_progress(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/intake-logs/today/progress");

    match state.intake_log_service.today_progress(&user_id).await {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(e) => error_response("Failed to compute today's progress", e),
    }
}

async fn generate_logs(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    OptionalJson(body): OptionalJson<GenerateLogsRequest>,
) -> impl IntoResponse {
    let request = body.unwrap_or_default();
    info!("POST /api/intake-logs/generate - date: {:?}", request.date);

    let date = match request.date.as_deref() {
        Some(value) => match parse_day(value) {
            Some(date) => date,
            None => return json_error(StatusCode::BAD_REQUEST, format!("Invalid date '{}'", value)),
        },
        None => local_today(),
    };

    match state.intake_log_service.reconcile(&user_id, date).await {
        Ok(created) => (StatusCode::OK, Json(IntakeLogMapper::to_generate_response_dto(created))).into_response(),
        Err(e) => error_response("Failed to generate intake logs", e),
    }
}

async fn create_manual_log(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<CreateManualLogRequest>,
) -> impl IntoResponse {
    info!("POST /api/intake-logs - request: {:?}", request);

    match state.intake_log_service.create_manual_log(&user_id, request).await {
        Ok(log) => (StatusCode::CREATED, Json(IntakeLogMapper::to_with_substance_dto(log))).into_response(),
        Err(e) => error_response("Failed to create intake log", e),
    }
}

async fn get_intake_log(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(log_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("GET /api/intake-logs/{}", log_id);

    match state.intake_log_service.get_log(&user_id, &log_id).await {
        Ok(log) => (StatusCode::OK, Json(IntakeLogMapper::to_with_substance_dto(log))).into_response(),
        Err(e) => error_response("Failed to get intake log", e),
    }
}

async fn update_intake_log(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(log_id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateIntakeLogRequest>,
) -> impl IntoResponse {
    info!("PUT /api/intake-logs/{} - request: {:?}", log_id, request);

    match state.intake_log_service.update_log(&user_id, &log_id, request).await {
        Ok(log) => (StatusCode::OK, Json(IntakeLogMapper::to_with_substance_dto(log))).into_response(),
        Err(e) => error_response("Failed to update intake log", e),
    }
}

async fn mark_taken(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(log_id): ApiPath<String>,
    OptionalJson(body): OptionalJson<MarkIntakeRequest>,
) -> impl IntoResponse {
    info!("POST /api/intake-logs/{}/taken", log_id);
    let notes = body.and_then(|request| request.notes);

    match state.intake_log_service.mark_taken(&user_id, &log_id, notes).await {
        Ok(log) => (StatusCode::OK, Json(IntakeLogMapper::to_with_substance_dto(log))).into_response(),
        Err(e) => error_response("Failed to mark intake log taken", e),
    }
}

async fn mark_skipped(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(log_id): ApiPath<String>,
    OptionalJson(body): OptionalJson<MarkIntakeRequest>,
) -> impl IntoResponse {
    info!("POST /api/intake-logs/{}/skipped", log_id);
    let notes = body.and_then(|request| request.notes);

    match state.intake_log_service.mark_skipped(&user_id, &log_id, notes).await {
        Ok(log) => (StatusCode::OK, Json(IntakeLogMapper::to_with_substance_dto(log))).into_response(),
        Err(e) => error_response("Failed to mark intake log skipped", e),
    }
}

/// Device "snooze" action
async fn snooze_log(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(log_id): ApiPath<String>,
    OptionalJson(body): OptionalJson<SnoozeRequest>,
) -> impl IntoResponse {
    let minutes = body.and_then(|request| request.minutes);
    info!("POST /api/intake-logs/{}/snooze - minutes: {:?}", log_id, minutes);

    match state.reminder_service.snooze(&user_id, &log_id, minutes, local_now()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to snooze intake log", e),
    }
}
