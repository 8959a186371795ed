//! # REST API for Schedules
//!
//! Recurrence rules (time of day, weekdays, validity window) per substance.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::backend::io::rest::auth::CurrentUser;
use crate::backend::io::rest::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::mappers::ScheduleMapper;
use crate::backend::io::rest::substance_apis::ActiveFilterQuery;
use crate::backend::AppState;
use shared::{CreateScheduleRequest, UpdateScheduleRequest};

/// Create a router for schedule APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route(
            "/:schedule_id",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/:schedule_id/toggle", post(toggle_schedule))
}

/// Schedules with their substance, ordered by time of day
async fn list_schedules(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<ActiveFilterQuery>,
) -> impl IntoResponse {
    info!("GET /api/schedules - active_only: {}", query.active_only);

    match state
        .schedule_service
        .list_schedules_with_substance(&user_id, query.active_only)
        .await
    {
        Ok(entries) => {
            let entries: Vec<_> = entries
                .into_iter()
                .map(|(schedule, substance)| ScheduleMapper::to_with_substance_dto(schedule, substance))
                .collect();
            (StatusCode::OK, Json(entries)).into_response()
        }
        Err(e) => error_response("Failed to list schedules", e),
    }
}

async fn get_schedule(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(schedule_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("GET /api/schedules/{}", schedule_id);

    match state.schedule_service.get_schedule(&user_id, &schedule_id).await {
        Ok(schedule) => (StatusCode::OK, Json(ScheduleMapper::to_dto(schedule))).into_response(),
        Err(e) => error_response("Failed to get schedule", e),
    }
}

async fn create_schedule(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<CreateScheduleRequest>,
) -> impl IntoResponse {
    info!("POST /api/schedules - request: {:?}", request);

    match state.schedule_service.create_schedule(&user_id, request).await {
        Ok(schedule) => (StatusCode::CREATED, Json(ScheduleMapper::to_dto(schedule))).into_response(),
        Err(e) => error_response("Failed to create schedule", e),
    }
}

async fn update_schedule(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(schedule_id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateScheduleRequest>,
) -> impl IntoResponse {
    info!("PUT /api/schedules/{} - request: {:?}", schedule_id, request);

    match state.schedule_service.update_schedule(&user_id, &schedule_id, request).await {
        Ok(schedule) => (StatusCode::OK, Json(ScheduleMapper::to_dto(schedule))).into_response(),
        Err(e) => error_response("Failed to update schedule", e),
    }
}

async fn toggle_schedule(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(schedule_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("POST /api/schedules/{}/toggle", schedule_id);

    match state.schedule_service.toggle_schedule(&user_id, &schedule_id).await {
        Ok(schedule) => (StatusCode::OK, Json(ScheduleMapper::to_dto(schedule))).into_response(),
        Err(e) => error_response("Failed to toggle schedule", e),
    }
}

async fn delete_schedule(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(schedule_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("DELETE /api/schedules/{}", schedule_id);

    match state.schedule_service.delete_schedule(&user_id, &schedule_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete schedule", e),
    }
}
