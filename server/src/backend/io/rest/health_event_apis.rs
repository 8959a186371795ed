//! # REST API for Health Events
//!
//! Illnesses, vaccinations, milestones, appointments and treatments, with
//! the substances used for them.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use tracing::info;

use crate::backend::io::rest::auth::CurrentUser;
use crate::backend::io::rest::extract::{ApiJson, ApiPath};
use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::mappers::HealthEventMapper;
use crate::backend::AppState;
use shared::{CreateHealthEventRequest, LinkSubstanceRequest, UpdateHealthEventRequest};

/// Create a router for health event APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_health_events).post(create_health_event))
        .route("/active-illnesses", get(list_active_illnesses))
        .route("/upcoming-appointments", get(list_upcoming_appointments))
        .route(
            "/:event_id",
            get(get_health_event).put(update_health_event).delete(delete_health_event),
        )
        .route("/:event_id/substances", post(link_substance))
        .route("/:event_id/substances/:substance_id", delete(unlink_substance))
}

async fn list_health_events(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/health-events");

    match state.health_event_service.list_health_events(&user_id).await {
        Ok(events) => (StatusCode::OK, Json(HealthEventMapper::to_list_dto(events))).into_response(),
        Err(e) => error_response("Failed to list health events", e),
    }
}

async fn list_active_illnesses(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/health-events/active-illnesses");

    match state.health_event_service.active_illnesses(&user_id).await {
        Ok(events) => (StatusCode::OK, Json(HealthEventMapper::to_list_dto(events))).into_response(),
        Err(e) => error_response("Failed to list active illnesses", e),
    }
}

async fn list_upcoming_appointments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> impl IntoResponse {
    info!("GET /api/health-events/upcoming-appointments");

    match state.health_event_service.upcoming_appointments(&user_id).await {
        Ok(events) => (StatusCode::OK, Json(HealthEventMapper::to_list_dto(events))).into_response(),
        Err(e) => error_response("Failed to list upcoming appointments", e),
    }
}

async fn get_health_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(event_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("GET /api/health-events/{}", event_id);

    match state.health_event_service.get_with_substances(&user_id, &event_id).await {
        Ok(event) => (StatusCode::OK, Json(HealthEventMapper::to_with_substances_dto(event))).into_response(),
        Err(e) => error_response("Failed to get health event", e),
    }
}

async fn create_health_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<CreateHealthEventRequest>,
) -> impl IntoResponse {
    info!("POST /api/health-events - type: {}, title: {}", request.event_type, request.title);

    match state.health_event_service.create_health_event(&user_id, request).await {
        Ok(event) => (StatusCode::CREATED, Json(HealthEventMapper::to_dto(event))).into_response(),
        Err(e) => error_response("Failed to create health event", e),
    }
}

async fn update_health_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(event_id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateHealthEventRequest>,
) -> impl IntoResponse {
    info!("PUT /api/health-events/{} - request: {:?}", event_id, request);

    match state
        .health_event_service
        .update_health_event(&user_id, &event_id, request)
        .await
    {
        Ok(event) => (StatusCode::OK, Json(HealthEventMapper::to_dto(event))).into_response(),
        Err(e) => error_response("Failed to update health event", e),
    }
}

async fn delete_health_event(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(event_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("DELETE /api/health-events/{}", event_id);

    match state.health_event_service.delete_health_event(&user_id, &event_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete health event", e),
    }
}

async fn link_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(event_id): ApiPath<String>,
    ApiJson(request): ApiJson<LinkSubstanceRequest>,
) -> impl IntoResponse {
    info!("POST /api/health-events/{}/substances - substance: {}", event_id, request.substance_id);

    match state.health_event_service.link_substance(&user_id, &event_id, request).await {
        Ok(event) => (StatusCode::CREATED, Json(HealthEventMapper::to_with_substances_dto(event))).into_response(),
        Err(e) => error_response("Failed to link substance", e),
    }
}

async fn unlink_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath((event_id, substance_id)): ApiPath<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/health-events/{}/substances/{}", event_id, substance_id);

    match state
        .health_event_service
        .unlink_substance(&user_id, &event_id, &substance_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to unlink substance", e),
    }
}
