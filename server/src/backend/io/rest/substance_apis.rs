//! # REST API for Substances
//!
//! Medicines, vitamins and supplements of the user's child.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::backend::io::rest::auth::CurrentUser;
use crate::backend::io::rest::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::io::rest::error::error_response;
use crate::backend::io::rest::mappers::{ScheduleMapper, SubstanceMapper};
use crate::backend::AppState;
use shared::{CreateSubstanceRequest, UpdateSubstanceRequest};

/// `?active_only=true` restricts a listing to active rows
#[derive(Debug, Default, Deserialize)]
pub struct ActiveFilterQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// Create a router for substance APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_substances).post(create_substance))
        .route("/with-schedules", get(list_substances_with_schedules))
        .route("/by-type", get(substances_by_type))
        .route(
            "/:substance_id",
            get(get_substance).put(update_substance).delete(delete_substance),
        )
        .route("/:substance_id/toggle", post(toggle_substance))
        .route("/:substance_id/schedules", get(list_substance_schedules))
}

async fn list_substances(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<ActiveFilterQuery>,
) -> impl IntoResponse {
    info!("GET /api/substances - active_only: {}", query.active_only);

    match state.substance_service.list_substances(&user_id, query.active_only).await {
        Ok(substances) => (StatusCode::OK, Json(SubstanceMapper::to_list_dto(substances))).into_response(),
        Err(e) => error_response("Failed to list substances", e),
    }
}

async fn list_substances_with_schedules(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> impl IntoResponse {
    info!("GET /api/substances/with-schedules");

    match state.substance_service.list_substances_with_schedules(&user_id).await {
        Ok(entries) => {
            let entries: Vec<_> = entries
                .into_iter()
                .map(|(substance, schedules)| SubstanceMapper::to_with_schedules_dto(substance, schedules))
                .collect();
            (StatusCode::OK, Json(entries)).into_response()
        }
        Err(e) => error_response("Failed to list substances with schedules", e),
    }
}

async fn substances_by_type(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/substances/by-type");

    match state.substance_service.substances_by_type(&user_id).await {
        Ok(groups) => (StatusCode::OK, Json(SubstanceMapper::to_by_type_dto(groups))).into_response(),
        Err(e) => error_response("Failed to group substances", e),
    }
}

async fn get_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(substance_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("GET /api/substances/{}", substance_id);

    match state.substance_service.get_substance(&user_id, &substance_id).await {
        Ok(substance) => (StatusCode::OK, Json(SubstanceMapper::to_dto(substance))).into_response(),
        Err(e) => error_response("Failed to get substance", e),
    }
}

async fn create_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<CreateSubstanceRequest>,
) -> impl IntoResponse {
    info!("POST /api/substances - request: {:?}", request);

    match state.substance_service.create_substance(&user_id, request).await {
        Ok(substance) => (StatusCode::CREATED, Json(SubstanceMapper::to_dto(substance))).into_response(),
        Err(e) => error_response("Failed to create substance", e),
    }
}

async fn update_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(substance_id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateSubstanceRequest>,
) -> impl IntoResponse {
    info!("PUT /api/substances/{} - request: {:?}", substance_id, request);

    match state.substance_service.update_substance(&user_id, &substance_id, request).await {
        Ok(substance) => (StatusCode::OK, Json(SubstanceMapper::to_dto(substance))).into_response(),
        Err(e) => error_response("Failed to update substance", e),
    }
}

async fn toggle_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(substance_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("POST /api/substances/{}/toggle", substance_id);

    match state.substance_service.toggle_substance(&user_id, &substance_id).await {
        Ok(substance) => (StatusCode::OK, Json(SubstanceMapper::to_dto(substance))).into_response(),
        Err(e) => error_response("Failed to toggle substance", e),
    }
}

async fn delete_substance(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(substance_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("DELETE /api/substances/{}", substance_id);

    match state.substance_service.delete_substance(&user_id, &substance_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete substance", e),
    }
}

async fn list_substance_schedules(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(substance_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("GET /api/substances/{}/schedules", substance_id);

    match state
        .schedule_service
        .list_schedules_for_substance(&user_id, &substance_id)
        .await
    {
        Ok(schedules) => {
            let schedules: Vec<_> = schedules.into_iter().map(ScheduleMapper::to_dto).collect();
            (StatusCode::OK, Json(schedules)).into_response()
        }
        Err(e) => error_response("Failed to list substance schedules", e),
    }
}
