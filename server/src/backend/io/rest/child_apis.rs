//! # REST API for the Child Profile
//!
//! One child per user: read, create, replace the profile fields, and browse
//! or prune the profile change log.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::backend::domain::errors::NO_CHILD_PROFILE;
use crate::backend::domain::models::datetime::local_today;
use crate::backend::io::rest::auth::CurrentUser;
use crate::backend::io::rest::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::io::rest::error::{error_response, json_error};
use crate::backend::io::rest::mappers::ChildMapper;
use crate::backend::AppState;
use shared::{CreateChildRequest, UpdateChildRequest};

#[derive(Debug, Deserialize)]
pub struct ProfileLogQuery {
    pub limit: Option<u32>,
}

/// Create a router for child profile APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_child).post(create_child).put(update_child))
        .route("/age", get(get_child_age))
        .route("/logs", get(list_profile_logs))
        .route("/logs/:log_id", delete(delete_profile_log))
}

async fn get_child(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/child");

    match state.child_service.get_child(&user_id).await {
        Ok(Some(child)) => (StatusCode::OK, Json(ChildMapper::to_dto(child))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, NO_CHILD_PROFILE),
        Err(e) => error_response("Failed to get child", e),
    }
}

async fn create_child(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/child - name: {}", request.name);

    match state.child_service.create_child(&user_id, request).await {
        Ok(child) => (
            StatusCode::CREATED,
            Json(ChildMapper::to_child_response_dto(child, "Child profile created.")),
        )
            .into_response(),
        Err(e) => error_response("Failed to create child", e),
    }
}

async fn update_child(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<UpdateChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/child");

    match state.child_service.update_child(&user_id, request).await {
        Ok((child, changes)) => (
            StatusCode::OK,
            Json(ChildMapper::to_update_response_dto(child, changes)),
        )
            .into_response(),
        Err(e) => error_response("Failed to update child", e),
    }
}

async fn get_child_age(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/child/age");

    match state.child_service.require_child(&user_id).await {
        Ok(child) => match child.age_on(local_today()) {
            Some(age) => (StatusCode::OK, Json(ChildMapper::to_age_dto(age))).into_response(),
            None => json_error(StatusCode::NOT_FOUND, "Birth date not set"),
        },
        Err(e) => error_response("Failed to get child age", e),
    }
}

async fn list_profile_logs(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<ProfileLogQuery>,
) -> impl IntoResponse {
    info!("GET /api/child/logs - query: {:?}", query);

    match state.child_service.list_profile_logs(&user_id, query.limit).await {
        Ok(logs) => {
            let logs: Vec<_> = logs.into_iter().map(ChildMapper::to_profile_log_dto).collect();
            (StatusCode::OK, Json(logs)).into_response()
        }
        Err(e) => error_response("Failed to list profile logs", e),
    }
}

async fn delete_profile_log(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiPath(log_id): ApiPath<String>,
) -> impl IntoResponse {
    info!("DELETE /api/child/logs/{}", log_id);

    match state.child_service.delete_profile_log(&user_id, &log_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to delete profile log", e),
    }
}
