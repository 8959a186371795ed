//! # REST API for Push Notifications
//!
//! Device registration for the current user, and the server-to-server send
//! trigger guarded by the dispatch token.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::backend::io::rest::auth::{CurrentUser, DispatchCaller};
use crate::backend::io::rest::extract::ApiJson;
use crate::backend::io::rest::error::{error_response, json_error};
use crate::backend::io::rest::mappers::PushSubscriptionMapper;
use crate::backend::AppState;
use shared::{SendNotificationRequest, SubscribeRequest, UnsubscribeRequest};

/// Create a router for notification APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/subscriptions", get(list_subscriptions))
        .route("/send", post(send_notification))
}

async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<SubscribeRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/subscribe");

    match state.notification_service.subscribe(&user_id, request).await {
        Ok(subscription) => (StatusCode::OK, Json(PushSubscriptionMapper::to_dto(subscription))).into_response(),
        Err(e) => error_response("Failed to register push subscription", e),
    }
}

async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(request): ApiJson<UnsubscribeRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/unsubscribe");

    match state.notification_service.unsubscribe(&user_id, &request.endpoint).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("Failed to remove push subscription", e),
    }
}

async fn list_subscriptions(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) -> impl IntoResponse {
    info!("GET /api/notifications/subscriptions");

    match state.notification_service.list_subscriptions(&user_id).await {
        Ok(subscriptions) => {
            let subscriptions: Vec<_> = subscriptions.into_iter().map(PushSubscriptionMapper::to_dto).collect();
            (StatusCode::OK, Json(subscriptions)).into_response()
        }
        Err(e) => error_response("Failed to list push subscriptions", e),
    }
}

async fn send_notification(
    State(state): State<AppState>,
    _caller: DispatchCaller,
    ApiJson(request): ApiJson<SendNotificationRequest>,
) -> impl IntoResponse {
    info!("POST /api/notifications/send - user: {:?}", request.user_id);

    let Some(user_id) = request.user_id.filter(|id| !id.trim().is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing userId");
    };

    match state
        .notification_service
        .send(&user_id, request.title, request.body, request.data)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response("Failed to send notification", e),
    }
}
