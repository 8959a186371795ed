//! # REST API for the Calendar Feed

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::backend::domain::CalendarFilter;
use crate::backend::io::rest::auth::CurrentUser;
use crate::backend::io::rest::extract::ApiQuery;
use crate::backend::io::rest::error::{error_response, json_error};
use crate::backend::AppState;

/// `start`/`end` accept a date or a local timestamp; `types` is a comma
/// separated subset of `intakes,health_events`
#[derive(Debug, Deserialize)]
pub struct CalendarEventsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub types: Option<String>,
}

/// Create a router for calendar APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(get_calendar_events))
}

async fn get_calendar_events(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiQuery(query): ApiQuery<CalendarEventsQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/events - query: {:?}", query);

    let (Some(start), Some(end)) = (query.start.as_deref(), query.end.as_deref()) else {
        return json_error(StatusCode::BAD_REQUEST, "Missing start or end date");
    };
    let filter = CalendarFilter::parse(query.types.as_deref());

    match state.calendar_service.events(&user_id, start, end, filter).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => error_response("Failed to build calendar feed", e),
    }
}
