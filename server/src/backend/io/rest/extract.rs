//! Request extractors whose rejections are `{error}` JSON bodies.
//!
//! Thin wrappers over axum's `Json`, `Query` and `Path`, plus
//! `OptionalJson` for endpoints where the body itself may be left out.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;

use crate::backend::io::rest::error::json_error;

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_error(rejection.status(), rejection.body_text())),
        }
    }
}

/// JSON request body that may be absent.
///
/// An empty body is `None`. A body that is present must be declared as
/// JSON and must parse; anything else is a 400.
#[derive(Debug, Clone, Default)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_declared = has_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| json_error(rejection.status(), rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }
        if !json_declared {
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                "Expected request with `Content-Type: application/json`",
            ));
        }

        match Json::<T>::from_bytes(&bytes) {
            Ok(Json(value)) => Ok(OptionalJson(Some(value))),
            Err(rejection) => Err(json_error(StatusCode::BAD_REQUEST, rejection.body_text())),
        }
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()) else {
        return false;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Query string
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(json_error(rejection.status(), rejection.body_text())),
        }
    }
}

/// Path parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(json_error(rejection.status(), rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct DateBody {
        date: Option<String>,
    }

    fn app() -> Router {
        async fn echo(OptionalJson(body): OptionalJson<DateBody>) -> Json<Value> {
            Json(json!({ "date": body.and_then(|b| b.date) }))
        }
        async fn strict(ApiJson(body): ApiJson<DateBody>) -> Json<Value> {
            Json(json!({ "date": body.date }))
        }
        Router::new().route("/optional", post(echo)).route("/strict", post(strict))
    }

    async fn call(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut request = axum::http::Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        let response = app()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_optional_body_absent_or_present() {
        assert_eq!(call("/optional", None, "").await, (StatusCode::OK, json!({"date": null})));
        assert_eq!(
            call("/optional", Some("application/json"), r#"{"date":"2024-03-06"}"#).await,
            (StatusCode::OK, json!({"date": "2024-03-06"}))
        );
    }

    #[tokio::test]
    async fn test_optional_body_malformed_is_rejected_as_json() {
        let (status, body) = call("/optional", Some("application/json"), r#"{"date":"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call("/optional", Some("application/json"), r#"{"date": 5}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call("/optional", None, r#"{"date":"2024-03-06"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("application/json"));
    }

    #[tokio::test]
    async fn test_strict_body_rejection_is_json() {
        let (status, body) = call("/strict", Some("application/json"), r#"{"date": 5}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());

        let (status, body) = call("/strict", None, "{}").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].is_string());
    }
}
