//! Push delivery seam.
//!
//! Web Push encryption and VAPID signing are done by a relay service; this
//! side only hands it the subscription and the serialized payload and
//! interprets the outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::backend::domain::models::push_subscription::PushSubscription;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// The push service answered with a failure status
    #[error("Push service responded {status_code}: {message}")]
    Rejected { status_code: u16, message: String },

    /// The message never reached the push service
    #[error("Push transport error: {0}")]
    Transport(String),
}

impl PushError {
    /// The endpoint no longer exists and should not be used again
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            PushError::Rejected { status_code: 404 | 410, .. }
        )
    }
}

/// Delivers one serialized payload to one device endpoint
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send_notification(
        &self,
        subscription: &PushSubscription,
        payload: &str,
    ) -> Result<(), PushError>;
}

#[derive(Debug, Serialize)]
struct RelayKeys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Debug, Serialize)]
struct RelaySubscription<'a> {
    endpoint: &'a str,
    keys: RelayKeys<'a>,
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    subscription: RelaySubscription<'a>,
    payload: &'a str,
}

/// Failure body returned by the relay
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayFailure {
    status_code: Option<u16>,
    error: Option<String>,
}

/// `PushTransport` backed by an HTTP push relay
#[derive(Clone)]
pub struct RelayPushTransport {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl RelayPushTransport {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            token,
        }
    }
}

#[async_trait]
impl PushTransport for RelayPushTransport {
    async fn send_notification(
        &self,
        subscription: &PushSubscription,
        payload: &str,
    ) -> Result<(), PushError> {
        let body = RelayRequest {
            subscription: RelaySubscription {
                endpoint: &subscription.endpoint,
                keys: RelayKeys {
                    p256dh: &subscription.p256dh,
                    auth: &subscription.auth,
                },
            },
            payload,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(subscription_id = %subscription.id, "Push relay accepted message");
            return Ok(());
        }

        let failure: RelayFailure = response.json().await.unwrap_or_default();
        Err(relay_error(status, failure))
    }
}

/// Only a status forwarded from the push service says anything about the
/// endpoint; a bare relay failure is a transport problem
fn relay_error(status: reqwest::StatusCode, failure: RelayFailure) -> PushError {
    let message = failure
        .error
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("failed").to_string());
    match failure.status_code {
        Some(status_code) => PushError::Rejected { status_code, message },
        None => PushError::Transport(format!("Push relay responded {}: {}", status.as_u16(), message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_404_and_410_are_gone() {
        let rejected = |status_code| PushError::Rejected {
            status_code,
            message: "x".to_string(),
        };
        assert!(rejected(404).is_gone());
        assert!(rejected(410).is_gone());
        assert!(!rejected(429).is_gone());
        assert!(!rejected(500).is_gone());
        assert!(!PushError::Transport("timeout".to_string()).is_gone());
    }

    #[test]
    fn test_relay_request_shape() {
        let body = RelayRequest {
            subscription: RelaySubscription {
                endpoint: "https://push.example/abc",
                keys: RelayKeys { p256dh: "k", auth: "a" },
            },
            payload: "{}",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["subscription"]["keys"]["p256dh"], "k");
        assert_eq!(value["payload"], "{}");
    }

    fn subscription() -> PushSubscription {
        let now = chrono::Utc::now();
        PushSubscription {
            id: "subscription-1".to_string(),
            user_id: "user-1".to_string(),
            endpoint: "https://push.example/abc".to_string(),
            p256dh: "k".to_string(),
            auth: "a".to_string(),
            device_info: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Serve `router` on an ephemeral local port and return its base URL
    async fn spawn_relay(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_bare_relay_404_is_not_gone() {
        let base = spawn_relay(axum::Router::new()).await;
        let transport = RelayPushTransport::new(format!("{}/wrong-path", base), None);

        let err = transport.send_notification(&subscription(), "{}").await.unwrap_err();
        assert!(matches!(err, PushError::Transport(_)));
        assert!(!err.is_gone());
    }

    #[tokio::test]
    async fn test_forwarded_410_is_gone() {
        use axum::{http::StatusCode, routing::post, Json};

        let router = axum::Router::new().route(
            "/send",
            post(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(serde_json::json!({"statusCode": 410, "error": "push subscription has unsubscribed"})),
                )
            }),
        );
        let base = spawn_relay(router).await;
        let transport = RelayPushTransport::new(format!("{}/send", base), Some("token".to_string()));

        let err = transport.send_notification(&subscription(), "{}").await.unwrap_err();
        assert_eq!(
            err,
            PushError::Rejected {
                status_code: 410,
                message: "push subscription has unsubscribed".to_string(),
            }
        );
        assert!(err.is_gone());
    }

    #[tokio::test]
    async fn test_accepted_message() {
        use axum::{http::StatusCode, routing::post};

        let router = axum::Router::new().route("/send", post(|| async { StatusCode::CREATED }));
        let base = spawn_relay(router).await;
        let transport = RelayPushTransport::new(format!("{}/send", base), None);

        assert_eq!(transport.send_notification(&subscription(), "{}").await, Ok(()));
    }
}
