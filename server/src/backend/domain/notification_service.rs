//! # Notification Dispatch
//!
//! Push subscription registry and the fan-out of one notification to every
//! active device of a user.

use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::generate_id;
use crate::backend::domain::models::push_subscription::PushSubscription;
use crate::backend::io::push::PushTransport;
use crate::backend::storage::{Connection, PushSubscriptionStorage};
use shared::{
    DeliveryDetail, NotificationPayload, SendNotificationResponse, SubscribeRequest,
    DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE,
};

const MISSING_SUBSCRIPTION_DATA: &str = "Missing subscription data (endpoint, p256dh, auth required)";

#[derive(Clone)]
pub struct NotificationService<C: Connection> {
    push_subscription_repository: C::PushSubscriptionRepository,
    transport: Option<Arc<dyn PushTransport>>,
}

impl<C: Connection> NotificationService<C> {
    /// Without a transport every send is a logged no-op
    pub fn new(connection: Arc<C>, transport: Option<Arc<dyn PushTransport>>) -> Self {
        Self {
            push_subscription_repository: connection.create_push_subscription_repository(),
            transport,
        }
    }

    /// Register a device, or refresh and re-activate a known endpoint
    pub async fn subscribe(&self, user_id: &str, request: SubscribeRequest) -> Result<PushSubscription> {
        let (Some(endpoint), Some(p256dh), Some(auth)) = (
            present(request.endpoint),
            present(request.p256dh),
            present(request.auth),
        ) else {
            return Err(DomainError::validation(MISSING_SUBSCRIPTION_DATA).into());
        };

        let now = Utc::now();
        let subscription = PushSubscription {
            id: generate_id(),
            user_id: user_id.to_string(),
            endpoint,
            p256dh,
            auth,
            device_info: request.device_info.filter(|info| !info.is_null()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let stored = self.push_subscription_repository.upsert_subscription(&subscription).await?;

        info!("Registered push subscription {} for user {}", stored.id, user_id);
        Ok(stored)
    }

    /// Deactivate the user's subscription for `endpoint`; unknown endpoints are ignored
    pub async fn unsubscribe(&self, user_id: &str, endpoint: &str) -> Result<()> {
        if endpoint.trim().is_empty() {
            return Err(DomainError::validation("Missing endpoint").into());
        }
        if self.push_subscription_repository.deactivate_endpoint(user_id, endpoint).await? {
            info!("Deactivated push subscription for user {}", user_id);
        } else {
            warn!("No active push subscription to deactivate for user {}", user_id);
        }
        Ok(())
    }

    pub async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>> {
        self.push_subscription_repository.list_subscriptions(user_id).await
    }

    /// Deliver one notification to every active subscription of `user_id`.
    ///
    /// Deliveries run concurrently and fail independently. An endpoint the
    /// push service reports as gone (404/410) is deactivated.
    pub async fn send(
        &self,
        user_id: &str,
        title: Option<String>,
        body: Option<String>,
        data: Option<Value>,
    ) -> Result<SendNotificationResponse> {
        let Some(transport) = self.transport.as_ref() else {
            warn!("Push transport not configured, skipping notification for user {}", user_id);
            return Ok(SendNotificationResponse::default());
        };

        let subscriptions = self.push_subscription_repository.list_active_subscriptions(user_id).await?;
        if subscriptions.is_empty() {
            info!("No active subscriptions for user {}", user_id);
            return Ok(SendNotificationResponse::default());
        }

        let payload = NotificationPayload {
            title: title.filter(|t| !t.is_empty()).unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            body: body.filter(|b| !b.is_empty()).unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.to_string()),
            data: data.filter(|d| !d.is_null()).unwrap_or_else(|| json!({})),
        };
        let payload = serde_json::to_string(&payload)?;

        let deliveries = subscriptions
            .iter()
            .map(|subscription| self.deliver(transport.as_ref(), subscription, &payload));
        let details = join_all(deliveries).await;

        let sent = details.iter().filter(|d| d.success).count();
        let response = SendNotificationResponse {
            sent,
            failed: details.len() - sent,
            details,
        };
        info!(
            "Notification for user {}: {} sent, {} failed",
            user_id, response.sent, response.failed
        );
        Ok(response)
    }

    async fn deliver(
        &self,
        transport: &dyn PushTransport,
        subscription: &PushSubscription,
        payload: &str,
    ) -> DeliveryDetail {
        match transport.send_notification(subscription, payload).await {
            Ok(()) => DeliveryDetail {
                id: subscription.id.clone(),
                success: true,
                error: None,
            },
            Err(e) => {
                warn!("Push to subscription {} failed: {}", subscription.id, e);
                if e.is_gone() {
                    if let Err(db_error) = self
                        .push_subscription_repository
                        .deactivate_subscription(&subscription.id)
                        .await
                    {
                        error!("Failed to deactivate subscription {}: {}", subscription.id, db_error);
                    }
                }
                DeliveryDetail {
                    id: subscription.id.clone(),
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
