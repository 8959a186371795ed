use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{parse_json, parse_utc};
use crate::backend::domain::models::datetime::format_utc;
use crate::backend::domain::models::push_subscription::PushSubscription;
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::PushSubscriptionStorage;

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, endpoint, p256dh, auth, device_info, is_active, created_at, updated_at";

/// Repository for push subscriptions
#[derive(Clone)]
pub struct PushSubscriptionRepository {
    db: DbConnection,
}

impl PushSubscriptionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn subscription_from_row(row: &SqliteRow) -> Result<PushSubscription> {
        let device_info: Option<String> = row.get("device_info");
        Ok(PushSubscription {
            id: row.get("id"),
            user_id: row.get("user_id"),
            endpoint: row.get("endpoint"),
            p256dh: row.get("p256dh"),
            auth: row.get("auth"),
            device_info: device_info.as_deref().map(parse_json).transpose()?,
            is_active: row.get("is_active"),
            created_at: parse_utc(row.get("created_at"))?,
            updated_at: parse_utc(row.get("updated_at"))?,
        })
    }

    async fn fetch_for_user(&self, user_id: &str, active_only: bool) -> Result<Vec<PushSubscription>> {
        let filter = if active_only { " AND is_active = TRUE" } else { "" };
        let sql = format!(
            "SELECT {} FROM push_subscriptions WHERE user_id = ?{} ORDER BY created_at ASC",
            SUBSCRIPTION_COLUMNS, filter
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::subscription_from_row).collect()
    }
}

#[async_trait]
impl PushSubscriptionStorage for PushSubscriptionRepository {
    async fn upsert_subscription(&self, subscription: &PushSubscription) -> Result<PushSubscription> {
        let sql = format!(
            r#"
            INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, device_info,
                is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (endpoint) DO UPDATE SET
                user_id = excluded.user_id,
                p256dh = excluded.p256dh,
                auth = excluded.auth,
                device_info = excluded.device_info,
                is_active = TRUE,
                updated_at = excluded.updated_at
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&subscription.id)
            .bind(&subscription.user_id)
            .bind(&subscription.endpoint)
            .bind(&subscription.p256dh)
            .bind(&subscription.auth)
            .bind(subscription.device_info.as_ref().map(|d| d.to_string()))
            .bind(subscription.is_active)
            .bind(format_utc(subscription.created_at))
            .bind(format_utc(subscription.updated_at))
            .fetch_one(self.db.pool())
            .await?;

        Self::subscription_from_row(&row)
    }

    async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>> {
        self.fetch_for_user(user_id, false).await
    }

    async fn list_active_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>> {
        self.fetch_for_user(user_id, true).await
    }

    async fn deactivate_subscription(&self, subscription_id: &str) -> Result<()> {
        sqlx::query("UPDATE push_subscriptions SET is_active = FALSE, updated_at = ? WHERE id = ?")
            .bind(format_utc(chrono::Utc::now()))
            .bind(subscription_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn deactivate_endpoint(&self, user_id: &str, endpoint: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE push_subscriptions SET is_active = FALSE, updated_at = ? \
             WHERE user_id = ? AND endpoint = ? AND is_active = TRUE",
        )
        .bind(format_utc(chrono::Utc::now()))
        .bind(user_id)
        .bind(endpoint)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
