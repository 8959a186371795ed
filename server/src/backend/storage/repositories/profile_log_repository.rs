use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{parse_json, parse_utc};
use crate::backend::domain::models::child::ProfileLog;
use crate::backend::domain::models::datetime::format_utc;
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::ProfileLogStorage;

/// Repository for the profile change audit log
#[derive(Clone)]
pub struct ProfileLogRepository {
    db: DbConnection,
}

impl ProfileLogRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn log_from_row(row: &SqliteRow) -> Result<ProfileLog> {
        let changes: String = row.get("changes");
        Ok(ProfileLog {
            id: row.get("id"),
            user_id: row.get("user_id"),
            child_id: row.get("child_id"),
            changed_at: parse_utc(row.get("changed_at"))?,
            changes: parse_json(&changes)?,
            notes: row.get("notes"),
            created_at: parse_utc(row.get("created_at"))?,
        })
    }
}

#[async_trait]
impl ProfileLogStorage for ProfileLogRepository {
    async fn store_profile_log(&self, log: &ProfileLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO child_profile_logs (id, user_id, child_id, changed_at, changes, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.id)
        .bind(&log.user_id)
        .bind(&log.child_id)
        .bind(format_utc(log.changed_at))
        .bind(serde_json::to_string(&log.changes)?)
        .bind(&log.notes)
        .bind(format_utc(log.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_profile_logs(&self, child_id: &str, limit: u32) -> Result<Vec<ProfileLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, child_id, changed_at, changes, notes, created_at
            FROM child_profile_logs
            WHERE child_id = ?
            ORDER BY changed_at DESC, ROWID DESC
            LIMIT ?
            "#,
        )
        .bind(child_id)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::log_from_row).collect()
    }

    async fn delete_profile_log(&self, user_id: &str, log_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM child_profile_logs WHERE id = ? AND user_id = ?")
            .bind(log_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::generate_id;
    use crate::backend::storage::repositories::test_utils::{seed_child, setup_test};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use shared::{FieldChange, ProfileChanges};

    fn log_for(child_id: &str, minutes_ago: i64, new_name: &str) -> ProfileLog {
        let changed_at = Utc::now() - Duration::minutes(minutes_ago);
        let mut changes = ProfileChanges::new();
        changes.insert(
            "name".to_string(),
            FieldChange { old: json!("Leo"), new: json!(new_name) },
        );
        ProfileLog {
            id: generate_id(),
            user_id: "user-1".to_string(),
            child_id: child_id.to_string(),
            changed_at,
            changes,
            notes: None,
            created_at: changed_at,
        }
    }

    #[tokio::test]
    async fn test_list_profile_logs_newest_first_with_limit() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let repo = ProfileLogRepository::new(db);

        repo.store_profile_log(&log_for(&child.id, 30, "A")).await.unwrap();
        repo.store_profile_log(&log_for(&child.id, 10, "B")).await.unwrap();
        repo.store_profile_log(&log_for(&child.id, 20, "C")).await.unwrap();

        let logs = repo.list_profile_logs(&child.id, 2).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].changes["name"].new, json!("B"));
        assert_eq!(logs[1].changes["name"].new, json!("C"));
    }

    #[tokio::test]
    async fn test_delete_profile_log_is_scoped_to_owner() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let repo = ProfileLogRepository::new(db);

        let log = log_for(&child.id, 5, "B");
        repo.store_profile_log(&log).await.unwrap();

        assert!(!repo.delete_profile_log("user-2", &log.id).await.unwrap());
        assert!(repo.delete_profile_log("user-1", &log.id).await.unwrap());
        assert!(repo.list_profile_logs(&child.id, 20).await.unwrap().is_empty());
    }
}
