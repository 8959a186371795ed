use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::substance_repository::{substance_from_row, JOINED_SUBSTANCE_COLUMNS};
use super::{parse_closed, parse_json, parse_optional_closed, parse_utc};
use crate::backend::domain::models::datetime::{format_date, format_utc, parse_date};
use crate::backend::domain::models::health_event::{HealthEvent, HealthEventSubstance};
use crate::backend::domain::models::substance::Substance;
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::HealthEventStorage;

const EVENT_COLUMNS: &str = "id, user_id, child_id, type, title, description, start_date, end_date, \
     severity, metadata, created_at, updated_at";

/// Repository for health events and their linked substances
#[derive(Clone)]
pub struct HealthEventRepository {
    db: DbConnection,
}

impl HealthEventRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn event_from_row(row: &SqliteRow) -> Result<HealthEvent> {
        let event_type: String = row.get("type");
        let end_date: Option<String> = row.get("end_date");
        let metadata: Option<String> = row.get("metadata");
        Ok(HealthEvent {
            id: row.get("id"),
            user_id: row.get("user_id"),
            child_id: row.get("child_id"),
            event_type: parse_closed(&event_type)?,
            title: row.get("title"),
            description: row.get("description"),
            start_date: parse_date(row.get("start_date"))?,
            end_date: end_date.as_deref().map(parse_date).transpose()?,
            severity: parse_optional_closed(row.get("severity"))?,
            metadata: metadata.as_deref().map(parse_json).transpose()?,
            created_at: parse_utc(row.get("created_at"))?,
            updated_at: parse_utc(row.get("updated_at"))?,
        })
    }
}

#[async_trait]
impl HealthEventStorage for HealthEventRepository {
    async fn store_health_event(&self, event: &HealthEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO health_events (id, user_id, child_id, type, title, description, start_date,
                end_date, severity, metadata, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.user_id)
        .bind(&event.child_id)
        .bind(event.event_type.as_str())
        .bind(&event.title)
        .bind(&event.description)
        .bind(format_date(event.start_date))
        .bind(event.end_date.map(format_date))
        .bind(event.severity.map(|s| s.as_str()))
        .bind(event.metadata.as_ref().map(|m| m.to_string()))
        .bind(format_utc(event.created_at))
        .bind(format_utc(event.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_health_event(&self, user_id: &str, event_id: &str) -> Result<Option<HealthEvent>> {
        let sql = format!("SELECT {} FROM health_events WHERE id = ? AND user_id = ?", EVENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::event_from_row).transpose()
    }

    async fn list_health_events(&self, child_id: &str) -> Result<Vec<HealthEvent>> {
        let sql = format!(
            "SELECT {} FROM health_events WHERE child_id = ? ORDER BY start_date DESC, created_at DESC",
            EVENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(child_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::event_from_row).collect()
    }

    async fn list_health_events_between(
        &self,
        child_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HealthEvent>> {
        let sql = format!(
            "SELECT {} FROM health_events \
             WHERE child_id = ? AND start_date >= ? AND start_date <= ? \
             ORDER BY start_date ASC, created_at ASC",
            EVENT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(child_id)
            .bind(format_date(start))
            .bind(format_date(end))
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::event_from_row).collect()
    }

    async fn update_health_event(&self, event: &HealthEvent) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE health_events
            SET type = ?, title = ?, description = ?, start_date = ?, end_date = ?,
                severity = ?, metadata = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(event.event_type.as_str())
        .bind(&event.title)
        .bind(&event.description)
        .bind(format_date(event.start_date))
        .bind(event.end_date.map(format_date))
        .bind(event.severity.map(|s| s.as_str()))
        .bind(event.metadata.as_ref().map(|m| m.to_string()))
        .bind(format_utc(event.updated_at))
        .bind(&event.id)
        .bind(&event.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_health_event(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM health_events WHERE id = ? AND user_id = ?")
            .bind(event_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_substance(&self, link: &HealthEventSubstance) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO health_event_substances (id, health_event_id, substance_id, dosage_override, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.id)
        .bind(&link.health_event_id)
        .bind(&link.substance_id)
        .bind(&link.dosage_override)
        .bind(&link.notes)
        .bind(format_utc(link.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn unlink_substance(&self, event_id: &str, substance_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM health_event_substances WHERE health_event_id = ? AND substance_id = ?",
        )
        .bind(event_id)
        .bind(substance_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_linked_substances(&self, event_id: &str) -> Result<Vec<(HealthEventSubstance, Substance)>> {
        let sql = format!(
            "SELECT hes.id, hes.health_event_id, hes.substance_id, hes.dosage_override, hes.notes, \
             hes.created_at, {} \
             FROM health_event_substances hes JOIN substances s ON s.id = hes.substance_id \
             WHERE hes.health_event_id = ? ORDER BY hes.created_at ASC",
            JOINED_SUBSTANCE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(event_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter()
            .map(|row| {
                let link = HealthEventSubstance {
                    id: row.get("id"),
                    health_event_id: row.get("health_event_id"),
                    substance_id: row.get("substance_id"),
                    dosage_override: row.get("dosage_override"),
                    notes: row.get("notes"),
                    created_at: parse_utc(row.get("created_at"))?,
                };
                Ok((link, substance_from_row(row, "s_")?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::child::Child;
    use crate::backend::domain::models::generate_id;
    use crate::backend::storage::repositories::test_utils::{seed_child, seed_substance, setup_test};
    use chrono::Utc;
    use serde_json::json;
    use shared::{HealthEventType, Severity};

    fn event(child: &Child, title: &str, start: (i32, u32, u32)) -> HealthEvent {
        let now = Utc::now();
        HealthEvent {
            id: generate_id(),
            user_id: child.user_id.clone(),
            child_id: child.id.clone(),
            event_type: HealthEventType::Illness,
            title: title.to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: None,
            severity: Some(Severity::Medium),
            metadata: Some(json!({"temperature": 38.5})),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_and_by_range() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let repo = HealthEventRepository::new(db);

        let flu = event(&child, "Flu", (2024, 2, 10));
        let cold = event(&child, "Cold", (2024, 3, 5));
        let rash = event(&child, "Rash", (2024, 4, 1));
        for e in [&flu, &cold, &rash] {
            repo.store_health_event(e).await.unwrap();
        }

        let titles: Vec<_> = repo
            .list_health_events(&child.id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Rash", "Cold", "Flu"]);

        let march = repo
            .list_health_events_between(
                &child.id,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(march, vec![cold, rash]);
    }

    #[tokio::test]
    async fn test_link_and_unlink_substances() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let substance = seed_substance(&db, &child, "Paracetamol").await;
        let repo = HealthEventRepository::new(db);

        let flu = event(&child, "Flu", (2024, 2, 10));
        repo.store_health_event(&flu).await.unwrap();

        let link = HealthEventSubstance {
            id: generate_id(),
            health_event_id: flu.id.clone(),
            substance_id: substance.id.clone(),
            dosage_override: Some("2.5 ml".to_string()),
            notes: None,
            created_at: Utc::now(),
        };
        repo.link_substance(&link).await.unwrap();

        let linked = repo.list_linked_substances(&flu.id).await.unwrap();
        assert_eq!(linked, vec![(link, substance.clone())]);

        assert!(repo.unlink_substance(&flu.id, &substance.id).await.unwrap());
        assert!(repo.list_linked_substances(&flu.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_clears_end_date_and_delete() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let repo = HealthEventRepository::new(db);

        let mut flu = event(&child, "Flu", (2024, 2, 10));
        flu.end_date = NaiveDate::from_ymd_opt(2024, 2, 14);
        repo.store_health_event(&flu).await.unwrap();

        flu.end_date = None;
        flu.metadata = None;
        repo.update_health_event(&flu).await.unwrap();
        let stored = repo.get_health_event("user-1", &flu.id).await.unwrap().unwrap();
        assert!(stored.is_ongoing());
        assert_eq!(stored.metadata, None);

        assert!(repo.delete_health_event("user-1", &flu.id).await.unwrap());
        assert!(repo.get_health_event("user-1", &flu.id).await.unwrap().is_none());
    }
}
