use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{parse_json, parse_utc};
use crate::backend::domain::models::datetime::{format_date, format_time, format_utc, parse_date, parse_time};
use crate::backend::domain::models::schedule::Schedule;
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::ScheduleStorage;

const SCHEDULE_COLUMNS: &str = "id, user_id, substance_id, child_id, time, days_of_week, start_date, \
     end_date, reminder_minutes_before, is_active, created_at, updated_at";

/// Repository for dosing schedules
#[derive(Clone)]
pub struct ScheduleRepository {
    db: DbConnection,
}

impl ScheduleRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn schedule_from_row(row: &SqliteRow) -> Result<Schedule> {
        let days_of_week: String = row.get("days_of_week");
        let end_date: Option<String> = row.get("end_date");
        let reminder_minutes_before: i64 = row.get("reminder_minutes_before");
        Ok(Schedule {
            id: row.get("id"),
            user_id: row.get("user_id"),
            substance_id: row.get("substance_id"),
            child_id: row.get("child_id"),
            time: parse_time(row.get("time"))?,
            days_of_week: parse_json(&days_of_week)?,
            start_date: parse_date(row.get("start_date"))?,
            end_date: end_date.as_deref().map(parse_date).transpose()?,
            reminder_minutes_before: reminder_minutes_before.max(0) as u32,
            is_active: row.get("is_active"),
            created_at: parse_utc(row.get("created_at"))?,
            updated_at: parse_utc(row.get("updated_at"))?,
        })
    }

    async fn fetch_schedules(&self, sql: &str, key: &str) -> Result<Vec<Schedule>> {
        let rows = sqlx::query(sql).bind(key).fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::schedule_from_row).collect()
    }
}

#[async_trait]
impl ScheduleStorage for ScheduleRepository {
    async fn store_schedule(&self, schedule: &Schedule) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, user_id, substance_id, child_id, time, days_of_week,
                start_date, end_date, reminder_minutes_before, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&schedule.id)
        .bind(&schedule.user_id)
        .bind(&schedule.substance_id)
        .bind(&schedule.child_id)
        .bind(format_time(schedule.time))
        .bind(serde_json::to_string(&schedule.days_of_week)?)
        .bind(format_date(schedule.start_date))
        .bind(schedule.end_date.map(format_date))
        .bind(schedule.reminder_minutes_before as i64)
        .bind(schedule.is_active)
        .bind(format_utc(schedule.created_at))
        .bind(format_utc(schedule.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_schedule(&self, user_id: &str, schedule_id: &str) -> Result<Option<Schedule>> {
        let sql = format!("SELECT {} FROM schedules WHERE id = ? AND user_id = ?", SCHEDULE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(schedule_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::schedule_from_row).transpose()
    }

    async fn list_schedules(&self, child_id: &str, active_only: bool) -> Result<Vec<Schedule>> {
        let filter = if active_only { " AND is_active = TRUE" } else { "" };
        let sql = format!(
            "SELECT {} FROM schedules WHERE child_id = ?{} ORDER BY time ASC, created_at ASC",
            SCHEDULE_COLUMNS, filter
        );
        self.fetch_schedules(&sql, child_id).await
    }

    async fn list_schedules_for_substance(&self, substance_id: &str) -> Result<Vec<Schedule>> {
        let sql = format!(
            "SELECT {} FROM schedules WHERE substance_id = ? ORDER BY time ASC, created_at ASC",
            SCHEDULE_COLUMNS
        );
        self.fetch_schedules(&sql, substance_id).await
    }

    async fn update_schedule(&self, schedule: &Schedule) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE schedules
            SET substance_id = ?, time = ?, days_of_week = ?, start_date = ?, end_date = ?,
                reminder_minutes_before = ?, is_active = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&schedule.substance_id)
        .bind(format_time(schedule.time))
        .bind(serde_json::to_string(&schedule.days_of_week)?)
        .bind(format_date(schedule.start_date))
        .bind(schedule.end_date.map(format_date))
        .bind(schedule.reminder_minutes_before as i64)
        .bind(schedule.is_active)
        .bind(format_utc(schedule.updated_at))
        .bind(&schedule.id)
        .bind(&schedule.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_schedule(&self, user_id: &str, schedule_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ? AND user_id = ?")
            .bind(schedule_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::repositories::test_utils::{
        sample_schedule, seed_child, seed_substance, setup_test,
    };
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_schedule_round_trip_and_time_ordering() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let substance = seed_substance(&db, &child, "Iron").await;
        let repo = ScheduleRepository::new(db);

        let evening = sample_schedule(&substance, 19, &[0, 6]);
        let mut morning = sample_schedule(&substance, 8, &[1, 3, 5]);
        morning.end_date = NaiveDate::from_ymd_opt(2024, 6, 30);
        repo.store_schedule(&evening).await.unwrap();
        repo.store_schedule(&morning).await.unwrap();

        let schedules = repo.list_schedules(&child.id, false).await.unwrap();
        assert_eq!(schedules, vec![morning.clone(), evening.clone()]);

        let for_substance = repo.list_schedules_for_substance(&substance.id).await.unwrap();
        assert_eq!(for_substance.len(), 2);
    }

    #[tokio::test]
    async fn test_active_only_filter_and_update() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let substance = seed_substance(&db, &child, "Iron").await;
        let repo = ScheduleRepository::new(db);

        let mut schedule = sample_schedule(&substance, 8, &[1]);
        repo.store_schedule(&schedule).await.unwrap();

        schedule.is_active = false;
        schedule.days_of_week = vec![2, 4];
        repo.update_schedule(&schedule).await.unwrap();

        assert!(repo.list_schedules(&child.id, true).await.unwrap().is_empty());
        let stored = repo.get_schedule("user-1", &schedule.id).await.unwrap().unwrap();
        assert_eq!(stored.days_of_week, vec![2, 4]);
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_deleting_substance_cascades_to_schedules() {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let substance = seed_substance(&db, &child, "Iron").await;
        let repo = ScheduleRepository::new(db.clone());
        repo.store_schedule(&sample_schedule(&substance, 8, &[1])).await.unwrap();

        sqlx::query("DELETE FROM substances WHERE id = ?")
            .bind(&substance.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(repo.list_schedules(&child.id, false).await.unwrap().is_empty());
    }
}
