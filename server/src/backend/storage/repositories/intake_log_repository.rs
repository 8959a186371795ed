use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::substance_repository::{substance_from_row, JOINED_SUBSTANCE_COLUMNS};
use super::{parse_closed, parse_utc};
use crate::backend::domain::models::datetime::{
    format_date, format_local_timestamp, format_utc, parse_local_timestamp,
};
use crate::backend::domain::models::intake_log::{IntakeLog, IntakeLogWithSubstance};
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::traits::IntakeLogStorage;

const JOINED_LOG_COLUMNS: &str = "l.id, l.user_id, l.child_id, l.substance_id, l.schedule_id, \
     l.scheduled_time, l.actual_time, l.status, l.notes, l.created_at, l.updated_at";

const INSERT_LOG: &str = r#"
    INSERT INTO intake_logs (id, user_id, child_id, substance_id, schedule_id, scheduled_time,
        scheduled_day, actual_time, status, notes, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// Skips a scheduled log whose (schedule, day) slot is already filled
const INSERT_LOG_IF_ABSENT: &str = r#"
    INSERT INTO intake_logs (id, user_id, child_id, substance_id, schedule_id, scheduled_time,
        scheduled_day, actual_time, status, notes, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (schedule_id, scheduled_day) WHERE schedule_id IS NOT NULL DO NOTHING
"#;

/// Repository for intake logs
#[derive(Clone)]
pub struct IntakeLogRepository {
    db: DbConnection,
}

impl IntakeLogRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn bind_log<'q>(
        sql: &'q str,
        log: &'q IntakeLog,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        sqlx::query(sql)
            .bind(&log.id)
            .bind(&log.user_id)
            .bind(&log.child_id)
            .bind(&log.substance_id)
            .bind(&log.schedule_id)
            .bind(format_local_timestamp(log.scheduled_time))
            .bind(format_date(log.scheduled_time.date()))
            .bind(log.actual_time.map(format_local_timestamp))
            .bind(log.status.as_str())
            .bind(&log.notes)
            .bind(format_utc(log.created_at))
            .bind(format_utc(log.updated_at))
    }

    fn log_from_row(row: &SqliteRow) -> Result<IntakeLogWithSubstance> {
        let actual_time: Option<String> = row.get("actual_time");
        let status: String = row.get("status");
        let log = IntakeLog {
            id: row.get("id"),
            user_id: row.get("user_id"),
            child_id: row.get("child_id"),
            substance_id: row.get("substance_id"),
            schedule_id: row.get("schedule_id"),
            scheduled_time: parse_local_timestamp(row.get("scheduled_time"))?,
            actual_time: actual_time.as_deref().map(parse_local_timestamp).transpose()?,
            status: parse_closed(&status)?,
            notes: row.get("notes"),
            created_at: parse_utc(row.get("created_at"))?,
            updated_at: parse_utc(row.get("updated_at"))?,
        };
        let substance = substance_from_row(row, "s_")?;
        Ok(IntakeLogWithSubstance { log, substance })
    }
}

#[async_trait]
impl IntakeLogStorage for IntakeLogRepository {
    async fn store_intake_log(&self, log: &IntakeLog) -> Result<()> {
        Self::bind_log(INSERT_LOG, log).execute(self.db.pool()).await?;
        Ok(())
    }

    async fn store_intake_logs(&self, logs: &[IntakeLog]) -> Result<Vec<IntakeLog>> {
        if logs.is_empty() {
            return Ok(Vec::new());
        }

        // Dropping the transaction on an early return rolls the batch back
        let mut tx = self.db.pool().begin().await?;
        let mut inserted = Vec::with_capacity(logs.len());
        for log in logs {
            let result = Self::bind_log(INSERT_LOG_IF_ABSENT, log)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() > 0 {
                inserted.push(log.clone());
            }
        }
        tx.commit().await?;

        Ok(inserted)
    }

    async fn get_intake_log(&self, user_id: &str, log_id: &str) -> Result<Option<IntakeLogWithSubstance>> {
        let sql = format!(
            "SELECT {}, {} FROM intake_logs l JOIN substances s ON s.id = l.substance_id \
             WHERE l.id = ? AND l.user_id = ?",
            JOINED_LOG_COLUMNS, JOINED_SUBSTANCE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(log_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::log_from_row).transpose()
    }

    async fn list_intake_logs(
        &self,
        child_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<IntakeLogWithSubstance>> {
        let sql = format!(
            "SELECT {}, {} FROM intake_logs l JOIN substances s ON s.id = l.substance_id \
             WHERE l.child_id = ? AND l.scheduled_time >= ? AND l.scheduled_time < ? \
             ORDER BY l.scheduled_time ASC, l.ROWID ASC",
            JOINED_LOG_COLUMNS, JOINED_SUBSTANCE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(child_id)
            .bind(format_local_timestamp(start))
            .bind(format_local_timestamp(end))
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::log_from_row).collect()
    }

    async fn update_intake_log(&self, log: &IntakeLog) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE intake_logs
            SET actual_time = ?, status = ?, notes = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(log.actual_time.map(format_local_timestamp))
        .bind(log.status.as_str())
        .bind(&log.notes)
        .bind(format_utc(log.updated_at))
        .bind(&log.id)
        .bind(&log.user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
