use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use super::repositories::{
    ChildRepository, HealthEventRepository, IntakeLogRepository, ProfileLogRepository,
    PushSubscriptionRepository, ScheduleRepository, SubstanceRepository,
};
use super::traits::Connection;

/// Schema statements, applied in order on every start.
///
/// `intake_logs.scheduled_day` mirrors the calendar day of `scheduled_time`
/// so the partial unique index can hold "one log per schedule per day".
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS children (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        birth_date TEXT,
        gender TEXT CHECK (gender IN ('male', 'female', 'other')),
        height_cm REAL,
        weight_kg REAL,
        head_circumference_cm REAL,
        blood_type TEXT,
        allergies TEXT NOT NULL DEFAULT '[]',
        medical_conditions TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    // One child per user
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_children_user_id
    ON children(user_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS child_profile_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        child_id TEXT NOT NULL,
        changed_at TEXT NOT NULL,
        changes TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (child_id) REFERENCES children (id) ON DELETE CASCADE
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_child_profile_logs_child_changed
    ON child_profile_logs(child_id, changed_at DESC);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS substances (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        child_id TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK (type IN ('medicine', 'vitamin', 'supplement')),
        dosage TEXT,
        unit TEXT,
        description TEXT,
        instructions TEXT,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        color TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (child_id) REFERENCES children (id) ON DELETE CASCADE
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_substances_child_id
    ON substances(child_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schedules (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        substance_id TEXT NOT NULL,
        child_id TEXT NOT NULL,
        time TEXT NOT NULL,
        days_of_week TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        reminder_minutes_before INTEGER NOT NULL DEFAULT 15,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (substance_id) REFERENCES substances (id) ON DELETE CASCADE,
        FOREIGN KEY (child_id) REFERENCES children (id) ON DELETE CASCADE
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_schedules_child_id
    ON schedules(child_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS intake_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        child_id TEXT NOT NULL,
        substance_id TEXT NOT NULL,
        schedule_id TEXT,
        scheduled_time TEXT NOT NULL,
        scheduled_day TEXT NOT NULL,
        actual_time TEXT,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'taken', 'skipped', 'missed')),
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (child_id) REFERENCES children (id) ON DELETE CASCADE,
        FOREIGN KEY (substance_id) REFERENCES substances (id) ON DELETE CASCADE,
        FOREIGN KEY (schedule_id) REFERENCES schedules (id) ON DELETE SET NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_intake_logs_child_scheduled
    ON intake_logs(child_id, scheduled_time);
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_intake_logs_schedule_day
    ON intake_logs(schedule_id, scheduled_day)
    WHERE schedule_id IS NOT NULL;
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS health_events (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        child_id TEXT NOT NULL,
        type TEXT NOT NULL CHECK (type IN
            ('illness', 'vaccination', 'milestone', 'appointment', 'treatment', 'other')),
        title TEXT NOT NULL,
        description TEXT,
        start_date TEXT NOT NULL,
        end_date TEXT,
        severity TEXT CHECK (severity IN ('low', 'medium', 'high')),
        metadata TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (child_id) REFERENCES children (id) ON DELETE CASCADE
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_health_events_child_start
    ON health_events(child_id, start_date);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS health_event_substances (
        id TEXT PRIMARY KEY,
        health_event_id TEXT NOT NULL,
        substance_id TEXT NOT NULL,
        dosage_override TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (health_event_id) REFERENCES health_events (id) ON DELETE CASCADE,
        FOREIGN KEY (substance_id) REFERENCES substances (id) ON DELETE CASCADE
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS push_subscriptions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        endpoint TEXT NOT NULL UNIQUE,
        p256dh TEXT NOT NULL,
        auth TEXT NOT NULL,
        device_info TEXT,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_push_subscriptions_user_active
    ON push_subscriptions(user_id, is_active);
    "#,
];

/// DbConnection manages the SQLite pool and the schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if missing) the database at `url` and apply the schema
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::setup_schema(&pool).await?;

        info!("Database ready at {}", url);
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Private in-memory database, used by tests and throwaway runs.
    ///
    /// The pool is pinned to a single connection that never expires, since
    /// every new in-memory connection would see an empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }
}

impl Connection for DbConnection {
    type ChildRepository = ChildRepository;
    type ProfileLogRepository = ProfileLogRepository;
    type SubstanceRepository = SubstanceRepository;
    type ScheduleRepository = ScheduleRepository;
    type IntakeLogRepository = IntakeLogRepository;
    type HealthEventRepository = HealthEventRepository;
    type PushSubscriptionRepository = PushSubscriptionRepository;

    fn create_child_repository(&self) -> Self::ChildRepository {
        ChildRepository::new(self.clone())
    }

    fn create_profile_log_repository(&self) -> Self::ProfileLogRepository {
        ProfileLogRepository::new(self.clone())
    }

    fn create_substance_repository(&self) -> Self::SubstanceRepository {
        SubstanceRepository::new(self.clone())
    }

    fn create_schedule_repository(&self) -> Self::ScheduleRepository {
        ScheduleRepository::new(self.clone())
    }

    fn create_intake_log_repository(&self) -> Self::IntakeLogRepository {
        IntakeLogRepository::new(self.clone())
    }

    fn create_health_event_repository(&self) -> Self::HealthEventRepository {
        HealthEventRepository::new(self.clone())
    }

    fn create_push_subscription_repository(&self) -> Self::PushSubscriptionRepository {
        PushSubscriptionRepository::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");

        // Applying the schema a second time must not fail
        DbConnection::setup_schema(db.pool()).await.expect("Schema re-apply failed");

        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        let tables: i64 = row.get("n");
        assert_eq!(tables, 8);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = DbConnection::in_memory().await.unwrap();
        let row = sqlx::query("PRAGMA foreign_keys").fetch_one(db.pool()).await.unwrap();
        let enabled: i64 = row.get(0);
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.db");
        let url = format!("sqlite://{}", path.display());

        DbConnection::new(&url).await.expect("Failed to open file database");
        assert!(path.exists());
    }
}
