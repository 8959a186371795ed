//! SQLite repositories, one per entity.
//!
//! Timestamps are stored as text: audit instants in RFC 3339 UTC, intake
//! instants as naive local `YYYY-MM-DDTHH:MM:SS`, dates as `YYYY-MM-DD`. All
//! three forms sort lexicographically, which the range queries rely on.

pub mod child_repository;
pub mod health_event_repository;
pub mod intake_log_repository;
pub mod profile_log_repository;
pub mod push_subscription_repository;
pub mod schedule_repository;
pub mod substance_repository;

#[cfg(test)]
pub(crate) mod test_utils;

pub use child_repository::ChildRepository;
pub use health_event_repository::HealthEventRepository;
pub use intake_log_repository::IntakeLogRepository;
pub use profile_log_repository::ProfileLogRepository;
pub use push_subscription_repository::PushSubscriptionRepository;
pub use schedule_repository::ScheduleRepository;
pub use substance_repository::SubstanceRepository;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::str::FromStr;

pub(crate) fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .with_context(|| format!("Invalid stored timestamp: {}", value))
}

pub(crate) fn parse_closed<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(value.parse::<T>()?)
}

pub(crate) fn parse_optional_closed<T>(value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.as_deref().map(parse_closed).transpose()
}

pub(crate) fn parse_json<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_str(value).with_context(|| format!("Invalid stored JSON: {}", value))
}

/// True when the error is a violated UNIQUE constraint
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}
