use chrono::{DateTime, NaiveDateTime, Utc};
use shared::IntakeStatus;

use super::substance::Substance;

/// One concrete dosing occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeLog {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub substance_id: String,
    /// `None` for manually created logs
    pub schedule_id: Option<String>,
    pub scheduled_time: NaiveDateTime,
    pub actual_time: Option<NaiveDateTime>,
    pub status: IntakeStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntakeLog {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, IntakeStatus::Taken | IntakeStatus::Skipped)
    }
}

/// A log expanded with its substance row
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeLogWithSubstance {
    pub log: IntakeLog,
    pub substance: Substance,
}
