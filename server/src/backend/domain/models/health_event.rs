use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use shared::{HealthEventType, Severity};

use super::substance::Substance;

/// A discrete or ranged health occurrence; `end_date: None` means ongoing
#[derive(Debug, Clone, PartialEq)]
pub struct HealthEvent {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub event_type: HealthEventType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub severity: Option<Severity>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HealthEvent {
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthEventSubstance {
    pub id: String,
    pub health_event_id: String,
    pub substance_id: String,
    pub dosage_override: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthEventWithSubstances {
    pub event: HealthEvent,
    pub substances: Vec<(HealthEventSubstance, Substance)>,
}
