use chrono::{DateTime, Utc};
use shared::SubstanceType;

/// A trackable medicine, vitamin or supplement; deactivated rather than deleted
#[derive(Debug, Clone, PartialEq)]
pub struct Substance {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub name: String,
    pub substance_type: SubstanceType,
    pub dosage: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Substance {
    /// "5 ml", "1 tablet", or whichever part is set
    pub fn dosage_label(&self) -> Option<String> {
        match (&self.dosage, &self.unit) {
            (Some(dosage), Some(unit)) => Some(format!("{} {}", dosage, unit)),
            (Some(dosage), None) => Some(dosage.clone()),
            (None, Some(unit)) => Some(unit.clone()),
            (None, None) => None,
        }
    }
}
