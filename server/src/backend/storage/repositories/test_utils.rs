//! Fixtures shared by the repository tests

use chrono::{NaiveDate, NaiveTime, Utc};
use shared::SubstanceType;

use crate::backend::domain::models::child::Child;
use crate::backend::domain::models::generate_id;
use crate::backend::domain::models::schedule::Schedule;
use crate::backend::domain::models::substance::Substance;
use crate::backend::storage::connection::DbConnection;
use crate::backend::storage::repositories::{ChildRepository, ScheduleRepository, SubstanceRepository};
use crate::backend::storage::traits::{ChildStorage, ScheduleStorage, SubstanceStorage};

pub async fn setup_test() -> DbConnection {
    DbConnection::in_memory().await.expect("Failed to create test database")
}

pub fn sample_child(user_id: &str) -> Child {
    let now = Utc::now();
    Child {
        id: generate_id(),
        user_id: user_id.to_string(),
        name: "Leo".to_string(),
        birth_date: NaiveDate::from_ymd_opt(2022, 1, 15),
        gender: None,
        height_cm: Some(92.5),
        weight_kg: None,
        head_circumference_cm: None,
        blood_type: None,
        allergies: Vec::new(),
        medical_conditions: None,
        notes: Some("Loves bananas".to_string()),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_substance(child: &Child, name: &str) -> Substance {
    let now = Utc::now();
    Substance {
        id: generate_id(),
        user_id: child.user_id.clone(),
        child_id: child.id.clone(),
        name: name.to_string(),
        substance_type: SubstanceType::Vitamin,
        dosage: Some("5".to_string()),
        unit: Some("ml".to_string()),
        description: None,
        instructions: None,
        is_active: true,
        color: Some("#4f46e5".to_string()),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_schedule(substance: &Substance, hour: u32, days: &[u8]) -> Schedule {
    let now = Utc::now();
    Schedule {
        id: generate_id(),
        user_id: substance.user_id.clone(),
        substance_id: substance.id.clone(),
        child_id: substance.child_id.clone(),
        time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        days_of_week: days.to_vec(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: None,
        reminder_minutes_before: 15,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed_child(db: &DbConnection, user_id: &str) -> Child {
    let child = sample_child(user_id);
    ChildRepository::new(db.clone()).store_child(&child).await.unwrap();
    child
}

pub async fn seed_substance(db: &DbConnection, child: &Child, name: &str) -> Substance {
    let substance = sample_substance(child, name);
    SubstanceRepository::new(db.clone()).store_substance(&substance).await.unwrap();
    substance
}

pub async fn seed_schedule(db: &DbConnection, substance: &Substance, hour: u32, days: &[u8]) -> Schedule {
    let schedule = sample_schedule(substance, hour, days);
    ScheduleRepository::new(db.clone()).store_schedule(&schedule).await.unwrap();
    schedule
}
