//! # Aggregation Views
//!
//! Read-only projections recomputed from whole collections on every call.

use chrono::NaiveDate;
use shared::{HealthEventType, IntakeStatus, SubstanceType, TodayProgress};

use crate::backend::domain::models::health_event::HealthEvent;
use crate::backend::domain::models::intake_log::IntakeLog;
use crate::backend::domain::models::substance::Substance;

/// Progress over a day's logs; `percentage` counts taken and skipped as done
pub fn today_progress<'a>(logs: impl IntoIterator<Item = &'a IntakeLog>) -> TodayProgress {
    let mut progress = TodayProgress::default();
    for log in logs {
        progress.total += 1;
        match log.status {
            IntakeStatus::Taken => progress.taken += 1,
            IntakeStatus::Skipped => progress.skipped += 1,
            IntakeStatus::Pending => progress.pending += 1,
            IntakeStatus::Missed => {}
        }
    }

    if progress.total > 0 {
        let done = (progress.taken + progress.skipped) as f64;
        progress.percentage = (100.0 * done / progress.total as f64).round() as u32;
    }
    progress
}

pub fn pending_logs(logs: &[IntakeLog]) -> Vec<&IntakeLog> {
    logs.iter().filter(|l| l.status == IntakeStatus::Pending).collect()
}

pub fn completed_logs(logs: &[IntakeLog]) -> Vec<&IntakeLog> {
    logs.iter().filter(|l| l.is_completed()).collect()
}

/// Illnesses without an end date
pub fn active_illnesses(events: &[HealthEvent]) -> Vec<HealthEvent> {
    events
        .iter()
        .filter(|e| e.event_type == HealthEventType::Illness && e.is_ongoing())
        .cloned()
        .collect()
}

/// Appointments starting today or later
pub fn upcoming_appointments(events: &[HealthEvent], today: NaiveDate) -> Vec<HealthEvent> {
    events
        .iter()
        .filter(|e| e.event_type == HealthEventType::Appointment && e.start_date >= today)
        .cloned()
        .collect()
}

pub fn active_substances(substances: &[Substance]) -> Vec<&Substance> {
    substances.iter().filter(|s| s.is_active).collect()
}

/// Substances split by category, each keeping the input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstanceGroups {
    pub medicine: Vec<Substance>,
    pub vitamin: Vec<Substance>,
    pub supplement: Vec<Substance>,
}

pub fn substances_by_type(substances: Vec<Substance>) -> SubstanceGroups {
    let mut groups = SubstanceGroups::default();
    for substance in substances {
        match substance.substance_type {
            SubstanceType::Medicine => groups.medicine.push(substance),
            SubstanceType::Vitamin => groups.vitamin.push(substance),
            SubstanceType::Supplement => groups.supplement.push(substance),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn log(status: IntakeStatus) -> IntakeLog {
        let now = Utc::now();
        IntakeLog {
            id: crate::backend::domain::models::generate_id(),
            user_id: "user-1".to_string(),
            child_id: "child-1".to_string(),
            substance_id: "substance-1".to_string(),
            schedule_id: None,
            scheduled_time: NaiveDate::from_ymd_opt(2024, 3, 6)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            actual_time: None,
            status,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(event_type: HealthEventType, start: NaiveDate, end: Option<NaiveDate>) -> HealthEvent {
        let now = Utc::now();
        HealthEvent {
            id: crate::backend::domain::models::generate_id(),
            user_id: "user-1".to_string(),
            child_id: "child-1".to_string(),
            event_type,
            title: "event".to_string(),
            description: None,
            start_date: start,
            end_date: end,
            severity: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_today_progress_percentage() {
        let logs = vec![
            log(IntakeStatus::Taken),
            log(IntakeStatus::Taken),
            log(IntakeStatus::Skipped),
            log(IntakeStatus::Pending),
        ];
        assert_eq!(
            today_progress(&logs),
            TodayProgress { taken: 2, skipped: 1, pending: 1, total: 4, percentage: 75 }
        );
        assert_eq!(pending_logs(&logs).len(), 1);
        assert_eq!(completed_logs(&logs).len(), 3);
    }

    #[test]
    fn test_today_progress_empty_and_rounding() {
        assert_eq!(today_progress(&Vec::<IntakeLog>::new()), TodayProgress::default());

        let logs = vec![log(IntakeStatus::Taken), log(IntakeStatus::Pending), log(IntakeStatus::Missed)];
        let progress = today_progress(&logs);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percentage, 33);
    }

    #[test]
    fn test_active_illnesses_and_upcoming_appointments() {
        let today = date(2024, 3, 6);
        let events = vec![
            event(HealthEventType::Illness, date(2024, 3, 1), None),
            event(HealthEventType::Illness, date(2024, 2, 1), Some(date(2024, 2, 5))),
            event(HealthEventType::Appointment, date(2024, 3, 6), None),
            event(HealthEventType::Appointment, date(2024, 3, 5), None),
            event(HealthEventType::Vaccination, date(2024, 4, 1), None),
        ];

        let illnesses = active_illnesses(&events);
        assert_eq!(illnesses.len(), 1);
        assert_eq!(illnesses[0].start_date, date(2024, 3, 1));

        let appointments = upcoming_appointments(&events, today);
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].start_date, today);
    }

    fn substance(name: &str, substance_type: SubstanceType, is_active: bool) -> Substance {
        let now = Utc::now();
        Substance {
            id: crate::backend::domain::models::generate_id(),
            user_id: "user-1".to_string(),
            child_id: "child-1".to_string(),
            name: name.to_string(),
            substance_type,
            dosage: None,
            unit: None,
            description: None,
            instructions: None,
            is_active,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_substance_filters_and_groups() {
        let substances = vec![
            substance("Ibuprofen", SubstanceType::Medicine, true),
            substance("Vitamin D", SubstanceType::Vitamin, false),
            substance("Iron", SubstanceType::Supplement, true),
            substance("Paracetamol", SubstanceType::Medicine, true),
        ];

        let active: Vec<&str> = active_substances(&substances).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(active, vec!["Ibuprofen", "Iron", "Paracetamol"]);

        let groups = substances_by_type(substances);
        let medicine: Vec<&str> = groups.medicine.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(medicine, vec!["Ibuprofen", "Paracetamol"]);
        assert_eq!(groups.vitamin.len(), 1);
        assert_eq!(groups.supplement.len(), 1);
    }
}
