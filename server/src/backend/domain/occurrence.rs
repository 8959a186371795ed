//! # Schedule Occurrence Expander
//!
//! Decides which schedules are due on a calendar date and at which naive
//! local instant. Schedules are authored in the child's wall-clock frame, so
//! no timezone conversion happens here.

use chrono::{NaiveDate, NaiveDateTime};

use crate::backend::domain::models::schedule::Schedule;

/// One due dose of a schedule
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence<'a> {
    pub schedule: &'a Schedule,
    pub instant: NaiveDateTime,
}

/// Every schedule due on `date`, in input order.
///
/// Schedules sharing a substance and time are separate occurrences.
pub fn occurrences_for(schedules: &[Schedule], date: NaiveDate) -> Vec<Occurrence<'_>> {
    schedules
        .iter()
        .filter(|schedule| schedule.is_due_on(date))
        .map(|schedule| Occurrence {
            schedule,
            instant: schedule.instant_on(date),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn schedule(id: &str, days: &[u8]) -> Schedule {
        let now = Utc::now();
        Schedule {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            substance_id: "substance-1".to_string(),
            child_id: "child-1".to_string(),
            time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            days_of_week: days.to_vec(),
            start_date: date(2024, 1, 1),
            end_date: None,
            reminder_minutes_before: 15,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_gating() {
        let schedules = vec![schedule("mwf", &[1, 3, 5])];

        // 2024-03-06 is a Wednesday, 2024-03-05 a Tuesday
        let wednesday = occurrences_for(&schedules, date(2024, 3, 6));
        assert_eq!(wednesday.len(), 1);
        assert_eq!(
            wednesday[0].instant,
            date(2024, 3, 6).and_hms_opt(8, 30, 0).unwrap()
        );
        assert!(occurrences_for(&schedules, date(2024, 3, 5)).is_empty());
    }

    #[test]
    fn test_sunday_is_day_zero() {
        let schedules = vec![schedule("sunday", &[0])];
        assert_eq!(occurrences_for(&schedules, date(2024, 3, 3)).len(), 1);
        assert!(occurrences_for(&schedules, date(2024, 3, 2)).is_empty());
    }

    #[test]
    fn test_date_window_gating() {
        let mut ended = schedule("ended", &[0, 1, 2, 3, 4, 5, 6]);
        ended.end_date = Some(date(2024, 3, 1));
        let open_ended = schedule("open", &[0, 1, 2, 3, 4, 5, 6]);
        let mut future = schedule("future", &[0, 1, 2, 3, 4, 5, 6]);
        future.start_date = date(2024, 4, 1);

        let schedules = vec![ended, open_ended, future];

        let due: Vec<_> = occurrences_for(&schedules, date(2024, 3, 6))
            .iter()
            .map(|o| o.schedule.id.clone())
            .collect();
        assert_eq!(due, vec!["open"]);

        // Open-ended keeps producing far into the future
        let far = occurrences_for(&schedules, date(2031, 7, 15));
        assert!(far.iter().any(|o| o.schedule.id == "open"));

        // Both window bounds are inclusive
        assert!(occurrences_for(&schedules, date(2024, 3, 1))
            .iter()
            .any(|o| o.schedule.id == "ended"));
        assert!(occurrences_for(&schedules, date(2024, 4, 1))
            .iter()
            .any(|o| o.schedule.id == "future"));
    }

    #[test]
    fn test_inactive_schedule_is_never_due() {
        let mut paused = schedule("paused", &[3]);
        paused.is_active = false;
        assert!(occurrences_for(&[paused], date(2024, 3, 6)).is_empty());
    }

    #[test]
    fn test_identical_schedules_are_independent() {
        let schedules = vec![schedule("a", &[3]), schedule("b", &[3])];
        assert_eq!(occurrences_for(&schedules, date(2024, 3, 6)).len(), 2);
    }
}
