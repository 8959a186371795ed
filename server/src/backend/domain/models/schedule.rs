use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub const DEFAULT_REMINDER_MINUTES: u32 = 15;

/// Recurrence rule for one substance: a time of day on a set of weekdays
/// within a validity window
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub id: String,
    pub user_id: String,
    pub substance_id: String,
    pub child_id: String,
    pub time: NaiveTime,
    /// 0 = Sunday ... 6 = Saturday
    pub days_of_week: Vec<u8>,
    pub start_date: NaiveDate,
    /// `None` means open-ended
    pub end_date: Option<NaiveDate>,
    pub reminder_minutes_before: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Weekday number of a date, 0 = Sunday
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn is_valid_day_of_week(day: u8) -> bool {
    day <= 6
}

impl Schedule {
    pub fn applies_on_weekday(&self, date: NaiveDate) -> bool {
        self.days_of_week.contains(&weekday_number(date))
    }

    pub fn covers_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Active, on one of its weekdays, and inside its validity window
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.applies_on_weekday(date) && self.covers_date(date)
    }

    /// The naive local instant of this schedule's dose on `date`
    pub fn instant_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_number_starts_on_sunday() {
        // 2024-03-03 is a Sunday
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()), 0);
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()), 6);
        assert!(!is_valid_day_of_week(7));
    }
}
