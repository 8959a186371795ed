use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use shared::{Gender, ProfileChanges};

/// The child profile. Serialized field names match the tracked profile fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Child {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub head_circumference_cm: Option<f64>,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub medical_conditions: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields whose changes are recorded in the audit log
pub const TRACKED_PROFILE_FIELDS: &[&str] = &[
    "name",
    "birth_date",
    "gender",
    "height_cm",
    "weight_kg",
    "head_circumference_cm",
    "blood_type",
    "allergies",
    "medical_conditions",
    "notes",
];

/// Age split into whole years, months and days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl Child {
    pub fn age_on(&self, today: NaiveDate) -> Option<Age> {
        self.birth_date.map(|birth| calculate_age(birth, today))
    }
}

/// Calendar age between `birth` and `today`, borrowing days from the previous month
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> Age {
    let mut years = today.year() - birth.year();
    let mut months = today.month() as i32 - birth.month() as i32;
    let mut days = today.day() as i32 - birth.day() as i32;

    if days < 0 {
        months -= 1;
        days += days_in_previous_month(today) as i32;
    }

    if months < 0 {
        years -= 1;
        months += 12;
    }

    Age { years, months, days }
}

fn days_in_previous_month(date: NaiveDate) -> u32 {
    date.with_day(1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

fn plural(count: i32, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// "3 days old", "2 months, 4 days old", "1 year, 5 months old"
pub fn format_age(age: Age) -> String {
    if age.years == 0 && age.months == 0 {
        return format!("{} old", plural(age.days, "day"));
    }

    let mut parts = Vec::new();
    if age.years == 0 {
        parts.push(plural(age.months, "month"));
        if age.days > 0 {
            parts.push(plural(age.days, "day"));
        }
    } else {
        parts.push(plural(age.years, "year"));
        if age.months > 0 {
            parts.push(plural(age.months, "month"));
        }
    }
    format!("{} old", parts.join(", "))
}

/// Immutable audit record of one profile update
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLog {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub changed_at: DateTime<Utc>,
    pub changes: ProfileChanges,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_borrows_from_previous_month() {
        // March 2024 borrows February's 29 days
        let age = calculate_age(date(2023, 12, 30), date(2024, 3, 2));
        assert_eq!(age, Age { years: 0, months: 2, days: 1 });
    }

    #[test]
    fn test_age_rolls_back_a_year() {
        let age = calculate_age(date(2020, 11, 15), date(2024, 3, 20));
        assert_eq!(age, Age { years: 3, months: 4, days: 5 });
    }

    #[test]
    fn test_format_age_variants() {
        assert_eq!(format_age(Age { years: 0, months: 0, days: 1 }), "1 day old");
        assert_eq!(format_age(Age { years: 0, months: 0, days: 12 }), "12 days old");
        assert_eq!(format_age(Age { years: 0, months: 2, days: 0 }), "2 months old");
        assert_eq!(format_age(Age { years: 0, months: 1, days: 3 }), "1 month, 3 days old");
        assert_eq!(format_age(Age { years: 1, months: 5, days: 9 }), "1 year, 5 months old");
        assert_eq!(format_age(Age { years: 4, months: 0, days: 9 }), "4 years old");
    }
}
