use crate::backend::domain::models::child::{
    format_age, Age, Child as DomainChild, ProfileLog as DomainProfileLog,
};
use crate::backend::domain::models::datetime::{format_date, format_utc};
use crate::backend::domain::profile_tracker::describe_changes;
use shared::{
    Child as SharedChild, ChildAgeResponse, ChildResponse, ProfileChanges, ProfileLog as SharedProfileLog,
    UpdateChildResponse,
};

/// Mapper to convert domain child models into shared DTOs.
pub struct ChildMapper;

impl ChildMapper {
    pub fn to_dto(domain: DomainChild) -> SharedChild {
        SharedChild {
            id: domain.id,
            user_id: domain.user_id,
            name: domain.name,
            birth_date: domain.birth_date.map(format_date),
            gender: domain.gender,
            height_cm: domain.height_cm,
            weight_kg: domain.weight_kg,
            head_circumference_cm: domain.head_circumference_cm,
            blood_type: domain.blood_type,
            allergies: domain.allergies,
            medical_conditions: domain.medical_conditions,
            notes: domain.notes,
            created_at: format_utc(domain.created_at),
            updated_at: format_utc(domain.updated_at),
        }
    }

    pub fn to_child_response_dto(domain: DomainChild, message: &str) -> ChildResponse {
        ChildResponse {
            child: Self::to_dto(domain),
            success_message: message.to_string(),
        }
    }

    pub fn to_update_response_dto(domain: DomainChild, changes: ProfileChanges) -> UpdateChildResponse {
        let success_message = if changes.is_empty() {
            "No changes to save.".to_string()
        } else {
            format!("Profile updated ({} field(s) changed).", changes.len())
        };
        UpdateChildResponse {
            child: Self::to_dto(domain),
            changes,
            success_message,
        }
    }

    pub fn to_age_dto(age: Age) -> ChildAgeResponse {
        ChildAgeResponse {
            years: age.years,
            months: age.months,
            days: age.days,
            label: format_age(age),
        }
    }

    pub fn to_profile_log_dto(domain: DomainProfileLog) -> SharedProfileLog {
        SharedProfileLog {
            id: domain.id,
            user_id: domain.user_id,
            child_id: domain.child_id,
            changed_at: format_utc(domain.changed_at),
            summary: describe_changes(&domain.changes),
            changes: domain.changes,
            notes: domain.notes,
            created_at: format_utc(domain.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use shared::Gender;

    #[test]
    fn test_child_dto_formats_dates() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let child = DomainChild {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            name: "Leo".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2022, 1, 5),
            gender: Some(Gender::Male),
            height_cm: Some(92.0),
            weight_kg: None,
            head_circumference_cm: None,
            blood_type: None,
            allergies: vec!["peanuts".to_string()],
            medical_conditions: None,
            notes: None,
            created_at: created,
            updated_at: created,
        };

        let dto = ChildMapper::to_dto(child);
        assert_eq!(dto.birth_date.as_deref(), Some("2022-01-05"));
        assert_eq!(dto.created_at, "2024-03-01T09:30:00+00:00");
        assert_eq!(dto.allergies, vec!["peanuts".to_string()]);
    }
}
