use crate::backend::domain::models::datetime::{format_date, format_time, format_utc};
use crate::backend::domain::models::schedule::Schedule as DomainSchedule;
use crate::backend::domain::models::substance::Substance as DomainSubstance;
use crate::backend::io::rest::mappers::SubstanceMapper;
use shared::{Schedule as SharedSchedule, ScheduleWithSubstance};

/// Mapper to convert domain schedules into shared DTOs.
pub struct ScheduleMapper;

impl ScheduleMapper {
    pub fn to_dto(domain: DomainSchedule) -> SharedSchedule {
        SharedSchedule {
            id: domain.id,
            user_id: domain.user_id,
            substance_id: domain.substance_id,
            child_id: domain.child_id,
            time: format_time(domain.time),
            days_of_week: domain.days_of_week,
            start_date: format_date(domain.start_date),
            end_date: domain.end_date.map(format_date),
            reminder_minutes_before: domain.reminder_minutes_before,
            is_active: domain.is_active,
            created_at: format_utc(domain.created_at),
            updated_at: format_utc(domain.updated_at),
        }
    }

    pub fn to_with_substance_dto(schedule: DomainSchedule, substance: DomainSubstance) -> ScheduleWithSubstance {
        ScheduleWithSubstance {
            schedule: Self::to_dto(schedule),
            substance: SubstanceMapper::to_dto(substance),
        }
    }
}
