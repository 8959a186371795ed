use crate::backend::domain::aggregation::SubstanceGroups;
use crate::backend::domain::models::datetime::format_utc;
use crate::backend::domain::models::schedule::Schedule as DomainSchedule;
use crate::backend::domain::models::substance::Substance as DomainSubstance;
use crate::backend::io::rest::mappers::ScheduleMapper;
use shared::{Substance as SharedSubstance, SubstanceWithSchedules, SubstancesByType};

/// Mapper to convert domain substances into shared DTOs.
pub struct SubstanceMapper;

impl SubstanceMapper {
    pub fn to_dto(domain: DomainSubstance) -> SharedSubstance {
        SharedSubstance {
            id: domain.id,
            user_id: domain.user_id,
            child_id: domain.child_id,
            name: domain.name,
            substance_type: domain.substance_type,
            dosage: domain.dosage,
            unit: domain.unit,
            description: domain.description,
            instructions: domain.instructions,
            is_active: domain.is_active,
            color: domain.color,
            created_at: format_utc(domain.created_at),
            updated_at: format_utc(domain.updated_at),
        }
    }

    pub fn to_list_dto(domain: Vec<DomainSubstance>) -> Vec<SharedSubstance> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_with_schedules_dto(substance: DomainSubstance, schedules: Vec<DomainSchedule>) -> SubstanceWithSchedules {
        SubstanceWithSchedules {
            substance: Self::to_dto(substance),
            schedules: schedules.into_iter().map(ScheduleMapper::to_dto).collect(),
        }
    }

    pub fn to_by_type_dto(groups: SubstanceGroups) -> SubstancesByType {
        SubstancesByType {
            medicine: Self::to_list_dto(groups.medicine),
            vitamin: Self::to_list_dto(groups.vitamin),
            supplement: Self::to_list_dto(groups.supplement),
        }
    }
}
