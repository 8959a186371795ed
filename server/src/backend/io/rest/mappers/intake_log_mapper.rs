use crate::backend::domain::models::datetime::{format_local_timestamp, format_utc};
use crate::backend::domain::models::intake_log::{
    IntakeLog as DomainIntakeLog, IntakeLogWithSubstance as DomainIntakeLogWithSubstance,
};
use crate::backend::io::rest::mappers::SubstanceMapper;
use shared::{GenerateLogsResponse, IntakeLog as SharedIntakeLog, IntakeLogWithSubstance};

/// Mapper to convert domain intake logs into shared DTOs.
pub struct IntakeLogMapper;

impl IntakeLogMapper {
    pub fn to_dto(domain: DomainIntakeLog) -> SharedIntakeLog {
        SharedIntakeLog {
            id: domain.id,
            user_id: domain.user_id,
            child_id: domain.child_id,
            substance_id: domain.substance_id,
            schedule_id: domain.schedule_id,
            scheduled_time: format_local_timestamp(domain.scheduled_time),
            actual_time: domain.actual_time.map(format_local_timestamp),
            status: domain.status,
            notes: domain.notes,
            created_at: format_utc(domain.created_at),
            updated_at: format_utc(domain.updated_at),
        }
    }

    pub fn to_with_substance_dto(domain: DomainIntakeLogWithSubstance) -> IntakeLogWithSubstance {
        IntakeLogWithSubstance {
            log: Self::to_dto(domain.log),
            substance: SubstanceMapper::to_dto(domain.substance),
        }
    }

    pub fn to_list_dto(domain: Vec<DomainIntakeLogWithSubstance>) -> Vec<IntakeLogWithSubstance> {
        domain.into_iter().map(Self::to_with_substance_dto).collect()
    }

    pub fn to_generate_response_dto(created: Vec<DomainIntakeLogWithSubstance>) -> GenerateLogsResponse {
        GenerateLogsResponse {
            created: created.len(),
            logs: Self::to_list_dto(created),
        }
    }
}
