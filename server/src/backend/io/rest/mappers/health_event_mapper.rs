use crate::backend::domain::models::datetime::{format_date, format_utc};
use crate::backend::domain::models::health_event::{
    HealthEvent as DomainHealthEvent, HealthEventSubstance as DomainHealthEventSubstance,
    HealthEventWithSubstances as DomainHealthEventWithSubstances,
};
use crate::backend::domain::models::substance::Substance as DomainSubstance;
use crate::backend::io::rest::mappers::SubstanceMapper;
use shared::{
    HealthEvent as SharedHealthEvent, HealthEventSubstance as SharedHealthEventSubstance,
    HealthEventWithSubstances, LinkedSubstance,
};

/// Mapper to convert domain health events into shared DTOs.
pub struct HealthEventMapper;

impl HealthEventMapper {
    pub fn to_dto(domain: DomainHealthEvent) -> SharedHealthEvent {
        SharedHealthEvent {
            id: domain.id,
            user_id: domain.user_id,
            child_id: domain.child_id,
            event_type: domain.event_type,
            title: domain.title,
            description: domain.description,
            start_date: format_date(domain.start_date),
            end_date: domain.end_date.map(format_date),
            severity: domain.severity,
            metadata: domain.metadata,
            created_at: format_utc(domain.created_at),
            updated_at: format_utc(domain.updated_at),
        }
    }

    pub fn to_list_dto(domain: Vec<DomainHealthEvent>) -> Vec<SharedHealthEvent> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    fn to_linked_substance_dto(link: DomainHealthEventSubstance, substance: DomainSubstance) -> LinkedSubstance {
        LinkedSubstance {
            link: SharedHealthEventSubstance {
                id: link.id,
                health_event_id: link.health_event_id,
                substance_id: link.substance_id,
                dosage_override: link.dosage_override,
                notes: link.notes,
                created_at: format_utc(link.created_at),
            },
            substance: SubstanceMapper::to_dto(substance),
        }
    }

    pub fn to_with_substances_dto(domain: DomainHealthEventWithSubstances) -> HealthEventWithSubstances {
        HealthEventWithSubstances {
            event: Self::to_dto(domain.event),
            health_event_substances: domain
                .substances
                .into_iter()
                .map(|(link, substance)| Self::to_linked_substance_dto(link, substance))
                .collect(),
        }
    }
}
