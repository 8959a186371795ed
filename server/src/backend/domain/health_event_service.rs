//! Health events (illnesses, vaccinations, appointments...) and the
//! substances linked to them.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;

use crate::backend::domain::aggregation::{active_illnesses, upcoming_appointments};
use crate::backend::domain::child_service::{optional_text, required_text, ChildService};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::datetime::{local_today, parse_date};
use crate::backend::domain::models::generate_id;
use crate::backend::domain::models::health_event::{
    HealthEvent, HealthEventSubstance, HealthEventWithSubstances,
};
use crate::backend::storage::{Connection, HealthEventStorage, SubstanceStorage};
use shared::{CreateHealthEventRequest, LinkSubstanceRequest, UpdateHealthEventRequest};

#[derive(Clone)]
pub struct HealthEventService<C: Connection> {
    health_event_repository: C::HealthEventRepository,
    substance_repository: C::SubstanceRepository,
    child_service: ChildService<C>,
}

impl<C: Connection> HealthEventService<C> {
    pub fn new(connection: Arc<C>, child_service: ChildService<C>) -> Self {
        Self {
            health_event_repository: connection.create_health_event_repository(),
            substance_repository: connection.create_substance_repository(),
            child_service,
        }
    }

    /// Newest first; empty without a child profile
    pub async fn list_health_events(&self, user_id: &str) -> Result<Vec<HealthEvent>> {
        match self.child_service.get_child(user_id).await? {
            Some(child) => self.health_event_repository.list_health_events(&child.id).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_health_event(&self, user_id: &str, event_id: &str) -> Result<HealthEvent> {
        self.health_event_repository
            .get_health_event(user_id, event_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Health event not found: {}", event_id)).into())
    }

    pub async fn get_with_substances(&self, user_id: &str, event_id: &str) -> Result<HealthEventWithSubstances> {
        let event = self.get_health_event(user_id, event_id).await?;
        let substances = self.health_event_repository.list_linked_substances(&event.id).await?;
        Ok(HealthEventWithSubstances { event, substances })
    }

    pub async fn create_health_event(
        &self,
        user_id: &str,
        request: CreateHealthEventRequest,
    ) -> Result<HealthEvent> {
        let title = required_text(&request.title, "Title")?;
        let start_date = parse_request_date(&request.start_date)?;
        let end_date = request.end_date.as_deref().map(parse_request_date).transpose()?;
        check_date_order(start_date, end_date)?;

        let child = self.child_service.require_child(user_id).await?;
        let now = Utc::now();
        let event = HealthEvent {
            id: generate_id(),
            user_id: user_id.to_string(),
            child_id: child.id,
            event_type: request.event_type,
            title,
            description: optional_text(request.description),
            start_date,
            end_date,
            severity: request.severity,
            metadata: request.metadata,
            created_at: now,
            updated_at: now,
        };
        self.health_event_repository.store_health_event(&event).await?;

        info!("Created {} event {} '{}'", event.event_type, event.id, event.title);
        Ok(event)
    }

    pub async fn update_health_event(
        &self,
        user_id: &str,
        event_id: &str,
        request: UpdateHealthEventRequest,
    ) -> Result<HealthEvent> {
        let mut event = self.get_health_event(user_id, event_id).await?;

        if let Some(event_type) = request.event_type {
            event.event_type = event_type;
        }
        if let Some(title) = request.title {
            event.title = required_text(&title, "Title")?;
        }
        if let Some(description) = request.description {
            event.description = optional_text(description);
        }
        if let Some(start_date) = request.start_date {
            event.start_date = parse_request_date(&start_date)?;
        }
        if let Some(end_date) = request.end_date {
            event.end_date = end_date.as_deref().map(parse_request_date).transpose()?;
        }
        if let Some(severity) = request.severity {
            event.severity = severity;
        }
        if let Some(metadata) = request.metadata {
            event.metadata = metadata;
        }
        check_date_order(event.start_date, event.end_date)?;

        event.updated_at = Utc::now();
        self.health_event_repository.update_health_event(&event).await?;

        info!("Updated health event {}", event.id);
        Ok(event)
    }

    pub async fn delete_health_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        if !self.health_event_repository.delete_health_event(user_id, event_id).await? {
            return Err(DomainError::not_found(format!("Health event not found: {}", event_id)).into());
        }
        info!("Deleted health event {}", event_id);
        Ok(())
    }

    pub async fn link_substance(
        &self,
        user_id: &str,
        event_id: &str,
        request: LinkSubstanceRequest,
    ) -> Result<HealthEventWithSubstances> {
        let event = self.get_health_event(user_id, event_id).await?;
        let substance = self
            .substance_repository
            .get_substance(user_id, &request.substance_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Substance not found: {}", request.substance_id)))?;
        if substance.child_id != event.child_id {
            return Err(DomainError::validation("Substance does not belong to this child").into());
        }

        let link = HealthEventSubstance {
            id: generate_id(),
            health_event_id: event.id.clone(),
            substance_id: substance.id.clone(),
            dosage_override: optional_text(request.dosage_override),
            notes: optional_text(request.notes),
            created_at: Utc::now(),
        };
        self.health_event_repository.link_substance(&link).await?;
        info!("Linked {} to health event {}", substance.name, event.id);

        let substances = self.health_event_repository.list_linked_substances(&event.id).await?;
        Ok(HealthEventWithSubstances { event, substances })
    }

    pub async fn unlink_substance(&self, user_id: &str, event_id: &str, substance_id: &str) -> Result<()> {
        let event = self.get_health_event(user_id, event_id).await?;
        if !self.health_event_repository.unlink_substance(&event.id, substance_id).await? {
            return Err(DomainError::not_found(format!(
                "Substance {} is not linked to health event {}",
                substance_id, event.id
            ))
            .into());
        }
        info!("Unlinked substance {} from health event {}", substance_id, event.id);
        Ok(())
    }

    pub async fn active_illnesses(&self, user_id: &str) -> Result<Vec<HealthEvent>> {
        Ok(active_illnesses(&self.list_health_events(user_id).await?))
    }

    pub async fn upcoming_appointments(&self, user_id: &str) -> Result<Vec<HealthEvent>> {
        self.upcoming_appointments_from(user_id, local_today()).await
    }

    pub async fn upcoming_appointments_from(&self, user_id: &str, today: NaiveDate) -> Result<Vec<HealthEvent>> {
        let events = self.list_health_events(user_id).await?;
        Ok(upcoming_appointments(&events, today))
    }
}

fn parse_request_date(value: &str) -> Result<NaiveDate> {
    parse_date(value).map_err(|e| DomainError::validation(e.to_string()).into())
}

fn check_date_order(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(DomainError::validation("End date must not be before start date").into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::repositories::test_utils::{seed_child, seed_substance, setup_test};
    use crate::backend::storage::DbConnection;
    use serde_json::json;
    use shared::{HealthEventType, Severity};

    async fn setup() -> (DbConnection, HealthEventService<DbConnection>) {
        let db = setup_test().await;
        let connection = Arc::new(db.clone());
        let service = HealthEventService::new(connection.clone(), ChildService::new(connection));
        (db, service)
    }

    fn request(event_type: HealthEventType, title: &str, start: &str) -> CreateHealthEventRequest {
        CreateHealthEventRequest {
            event_type,
            title: title.to_string(),
            description: None,
            start_date: start.to_string(),
            end_date: None,
            severity: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let (db, service) = setup().await;
        seed_child(&db, "user-1").await;

        let mut flu = request(HealthEventType::Illness, "Flu", "2024-02-10");
        flu.severity = Some(Severity::Medium);
        flu.metadata = Some(json!({"temperature": 38.5}));
        service.create_health_event("user-1", flu).await.unwrap();
        service
            .create_health_event("user-1", request(HealthEventType::Vaccination, "MMR", "2024-03-01"))
            .await
            .unwrap();

        let events = service.list_health_events("user-1").await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "MMR");
        assert_eq!(events[1].metadata, Some(json!({"temperature": 38.5})));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (db, service) = setup().await;
        seed_child(&db, "user-1").await;

        let blank = service
            .create_health_event("user-1", request(HealthEventType::Other, "  ", "2024-02-10"))
            .await
            .unwrap_err();
        assert!(matches!(blank.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));

        let mut inverted = request(HealthEventType::Illness, "Cold", "2024-02-10");
        inverted.end_date = Some("2024-02-01".to_string());
        let err = service.create_health_event("user-1", inverted).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_illness_ends_and_leaves_active_list() {
        let (db, service) = setup().await;
        seed_child(&db, "user-1").await;
        let flu = service
            .create_health_event("user-1", request(HealthEventType::Illness, "Flu", "2024-02-10"))
            .await
            .unwrap();
        assert_eq!(service.active_illnesses("user-1").await.unwrap().len(), 1);

        let updated = service
            .update_health_event(
                "user-1",
                &flu.id,
                UpdateHealthEventRequest {
                    end_date: Some(Some("2024-02-14".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.end_date, NaiveDate::from_ymd_opt(2024, 2, 14));
        assert!(service.active_illnesses("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upcoming_appointments() {
        let (db, service) = setup().await;
        seed_child(&db, "user-1").await;
        for start in ["2024-03-01", "2024-03-10", "2024-04-02"] {
            service
                .create_health_event("user-1", request(HealthEventType::Appointment, "Checkup", start))
                .await
                .unwrap();
        }

        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let upcoming = service.upcoming_appointments_from("user-1", today).await.unwrap();
        assert_eq!(upcoming.len(), 2);
    }

    #[tokio::test]
    async fn test_link_and_unlink_substance() {
        let (db, service) = setup().await;
        let child = seed_child(&db, "user-1").await;
        let syrup = seed_substance(&db, &child, "Cough syrup").await;
        let flu = service
            .create_health_event("user-1", request(HealthEventType::Illness, "Flu", "2024-02-10"))
            .await
            .unwrap();

        let linked = service
            .link_substance(
                "user-1",
                &flu.id,
                LinkSubstanceRequest {
                    substance_id: syrup.id.clone(),
                    dosage_override: Some("10 ml".to_string()),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(linked.substances.len(), 1);
        assert_eq!(linked.substances[0].1.name, "Cough syrup");
        assert_eq!(linked.substances[0].0.dosage_override.as_deref(), Some("10 ml"));

        service.unlink_substance("user-1", &flu.id, &syrup.id).await.unwrap();
        let detail = service.get_with_substances("user-1", &flu.id).await.unwrap();
        assert!(detail.substances.is_empty());

        let again = service.unlink_substance("user-1", &flu.id, &syrup.id).await.unwrap_err();
        assert!(matches!(again.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
    }
}
