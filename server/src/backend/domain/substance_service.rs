//! Substance (medicine, vitamin, supplement) management.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::backend::domain::aggregation::{substances_by_type, SubstanceGroups};
use crate::backend::domain::child_service::{optional_text, required_text, ChildService};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::generate_id;
use crate::backend::domain::models::schedule::Schedule;
use crate::backend::domain::models::substance::Substance;
use crate::backend::storage::{Connection, ScheduleStorage, SubstanceStorage};
use shared::{CreateSubstanceRequest, UpdateSubstanceRequest};

#[derive(Clone)]
pub struct SubstanceService<C: Connection> {
    substance_repository: C::SubstanceRepository,
    schedule_repository: C::ScheduleRepository,
    child_service: ChildService<C>,
}

impl<C: Connection> SubstanceService<C> {
    pub fn new(connection: Arc<C>, child_service: ChildService<C>) -> Self {
        Self {
            substance_repository: connection.create_substance_repository(),
            schedule_repository: connection.create_schedule_repository(),
            child_service,
        }
    }

    /// The child's substances by name; empty without a child profile
    pub async fn list_substances(&self, user_id: &str, active_only: bool) -> Result<Vec<Substance>> {
        match self.child_service.get_child(user_id).await? {
            Some(child) => self.substance_repository.list_substances(&child.id, active_only).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn list_substances_with_schedules(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Substance, Vec<Schedule>)>> {
        let substances = self.list_substances(user_id, false).await?;
        let mut result = Vec::with_capacity(substances.len());
        for substance in substances {
            let schedules = self
                .schedule_repository
                .list_schedules_for_substance(&substance.id)
                .await?;
            result.push((substance, schedules));
        }
        Ok(result)
    }

    pub async fn substances_by_type(&self, user_id: &str) -> Result<SubstanceGroups> {
        Ok(substances_by_type(self.list_substances(user_id, false).await?))
    }

    pub async fn get_substance(&self, user_id: &str, substance_id: &str) -> Result<Substance> {
        self.substance_repository
            .get_substance(user_id, substance_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Substance not found: {}", substance_id)).into())
    }

    pub async fn create_substance(&self, user_id: &str, request: CreateSubstanceRequest) -> Result<Substance> {
        let name = required_text(&request.name, "Name")?;
        let child = self.child_service.require_child(user_id).await?;

        let now = Utc::now();
        let substance = Substance {
            id: generate_id(),
            user_id: user_id.to_string(),
            child_id: child.id,
            name,
            substance_type: request.substance_type,
            dosage: optional_text(request.dosage),
            unit: optional_text(request.unit),
            description: optional_text(request.description),
            instructions: optional_text(request.instructions),
            is_active: request.is_active.unwrap_or(true),
            color: optional_text(request.color),
            created_at: now,
            updated_at: now,
        };
        self.substance_repository.store_substance(&substance).await?;

        info!("Created {} {} ({})", substance.substance_type, substance.name, substance.id);
        Ok(substance)
    }

    pub async fn update_substance(
        &self,
        user_id: &str,
        substance_id: &str,
        request: UpdateSubstanceRequest,
    ) -> Result<Substance> {
        let mut substance = self.get_substance(user_id, substance_id).await?;

        if let Some(name) = request.name {
            substance.name = required_text(&name, "Name")?;
        }
        if let Some(substance_type) = request.substance_type {
            substance.substance_type = substance_type;
        }
        if let Some(dosage) = request.dosage {
            substance.dosage = optional_text(dosage);
        }
        if let Some(unit) = request.unit {
            substance.unit = optional_text(unit);
        }
        if let Some(description) = request.description {
            substance.description = optional_text(description);
        }
        if let Some(instructions) = request.instructions {
            substance.instructions = optional_text(instructions);
        }
        if let Some(is_active) = request.is_active {
            substance.is_active = is_active;
        }
        if let Some(color) = request.color {
            substance.color = optional_text(color);
        }

        substance.updated_at = Utc::now();
        self.substance_repository.update_substance(&substance).await?;

        info!("Updated substance {}", substance.id);
        Ok(substance)
    }

    /// Flip the active flag
    pub async fn toggle_substance(&self, user_id: &str, substance_id: &str) -> Result<Substance> {
        let mut substance = self.get_substance(user_id, substance_id).await?;
        substance.is_active = !substance.is_active;
        substance.updated_at = Utc::now();
        self.substance_repository.update_substance(&substance).await?;

        info!("Substance {} is now {}", substance.id, if substance.is_active { "active" } else { "inactive" });
        Ok(substance)
    }

    /// Hard delete; schedules, logs and event links of the substance go with it
    pub async fn delete_substance(&self, user_id: &str, substance_id: &str) -> Result<()> {
        if !self.substance_repository.delete_substance(user_id, substance_id).await? {
            return Err(DomainError::not_found(format!("Substance not found: {}", substance_id)).into());
        }
        info!("Deleted substance {}", substance_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::DbConnection;
    use shared::{CreateChildRequest, SubstanceType};

    async fn create_test_service(with_child: bool) -> SubstanceService<DbConnection> {
        let connection = Arc::new(DbConnection::in_memory().await.unwrap());
        let child_service = ChildService::new(connection.clone());
        if with_child {
            child_service
                .create_child(
                    "user-1",
                    CreateChildRequest { name: "Leo".to_string(), birth_date: None, notes: None },
                )
                .await
                .unwrap();
        }
        SubstanceService::new(connection, child_service)
    }

    fn request(name: &str, substance_type: SubstanceType) -> CreateSubstanceRequest {
        CreateSubstanceRequest {
            name: name.to_string(),
            substance_type,
            dosage: Some("5".to_string()),
            unit: Some("ml".to_string()),
            description: None,
            instructions: Some("".to_string()),
            is_active: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_create_requires_child_and_name() {
        let service = create_test_service(false).await;
        let err = service
            .create_substance("user-1", request("Iron", SubstanceType::Supplement))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
        assert!(service.list_substances("user-1", false).await.unwrap().is_empty());

        let service = create_test_service(true).await;
        let err = service
            .create_substance("user-1", request(" ", SubstanceType::Supplement))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_defaults_and_grouping() {
        let service = create_test_service(true).await;
        let iron = service
            .create_substance("user-1", request("Iron", SubstanceType::Supplement))
            .await
            .unwrap();
        assert!(iron.is_active);
        assert_eq!(iron.instructions, None);
        service
            .create_substance("user-1", request("Amoxicillin", SubstanceType::Medicine))
            .await
            .unwrap();

        let groups = service.substances_by_type("user-1").await.unwrap();
        assert_eq!(groups.medicine.len(), 1);
        assert_eq!(groups.supplement.len(), 1);
        assert!(groups.vitamin.is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_and_toggle() {
        let service = create_test_service(true).await;
        let iron = service
            .create_substance("user-1", request("Iron", SubstanceType::Supplement))
            .await
            .unwrap();

        let updated = service
            .update_substance(
                "user-1",
                &iron.id,
                UpdateSubstanceRequest {
                    dosage: Some(None),
                    color: Some(Some("#ff0000".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.dosage, None);
        assert_eq!(updated.unit.as_deref(), Some("ml"));
        assert_eq!(updated.color.as_deref(), Some("#ff0000"));

        let toggled = service.toggle_substance("user-1", &iron.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(service.list_substances("user-1", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_substance_is_not_found() {
        let service = create_test_service(true).await;
        let iron = service
            .create_substance("user-1", request("Iron", SubstanceType::Supplement))
            .await
            .unwrap();

        let err = service.toggle_substance("user-2", &iron.id).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
        let err = service.delete_substance("user-2", &iron.id).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
    }
}
