//! Child profile management and the profile change audit log.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::errors::{DomainError, NO_CHILD_PROFILE};
use crate::backend::domain::models::child::{Child, ProfileLog};
use crate::backend::domain::models::datetime::parse_date;
use crate::backend::domain::models::generate_id;
use crate::backend::domain::profile_tracker::{describe_changes, diff_children};
use crate::backend::storage::{ChildStorage, Connection, ProfileLogStorage};
use shared::{CreateChildRequest, ProfileChanges, UpdateChildRequest};

pub const DEFAULT_PROFILE_LOG_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct ChildService<C: Connection> {
    child_repository: C::ChildRepository,
    profile_log_repository: C::ProfileLogRepository,
}

impl<C: Connection> ChildService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            child_repository: connection.create_child_repository(),
            profile_log_repository: connection.create_profile_log_repository(),
        }
    }

    /// The user's child, if a profile exists
    pub async fn get_child(&self, user_id: &str) -> Result<Option<Child>> {
        self.child_repository.get_child_for_user(user_id).await
    }

    /// The user's child, or a not-found error
    pub async fn require_child(&self, user_id: &str) -> Result<Child> {
        match self.child_repository.get_child_for_user(user_id).await? {
            Some(child) => Ok(child),
            None => Err(DomainError::not_found(NO_CHILD_PROFILE).into()),
        }
    }

    pub async fn create_child(&self, user_id: &str, request: CreateChildRequest) -> Result<Child> {
        info!("Creating child profile for user {}", user_id);

        let name = required_text(&request.name, "Name")?;
        let birth_date = optional_text(request.birth_date)
            .map(|d| parse_date(&d).map_err(|e| DomainError::validation(e.to_string())))
            .transpose()?;

        if self.child_repository.get_child_for_user(user_id).await?.is_some() {
            return Err(DomainError::conflict("A child profile already exists for this user").into());
        }

        let now = Utc::now();
        let child = Child {
            id: generate_id(),
            user_id: user_id.to_string(),
            name,
            birth_date,
            gender: None,
            height_cm: None,
            weight_kg: None,
            head_circumference_cm: None,
            blood_type: None,
            allergies: Vec::new(),
            medical_conditions: None,
            notes: optional_text(request.notes),
            created_at: now,
            updated_at: now,
        };
        self.child_repository.store_child(&child).await?;

        info!("Created child {} ({})", child.name, child.id);
        Ok(child)
    }

    /// Replace the tracked profile fields and record what changed.
    ///
    /// A request that changes nothing writes nothing and returns an empty
    /// change set. The audit entry is best effort: failing to store it never
    /// fails the update.
    pub async fn update_child(
        &self,
        user_id: &str,
        request: UpdateChildRequest,
    ) -> Result<(Child, ProfileChanges)> {
        let current = self.require_child(user_id).await?;
        let log_notes = optional_text(request.log_notes.clone());
        let mut updated = apply_profile_update(&current, request)?;

        let changes = diff_children(&current, &updated)?;
        if changes.is_empty() {
            info!("Profile update for child {} changed nothing", current.id);
            return Ok((current, changes));
        }

        let now = Utc::now();
        updated.updated_at = now;
        self.child_repository.update_child(&updated).await?;
        info!("Updated child {}: {}", updated.id, describe_changes(&changes).join("; "));

        let log = ProfileLog {
            id: generate_id(),
            user_id: user_id.to_string(),
            child_id: updated.id.clone(),
            changed_at: now,
            changes: changes.clone(),
            notes: log_notes,
            created_at: now,
        };
        if let Err(e) = self.profile_log_repository.store_profile_log(&log).await {
            warn!("Failed to record profile change log for child {}: {}", updated.id, e);
        }

        Ok((updated, changes))
    }

    /// Most recent first; empty when the user has no child
    pub async fn list_profile_logs(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<ProfileLog>> {
        let Some(child) = self.get_child(user_id).await? else {
            return Ok(Vec::new());
        };
        let limit = limit.unwrap_or(DEFAULT_PROFILE_LOG_LIMIT);
        self.profile_log_repository.list_profile_logs(&child.id, limit).await
    }

    pub async fn delete_profile_log(&self, user_id: &str, log_id: &str) -> Result<()> {
        if !self.profile_log_repository.delete_profile_log(user_id, log_id).await? {
            return Err(DomainError::not_found(format!("Profile log not found: {}", log_id)).into());
        }
        info!("Deleted profile log {}", log_id);
        Ok(())
    }
}

/// The profile `request` describes, on top of `current`'s identity
fn apply_profile_update(current: &Child, request: UpdateChildRequest) -> Result<Child> {
    let name = match request.name {
        Some(name) => required_text(&name, "Name")?,
        None => return Err(DomainError::validation("Name is required").into()),
    };
    let birth_date = optional_text(request.birth_date)
        .map(|d| parse_date(&d).map_err(|e| DomainError::validation(e.to_string())))
        .transpose()?;

    for (label, value) in [
        ("Height", request.height_cm),
        ("Weight", request.weight_kg),
        ("Head circumference", request.head_circumference_cm),
    ] {
        if matches!(value, Some(v) if !v.is_finite() || v <= 0.0) {
            return Err(DomainError::validation(format!("{} must be a positive number", label)).into());
        }
    }

    let allergies = request
        .allergies
        .unwrap_or_default()
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    Ok(Child {
        name,
        birth_date,
        gender: request.gender,
        height_cm: request.height_cm,
        weight_kg: request.weight_kg,
        head_circumference_cm: request.head_circumference_cm,
        blood_type: optional_text(request.blood_type),
        allergies,
        medical_conditions: optional_text(request.medical_conditions),
        notes: optional_text(request.notes),
        ..current.clone()
    })
}

/// Trimmed text, rejecting blank input
pub(crate) fn required_text(value: &str, label: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} is required", label)).into());
    }
    Ok(trimmed.to_string())
}

/// Trimmed text, with blank input meaning no value
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::DbConnection;
    use chrono::NaiveDate;
    use shared::Gender;

    async fn create_test_service() -> (ChildService<DbConnection>, DbConnection) {
        let db = DbConnection::in_memory().await.unwrap();
        (ChildService::new(Arc::new(db.clone())), db)
    }

    fn create_request(name: &str) -> CreateChildRequest {
        CreateChildRequest {
            name: name.to_string(),
            birth_date: Some("2022-01-15".to_string()),
            notes: None,
        }
    }

    fn full_update(child: &Child) -> UpdateChildRequest {
        UpdateChildRequest {
            name: Some(child.name.clone()),
            birth_date: child.birth_date.map(|d| d.to_string()),
            gender: child.gender,
            height_cm: child.height_cm,
            weight_kg: child.weight_kg,
            head_circumference_cm: child.head_circumference_cm,
            blood_type: child.blood_type.clone(),
            allergies: Some(child.allergies.clone()),
            medical_conditions: child.medical_conditions.clone(),
            notes: child.notes.clone(),
            log_notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_child_once_per_user() {
        let (service, _db) = create_test_service().await;

        assert!(service.get_child("user-1").await.unwrap().is_none());

        let child = service.create_child("user-1", create_request("  Leo ")).await.unwrap();
        assert_eq!(child.name, "Leo");
        assert_eq!(child.birth_date, NaiveDate::from_ymd_opt(2022, 1, 15));

        let err = service.create_child("user-1", create_request("Mia")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_child_validates_input() {
        let (service, _db) = create_test_service().await;

        let err = service.create_child("user-1", create_request("   ")).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));

        let mut request = create_request("Leo");
        request.birth_date = Some("15/01/2022".to_string());
        let err = service.create_child("user-1", request).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_records_changes_in_audit_log() {
        let (service, _db) = create_test_service().await;
        let child = service.create_child("user-1", create_request("Leo")).await.unwrap();

        let mut request = full_update(&child);
        request.weight_kg = Some(13.4);
        request.gender = Some(Gender::Male);
        request.allergies = Some(vec!["pollen".to_string()]);
        request.log_notes = Some("Checkup".to_string());

        let (updated, changes) = service.update_child("user-1", request).await.unwrap();
        assert_eq!(updated.weight_kg, Some(13.4));
        let fields: Vec<_> = changes.keys().cloned().collect();
        assert_eq!(fields, vec!["allergies", "gender", "weight_kg"]);

        let logs = service.list_profile_logs("user-1", None).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].changes, changes);
        assert_eq!(logs[0].notes.as_deref(), Some("Checkup"));
    }

    #[tokio::test]
    async fn test_noop_update_writes_no_log() {
        let (service, _db) = create_test_service().await;
        let child = service.create_child("user-1", create_request("Leo")).await.unwrap();

        // Same values with a blank string standing in for "no value"
        let mut request = full_update(&child);
        request.blood_type = Some("".to_string());
        let (unchanged, changes) = service.update_child("user-1", request).await.unwrap();
        assert!(changes.is_empty());
        assert_eq!(unchanged.updated_at, child.updated_at);

        assert!(service.list_profile_logs("user-1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audit_log_failure_does_not_fail_update() {
        let (service, db) = create_test_service().await;
        let child = service.create_child("user-1", create_request("Leo")).await.unwrap();

        sqlx::query("DROP TABLE child_profile_logs")
            .execute(db.pool())
            .await
            .unwrap();

        let mut request = full_update(&child);
        request.name = Some("Leonard".to_string());
        let (updated, changes) = service.update_child("user-1", request).await.unwrap();
        assert_eq!(updated.name, "Leonard");
        assert_eq!(changes.len(), 1);

        let stored = service.get_child("user-1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Leonard");
    }

    #[tokio::test]
    async fn test_update_without_child_is_not_found() {
        let (service, _db) = create_test_service().await;
        let err = service
            .update_child("user-1", UpdateChildRequest { name: Some("Leo".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_profile_log() {
        let (service, _db) = create_test_service().await;
        let child = service.create_child("user-1", create_request("Leo")).await.unwrap();
        let mut request = full_update(&child);
        request.notes = Some("Teething".to_string());
        service.update_child("user-1", request).await.unwrap();

        let logs = service.list_profile_logs("user-1", Some(5)).await.unwrap();
        service.delete_profile_log("user-1", &logs[0].id).await.unwrap();

        let err = service.delete_profile_log("user-1", &logs[0].id).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_))));
    }
}
