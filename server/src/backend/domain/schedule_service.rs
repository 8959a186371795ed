//! Dosing schedule management.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::datetime::{local_today, parse_date, parse_time};
use crate::backend::domain::models::generate_id;
use crate::backend::domain::models::schedule::{is_valid_day_of_week, Schedule, DEFAULT_REMINDER_MINUTES};
use crate::backend::domain::models::substance::Substance;
use crate::backend::storage::{Connection, ScheduleStorage, SubstanceStorage};
use shared::{CreateScheduleRequest, UpdateScheduleRequest};

#[derive(Clone)]
pub struct ScheduleService<C: Connection> {
    schedule_repository: C::ScheduleRepository,
    substance_repository: C::SubstanceRepository,
    child_service: ChildService<C>,
}

impl<C: Connection> ScheduleService<C> {
    pub fn new(connection: Arc<C>, child_service: ChildService<C>) -> Self {
        Self {
            schedule_repository: connection.create_schedule_repository(),
            substance_repository: connection.create_substance_repository(),
            child_service,
        }
    }

    /// The child's schedules by time of day; empty without a child profile
    pub async fn list_schedules(&self, user_id: &str, active_only: bool) -> Result<Vec<Schedule>> {
        match self.child_service.get_child(user_id).await? {
            Some(child) => self.schedule_repository.list_schedules(&child.id, active_only).await,
            None => Ok(Vec::new()),
        }
    }

    /// Schedules paired with their substance
    pub async fn list_schedules_with_substance(
        &self,
        user_id: &str,
        active_only: bool,
    ) -> Result<Vec<(Schedule, Substance)>> {
        let Some(child) = self.child_service.get_child(user_id).await? else {
            return Ok(Vec::new());
        };
        let substances: HashMap<String, Substance> = self
            .substance_repository
            .list_substances(&child.id, false)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let schedules = self.schedule_repository.list_schedules(&child.id, active_only).await?;
        Ok(schedules
            .into_iter()
            .filter_map(|schedule| {
                let substance = substances.get(&schedule.substance_id)?.clone();
                Some((schedule, substance))
            })
            .collect())
    }

    pub async fn list_schedules_for_substance(&self, user_id: &str, substance_id: &str) -> Result<Vec<Schedule>> {
        let substance = self.require_substance(user_id, substance_id).await?;
        self.schedule_repository.list_schedules_for_substance(&substance.id).await
    }

    pub async fn get_schedule(&self, user_id: &str, schedule_id: &str) -> Result<Schedule> {
        self.schedule_repository
            .get_schedule(user_id, schedule_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Schedule not found: {}", schedule_id)).into())
    }

    pub async fn create_schedule(&self, user_id: &str, request: CreateScheduleRequest) -> Result<Schedule> {
        let time = parse_time(&request.time).map_err(|e| DomainError::validation(e.to_string()))?;
        let start_date = match request.start_date.as_deref() {
            Some(date) => parse_request_date(date)?,
            None => local_today(),
        };
        let end_date = request.end_date.as_deref().map(parse_request_date).transpose()?;

        let child = self.child_service.require_child(user_id).await?;
        let substance = self.require_substance(user_id, &request.substance_id).await?;
        if substance.child_id != child.id {
            return Err(DomainError::validation("Substance does not belong to this child").into());
        }

        let now = Utc::now();
        let schedule = Schedule {
            id: generate_id(),
            user_id: user_id.to_string(),
            substance_id: substance.id,
            child_id: child.id,
            time,
            days_of_week: normalize_days(request.days_of_week),
            start_date,
            end_date,
            reminder_minutes_before: request.reminder_minutes_before.unwrap_or(DEFAULT_REMINDER_MINUTES),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        validate_schedule(&schedule)?;
        self.schedule_repository.store_schedule(&schedule).await?;

        info!(
            "Created schedule {} for substance {} at {}",
            schedule.id, schedule.substance_id, schedule.time
        );
        Ok(schedule)
    }

    pub async fn update_schedule(
        &self,
        user_id: &str,
        schedule_id: &str,
        request: UpdateScheduleRequest,
    ) -> Result<Schedule> {
        let mut schedule = self.get_schedule(user_id, schedule_id).await?;

        if let Some(substance_id) = request.substance_id {
            let substance = self.require_substance(user_id, &substance_id).await?;
            if substance.child_id != schedule.child_id {
                return Err(DomainError::validation("Substance does not belong to this child").into());
            }
            schedule.substance_id = substance.id;
        }
        if let Some(time) = request.time {
            schedule.time = parse_time(&time).map_err(|e| DomainError::validation(e.to_string()))?;
        }
        if let Some(days) = request.days_of_week {
            schedule.days_of_week = normalize_days(days);
        }
        if let Some(start_date) = request.start_date {
            schedule.start_date = parse_request_date(&start_date)?;
        }
        if let Some(end_date) = request.end_date {
            schedule.end_date = end_date.as_deref().map(parse_request_date).transpose()?;
        }
        if let Some(minutes) = request.reminder_minutes_before {
            schedule.reminder_minutes_before = minutes;
        }
        if let Some(is_active) = request.is_active {
            schedule.is_active = is_active;
        }
        validate_schedule(&schedule)?;

        schedule.updated_at = Utc::now();
        self.schedule_repository.update_schedule(&schedule).await?;

        info!("Updated schedule {}", schedule.id);
        Ok(schedule)
    }

    /// Flip the active flag. Logs already generated stay in place.
    pub async fn toggle_schedule(&self, user_id: &str, schedule_id: &str) -> Result<Schedule> {
        let mut schedule = self.get_schedule(user_id, schedule_id).await?;
        schedule.is_active = !schedule.is_active;
        schedule.updated_at = Utc::now();
        self.schedule_repository.update_schedule(&schedule).await?;

        info!("Schedule {} is now {}", schedule.id, if schedule.is_active { "active" } else { "inactive" });
        Ok(schedule)
    }

    /// Generated logs keep existing, detached from the schedule
    pub async fn delete_schedule(&self, user_id: &str, schedule_id: &str) -> Result<()> {
        if !self.schedule_repository.delete_schedule(user_id, schedule_id).await? {
            return Err(DomainError::not_found(format!("Schedule not found: {}", schedule_id)).into());
        }
        info!("Deleted schedule {}", schedule_id);
        Ok(())
    }

    async fn require_substance(&self, user_id: &str, substance_id: &str) -> Result<Substance> {
        self.substance_repository
            .get_substance(user_id, substance_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Substance not found: {}", substance_id)).into())
    }
}

fn parse_request_date(value: &str) -> Result<NaiveDate> {
    parse_date(value).map_err(|e| DomainError::validation(e.to_string()).into())
}

fn normalize_days(mut days: Vec<u8>) -> Vec<u8> {
    days.sort_unstable();
    days.dedup();
    days
}

pub fn validate_schedule(schedule: &Schedule) -> Result<()> {
    if schedule.days_of_week.is_empty() {
        return Err(DomainError::validation("At least one day of the week is required").into());
    }
    if let Some(day) = schedule.days_of_week.iter().find(|d| !is_valid_day_of_week(**d)) {
        return Err(DomainError::validation(format!("Invalid day of week: {} (expected 0-6)", day)).into());
    }
    if let Some(end_date) = schedule.end_date {
        if end_date < schedule.start_date {
            return Err(DomainError::validation("End date must not be before start date").into());
        }
    }
    Ok(())
}
