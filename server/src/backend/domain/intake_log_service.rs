//! # Intake Log Service
//!
//! Materializes scheduled doses into intake logs (the reconciler) and applies
//! status transitions to single logs.

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::aggregation;
use crate::backend::domain::child_service::{optional_text, ChildService};
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::intake_status::{apply_update, manual_actual_time, mark_skipped, mark_taken};
use crate::backend::domain::models::datetime::{local_now, local_today, parse_local_timestamp};
use crate::backend::domain::models::generate_id;
use crate::backend::domain::models::intake_log::{IntakeLog, IntakeLogWithSubstance};
use crate::backend::domain::models::substance::Substance;
use crate::backend::domain::occurrence::occurrences_for;
use crate::backend::storage::{Connection, IntakeLogStorage, ScheduleStorage, SubstanceStorage};
use shared::{CreateManualLogRequest, IntakeStatus, TodayProgress, UpdateIntakeLogRequest};

#[derive(Clone)]
pub struct IntakeLogService<C: Connection> {
    intake_log_repository: C::IntakeLogRepository,
    schedule_repository: C::ScheduleRepository,
    substance_repository: C::SubstanceRepository,
    child_service: ChildService<C>,
}

/// `[start of date, start of next day)`
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1))
}

impl<C: Connection> IntakeLogService<C> {
    pub fn new(connection: Arc<C>, child_service: ChildService<C>) -> Self {
        Self {
            intake_log_repository: connection.create_intake_log_repository(),
            schedule_repository: connection.create_schedule_repository(),
            substance_repository: connection.create_substance_repository(),
            child_service,
        }
    }

    /// Create the pending logs that `date` is owed and return only the new ones.
    ///
    /// A schedule already represented on that day, by any status, gets no
    /// second log. Running twice for the same date creates nothing the second
    /// time.
    pub async fn reconcile(&self, user_id: &str, date: NaiveDate) -> Result<Vec<IntakeLogWithSubstance>> {
        let child = self.child_service.require_child(user_id).await?;

        let schedules = self.schedule_repository.list_schedules(&child.id, true).await?;
        let occurrences = occurrences_for(&schedules, date);
        if occurrences.is_empty() {
            info!("No schedules due on {} for child {}", date, child.id);
            return Ok(Vec::new());
        }

        let (start, end) = day_bounds(date);
        let existing = self.intake_log_repository.list_intake_logs(&child.id, start, end).await?;
        let represented: HashSet<String> = existing
            .iter()
            .filter_map(|entry| entry.log.schedule_id.clone())
            .collect();

        let now = Utc::now();
        let new_logs: Vec<IntakeLog> = occurrences
            .iter()
            .filter(|occurrence| !represented.contains(&occurrence.schedule.id))
            .map(|occurrence| IntakeLog {
                id: generate_id(),
                user_id: user_id.to_string(),
                child_id: child.id.clone(),
                substance_id: occurrence.schedule.substance_id.clone(),
                schedule_id: Some(occurrence.schedule.id.clone()),
                scheduled_time: occurrence.instant,
                actual_time: None,
                status: IntakeStatus::Pending,
                notes: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        if new_logs.is_empty() {
            return Ok(Vec::new());
        }

        let created = self.intake_log_repository.store_intake_logs(&new_logs).await?;
        if created.len() < new_logs.len() {
            warn!(
                "Skipped {} intake logs for {} already created concurrently",
                new_logs.len() - created.len(),
                date
            );
        }
        info!("Generated {} intake logs for {} (child {})", created.len(), date, child.id);

        self.with_substances(&child.id, created).await
    }

    /// Logs of one calendar day with their substance; empty without a child
    pub async fn logs_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<IntakeLogWithSubstance>> {
        let (start, end) = day_bounds(date);
        self.logs_in_window(user_id, start, end).await
    }

    pub async fn today_logs(&self, user_id: &str) -> Result<Vec<IntakeLogWithSubstance>> {
        self.logs_for_date(user_id, local_today()).await
    }

    /// Logs scheduled from the start of `start` through the end of `end`
    pub async fn logs_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IntakeLogWithSubstance>> {
        if end < start {
            return Err(DomainError::validation("End date must not be before start date").into());
        }
        let (window_start, _) = day_bounds(start);
        let (_, window_end) = day_bounds(end);
        self.logs_in_window(user_id, window_start, window_end).await
    }

    /// Half-open window `[start, end)`; empty without a child
    pub async fn logs_in_window(
        &self,
        user_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<IntakeLogWithSubstance>> {
        match self.child_service.get_child(user_id).await? {
            Some(child) => self.intake_log_repository.list_intake_logs(&child.id, start, end).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_log(&self, user_id: &str, log_id: &str) -> Result<IntakeLogWithSubstance> {
        self.intake_log_repository
            .get_intake_log(user_id, log_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Intake log not found: {}", log_id)).into())
    }

    /// Generic update: only the fields present in the request change
    pub async fn update_log(
        &self,
        user_id: &str,
        log_id: &str,
        request: UpdateIntakeLogRequest,
    ) -> Result<IntakeLogWithSubstance> {
        let actual_time = match request.actual_time {
            Some(Some(value)) => Some(Some(
                parse_local_timestamp(&value).map_err(|e| DomainError::validation(e.to_string()))?,
            )),
            Some(None) => Some(None),
            None => None,
        };

        let mut entry = self.get_log(user_id, log_id).await?;
        apply_update(&mut entry.log, request.status, request.notes, actual_time);
        self.save(entry).await
    }

    pub async fn mark_taken(
        &self,
        user_id: &str,
        log_id: &str,
        notes: Option<String>,
    ) -> Result<IntakeLogWithSubstance> {
        let mut entry = self.get_log(user_id, log_id).await?;
        mark_taken(&mut entry.log, optional_text(notes), local_now());
        self.save(entry).await
    }

    pub async fn mark_skipped(
        &self,
        user_id: &str,
        log_id: &str,
        notes: Option<String>,
    ) -> Result<IntakeLogWithSubstance> {
        let mut entry = self.get_log(user_id, log_id).await?;
        mark_skipped(&mut entry.log, optional_text(notes));
        self.save(entry).await
    }

    /// Record a dose that no schedule produced
    pub async fn create_manual_log(
        &self,
        user_id: &str,
        request: CreateManualLogRequest,
    ) -> Result<IntakeLogWithSubstance> {
        let scheduled_time = parse_local_timestamp(&request.scheduled_time)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let child = self.child_service.require_child(user_id).await?;
        let substance = self
            .substance_repository
            .get_substance(user_id, &request.substance_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Substance not found: {}", request.substance_id)))?;
        if substance.child_id != child.id {
            return Err(DomainError::validation("Substance does not belong to this child").into());
        }

        let now = Utc::now();
        let log = IntakeLog {
            id: generate_id(),
            user_id: user_id.to_string(),
            child_id: child.id,
            substance_id: substance.id.clone(),
            schedule_id: None,
            scheduled_time,
            actual_time: manual_actual_time(request.status, local_now()),
            status: request.status,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.intake_log_repository.store_intake_log(&log).await?;

        info!("Created manual {} log {} for {}", log.status, log.id, substance.name);
        Ok(IntakeLogWithSubstance { log, substance })
    }

    pub async fn today_progress(&self, user_id: &str) -> Result<TodayProgress> {
        let logs = self.today_logs(user_id).await?;
        Ok(aggregation::today_progress(logs.iter().map(|entry| &entry.log)))
    }

    async fn save(&self, mut entry: IntakeLogWithSubstance) -> Result<IntakeLogWithSubstance> {
        entry.log.updated_at = Utc::now();
        self.intake_log_repository.update_intake_log(&entry.log).await?;
        info!("Intake log {} is now {}", entry.log.id, entry.log.status);
        Ok(entry)
    }

    async fn with_substances(
        &self,
        child_id: &str,
        logs: Vec<IntakeLog>,
    ) -> Result<Vec<IntakeLogWithSubstance>> {
        let substances: HashMap<String, Substance> = self
            .substance_repository
            .list_substances(child_id, false)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        Ok(logs
            .into_iter()
            .filter_map(|log| {
                let substance = substances.get(&log.substance_id)?.clone();
                Some(IntakeLogWithSubstance { log, substance })
            })
            .collect())
    }
}
