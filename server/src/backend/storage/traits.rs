//! # Storage Traits
//!
//! Storage abstractions the domain layer is written against. The SQLite
//! repositories implement them; services only see these traits and the
//! `Connection` factory.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::backend::domain::models::child::{Child, ProfileLog};
use crate::backend::domain::models::health_event::{HealthEvent, HealthEventSubstance};
use crate::backend::domain::models::intake_log::{IntakeLog, IntakeLogWithSubstance};
use crate::backend::domain::models::push_subscription::PushSubscription;
use crate::backend::domain::models::schedule::Schedule;
use crate::backend::domain::models::substance::Substance;

/// Child profile storage; at most one child per user
#[async_trait]
pub trait ChildStorage: Send + Sync {
    /// Store a new child. Fails if the user already has one.
    async fn store_child(&self, child: &Child) -> Result<()>;

    /// The child owned by `user_id`, if any
    async fn get_child_for_user(&self, user_id: &str) -> Result<Option<Child>>;

    /// Overwrite every profile field of an existing child
    async fn update_child(&self, child: &Child) -> Result<()>;
}

/// Audit log of profile changes
#[async_trait]
pub trait ProfileLogStorage: Send + Sync {
    async fn store_profile_log(&self, log: &ProfileLog) -> Result<()>;

    /// Most recent first
    async fn list_profile_logs(&self, child_id: &str, limit: u32) -> Result<Vec<ProfileLog>>;

    /// Returns true if the log was found and deleted
    async fn delete_profile_log(&self, user_id: &str, log_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait SubstanceStorage: Send + Sync {
    async fn store_substance(&self, substance: &Substance) -> Result<()>;

    async fn get_substance(&self, user_id: &str, substance_id: &str) -> Result<Option<Substance>>;

    /// Ordered by name
    async fn list_substances(&self, child_id: &str, active_only: bool) -> Result<Vec<Substance>>;

    async fn update_substance(&self, substance: &Substance) -> Result<()>;

    /// Returns true if the substance was found and deleted
    async fn delete_substance(&self, user_id: &str, substance_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait ScheduleStorage: Send + Sync {
    async fn store_schedule(&self, schedule: &Schedule) -> Result<()>;

    async fn get_schedule(&self, user_id: &str, schedule_id: &str) -> Result<Option<Schedule>>;

    /// Ordered by time of day
    async fn list_schedules(&self, child_id: &str, active_only: bool) -> Result<Vec<Schedule>>;

    async fn list_schedules_for_substance(&self, substance_id: &str) -> Result<Vec<Schedule>>;

    async fn update_schedule(&self, schedule: &Schedule) -> Result<()>;

    async fn delete_schedule(&self, user_id: &str, schedule_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait IntakeLogStorage: Send + Sync {
    async fn store_intake_log(&self, log: &IntakeLog) -> Result<()>;

    /// Insert a batch of logs in one transaction.
    ///
    /// A log whose (schedule, day) is already taken is skipped rather than
    /// failing the batch; only the rows actually inserted are returned. Any
    /// other failure rolls the whole batch back.
    async fn store_intake_logs(&self, logs: &[IntakeLog]) -> Result<Vec<IntakeLog>>;

    async fn get_intake_log(&self, user_id: &str, log_id: &str) -> Result<Option<IntakeLogWithSubstance>>;

    /// Logs with `start <= scheduled_time < end`, ordered by scheduled_time
    async fn list_intake_logs(
        &self,
        child_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<IntakeLogWithSubstance>>;

    async fn update_intake_log(&self, log: &IntakeLog) -> Result<()>;
}

#[async_trait]
pub trait HealthEventStorage: Send + Sync {
    async fn store_health_event(&self, event: &HealthEvent) -> Result<()>;

    async fn get_health_event(&self, user_id: &str, event_id: &str) -> Result<Option<HealthEvent>>;

    /// Newest start_date first
    async fn list_health_events(&self, child_id: &str) -> Result<Vec<HealthEvent>>;

    /// Events whose start_date lies in `[start, end]`, oldest first
    async fn list_health_events_between(
        &self,
        child_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HealthEvent>>;

    async fn update_health_event(&self, event: &HealthEvent) -> Result<()>;

    async fn delete_health_event(&self, user_id: &str, event_id: &str) -> Result<bool>;

    async fn link_substance(&self, link: &HealthEventSubstance) -> Result<()>;

    async fn unlink_substance(&self, event_id: &str, substance_id: &str) -> Result<bool>;

    async fn list_linked_substances(&self, event_id: &str) -> Result<Vec<(HealthEventSubstance, Substance)>>;
}

#[async_trait]
pub trait PushSubscriptionStorage: Send + Sync {
    /// Insert, or refresh the keys of an existing endpoint and re-activate it
    async fn upsert_subscription(&self, subscription: &PushSubscription) -> Result<PushSubscription>;

    async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>>;

    async fn list_active_subscriptions(&self, user_id: &str) -> Result<Vec<PushSubscription>>;

    async fn deactivate_subscription(&self, subscription_id: &str) -> Result<()>;

    /// Returns true if an active subscription for the endpoint was deactivated
    async fn deactivate_endpoint(&self, user_id: &str, endpoint: &str) -> Result<bool>;
}

/// Trait defining the interface for storage connections
///
/// Produces the repositories for one backend, so services stay generic over
/// the storage implementation.
pub trait Connection: Send + Sync + Clone + 'static {
    type ChildRepository: ChildStorage + Clone;
    type ProfileLogRepository: ProfileLogStorage + Clone;
    type SubstanceRepository: SubstanceStorage + Clone;
    type ScheduleRepository: ScheduleStorage + Clone;
    type IntakeLogRepository: IntakeLogStorage + Clone;
    type HealthEventRepository: HealthEventStorage + Clone;
    type PushSubscriptionRepository: PushSubscriptionStorage + Clone;

    fn create_child_repository(&self) -> Self::ChildRepository;
    fn create_profile_log_repository(&self) -> Self::ProfileLogRepository;
    fn create_substance_repository(&self) -> Self::SubstanceRepository;
    fn create_schedule_repository(&self) -> Self::ScheduleRepository;
    fn create_intake_log_repository(&self) -> Self::IntakeLogRepository;
    fn create_health_event_repository(&self) -> Self::HealthEventRepository;
    fn create_push_subscription_repository(&self) -> Self::PushSubscriptionRepository;
}
