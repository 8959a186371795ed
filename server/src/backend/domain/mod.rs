//! # Domain Module
//!
//! Business logic of the health journal: the child profile and its audit
//! trail, substances and their dosing schedules, the intake log reconciler,
//! health events, the calendar feed, push notifications and reminders.
//!
//! ## Module Organization
//!
//! - **models**: entities with chrono-typed fields
//! - **profile_tracker**: field-level diff behind the profile audit log
//! - **occurrence**: which schedules are due on a date
//! - **intake_status**: status transitions of a single intake log
//! - **aggregation**: read-only projections (progress, active illnesses...)
//! - **\*_service**: orchestration over the storage traits
//!
//! Services are generic over `storage::Connection` and return
//! `anyhow::Result`; failures the REST layer maps to a specific status are
//! raised as `DomainError`.
//!
//! ## Time
//!
//! Schedules and intake instants live in the child's local wall-clock frame
//! (naive timestamps). Audit fields (`created_at`, `updated_at`) are UTC.

pub mod aggregation;
pub mod calendar_service;
pub mod child_service;
pub mod errors;
pub mod health_event_service;
pub mod intake_log_service;
pub mod intake_status;
pub mod models;
pub mod notification_service;
pub mod occurrence;
pub mod profile_tracker;
pub mod reminder_service;
pub mod schedule_service;
pub mod substance_service;

pub use calendar_service::{CalendarFilter, CalendarService};
pub use child_service::ChildService;
pub use errors::DomainError;
pub use health_event_service::HealthEventService;
pub use intake_log_service::IntakeLogService;
pub use notification_service::NotificationService;
pub use reminder_service::ReminderService;
pub use schedule_service::ScheduleService;
pub use substance_service::SubstanceService;
