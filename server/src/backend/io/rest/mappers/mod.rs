//! Conversions from domain models to the `shared` wire DTOs.
//!
//! Dates go out as `YYYY-MM-DD`, intake instants as naive local timestamps
//! and audit fields as RFC 3339 UTC.

pub mod child_mapper;
pub mod health_event_mapper;
pub mod intake_log_mapper;
pub mod push_subscription_mapper;
pub mod schedule_mapper;
pub mod substance_mapper;

pub use child_mapper::ChildMapper;
pub use health_event_mapper::HealthEventMapper;
pub use intake_log_mapper::IntakeLogMapper;
pub use push_subscription_mapper::PushSubscriptionMapper;
pub use schedule_mapper::ScheduleMapper;
pub use substance_mapper::SubstanceMapper;
