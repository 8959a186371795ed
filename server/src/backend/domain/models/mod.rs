//! Domain models: the entities services operate on, with chrono-typed fields.
//! The REST layer converts them to the `shared` DTOs through the mappers.

pub mod child;
pub mod datetime;
pub mod health_event;
pub mod intake_log;
pub mod push_subscription;
pub mod schedule;
pub mod substance;

/// Generate a fresh entity identifier
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
