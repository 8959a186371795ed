//! Child Health Journal backend: one child per household, their medicines,
//! vitamins and supplements, dosing schedules, daily intake logs, health
//! events and push reminders, served as a JSON API.

pub mod backend;
pub mod config;
