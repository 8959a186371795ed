//! # Calendar Feed
//!
//! Merges intake logs and health events of a window into one date-sorted
//! list for the calendar view.

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::debug;

use crate::backend::domain::child_service::ChildService;
use crate::backend::domain::errors::DomainError;
use crate::backend::domain::models::datetime::{format_date, format_local_timestamp, parse_date, parse_local_timestamp};
use crate::backend::storage::{Connection, HealthEventStorage, IntakeLogStorage};
use shared::{CalendarEvent, HealthCalendarEvent, IntakeCalendarEvent};

/// Which sources the feed includes; both when no filter is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFilter {
    pub intakes: bool,
    pub health_events: bool,
}

impl CalendarFilter {
    /// Parse a comma separated list such as `intakes,health_events`.
    /// Unknown names are ignored.
    pub fn parse(types: Option<&str>) -> Self {
        match types.map(str::trim).filter(|t| !t.is_empty()) {
            None => Self { intakes: true, health_events: true },
            Some(types) => {
                let names: Vec<&str> = types.split(',').map(str::trim).collect();
                Self {
                    intakes: names.contains(&"intakes"),
                    health_events: names.contains(&"health_events"),
                }
            }
        }
    }
}

/// A window edge given either as a plain date or as a local timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
enum Edge {
    Date(NaiveDate),
    Instant(NaiveDateTime),
}

impl Edge {
    fn parse(value: &str) -> Result<Self> {
        if let Ok(date) = parse_date(value) {
            return Ok(Edge::Date(date));
        }
        parse_local_timestamp(value)
            .map(Edge::Instant)
            .map_err(|e| DomainError::validation(e.to_string()).into())
    }

    fn date(self) -> NaiveDate {
        match self {
            Edge::Date(date) => date,
            Edge::Instant(instant) => instant.date(),
        }
    }

    fn inclusive_start(self) -> NaiveDateTime {
        match self {
            Edge::Date(date) => date.and_time(NaiveTime::MIN),
            Edge::Instant(instant) => instant,
        }
    }

    /// Exclusive bound covering everything up to and including this edge.
    /// Stored timestamps have whole seconds.
    fn exclusive_end(self) -> NaiveDateTime {
        match self {
            Edge::Date(date) => date.and_time(NaiveTime::MIN) + Duration::days(1),
            Edge::Instant(instant) => instant + Duration::seconds(1),
        }
    }
}

#[derive(Clone)]
pub struct CalendarService<C: Connection> {
    intake_log_repository: C::IntakeLogRepository,
    health_event_repository: C::HealthEventRepository,
    child_service: ChildService<C>,
}

impl<C: Connection> CalendarService<C> {
    pub fn new(connection: Arc<C>, child_service: ChildService<C>) -> Self {
        Self {
            intake_log_repository: connection.create_intake_log_repository(),
            health_event_repository: connection.create_health_event_repository(),
            child_service,
        }
    }

    /// Events between `start` and `end` inclusive, sorted by date.
    ///
    /// Health events sort at the start of their day. Empty without a child.
    pub async fn events(
        &self,
        user_id: &str,
        start: &str,
        end: &str,
        filter: CalendarFilter,
    ) -> Result<Vec<CalendarEvent>> {
        let start = Edge::parse(start)?;
        let end = Edge::parse(end)?;

        let Some(child) = self.child_service.get_child(user_id).await? else {
            return Ok(Vec::new());
        };

        let mut events: Vec<(NaiveDateTime, CalendarEvent)> = Vec::new();

        if filter.intakes {
            let logs = self
                .intake_log_repository
                .list_intake_logs(&child.id, start.inclusive_start(), end.exclusive_end())
                .await?;
            events.extend(logs.into_iter().map(|entry| {
                let event = CalendarEvent::Intake(IntakeCalendarEvent {
                    id: entry.log.id,
                    title: entry.substance.name,
                    date: format_local_timestamp(entry.log.scheduled_time),
                    status: entry.log.status,
                    substance_type: entry.substance.substance_type,
                    dosage: entry.substance.dosage,
                    unit: entry.substance.unit,
                });
                (entry.log.scheduled_time, event)
            }));
        }

        if filter.health_events {
            let health_events = self
                .health_event_repository
                .list_health_events_between(&child.id, start.date(), end.date())
                .await?;
            events.extend(health_events.into_iter().map(|event| {
                let sort_key = event.start_date.and_time(NaiveTime::MIN);
                let entry = CalendarEvent::HealthEvent(HealthCalendarEvent {
                    id: event.id,
                    title: event.title,
                    date: format_date(event.start_date),
                    event_type: event.event_type,
                    severity: event.severity,
                    description: event.description,
                    end_date: event.end_date.map(format_date),
                });
                (sort_key, entry)
            }));
        }

        events.sort_by_key(|(key, _)| *key);
        debug!("Calendar feed for child {} has {} events", child.id, events.len());
        Ok(events.into_iter().map(|(_, event)| event).collect())
    }
}
