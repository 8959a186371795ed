//! # Intake Status State Machine
//!
//! Transitions of a single intake log and the timestamps each one sets.
//! `pending` is the initial state; `taken` and `skipped` may be re-marked
//! (last write wins). `missed` is never produced here.

use chrono::NaiveDateTime;
use shared::IntakeStatus;

use crate::backend::domain::models::intake_log::IntakeLog;

/// Mark as taken now. Notes are replaced, `None` clears them.
pub fn mark_taken(log: &mut IntakeLog, notes: Option<String>, now: NaiveDateTime) {
    log.status = IntakeStatus::Taken;
    log.actual_time = Some(now);
    log.notes = notes;
}

/// Mark as skipped. A skip never records an actual time.
pub fn mark_skipped(log: &mut IntakeLog, notes: Option<String>) {
    log.status = IntakeStatus::Skipped;
    log.actual_time = None;
    log.notes = notes;
}

/// Actual time recorded on a manually created log
pub fn manual_actual_time(status: IntakeStatus, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match status {
        IntakeStatus::Taken => Some(now),
        _ => None,
    }
}

/// Field-wise update: only the provided fields change, an inner `None` clears
pub fn apply_update(
    log: &mut IntakeLog,
    status: Option<IntakeStatus>,
    notes: Option<Option<String>>,
    actual_time: Option<Option<NaiveDateTime>>,
) {
    if let Some(status) = status {
        log.status = status;
    }
    if let Some(notes) = notes {
        log.notes = notes;
    }
    if let Some(actual_time) = actual_time {
        log.actual_time = actual_time;
    }
}
