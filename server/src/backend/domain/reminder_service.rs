//! # Reminders
//!
//! Per-process reminder book plus the sweep that turns due pending doses
//! into push notifications. The book lives in memory only; a restart forgets
//! snoozes and which logs were already reminded.

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::backend::domain::errors::DomainError;
use crate::backend::domain::intake_log_service::IntakeLogService;
use crate::backend::domain::models::datetime::format_local_timestamp;
use crate::backend::domain::models::intake_log::IntakeLogWithSubstance;
use crate::backend::domain::models::schedule::Schedule;
use crate::backend::domain::notification_service::NotificationService;
use crate::backend::domain::schedule_service::ScheduleService;
use crate::backend::storage::Connection;
use shared::{IntakeStatus, NotificationAction, RunRemindersResponse, SnoozeResponse, SNOOZE_MINUTES};

#[derive(Debug, Default)]
struct UserReminders {
    /// Log id -> instant the snoozed reminder is due
    snoozed: HashMap<String, NaiveDateTime>,
    /// Log id -> instant the reminder went out
    reminded: HashMap<String, NaiveDateTime>,
}

impl UserReminders {
    /// Forget every log that is not among `pending`
    fn retain_pending(&mut self, pending: &HashSet<String>) {
        self.snoozed.retain(|id, _| pending.contains(id));
        self.reminded.retain(|id, _| pending.contains(id));
    }

    fn is_empty(&self) -> bool {
        self.snoozed.is_empty() && self.reminded.is_empty()
    }
}

/// Reminder state per user; a sweep keeps only the pending logs of its day
#[derive(Debug, Default)]
struct ReminderBook {
    users: HashMap<String, UserReminders>,
}

#[derive(Clone)]
pub struct ReminderService<C: Connection> {
    intake_log_service: IntakeLogService<C>,
    schedule_service: ScheduleService<C>,
    notification_service: NotificationService<C>,
    book: Arc<Mutex<ReminderBook>>,
}

impl<C: Connection> ReminderService<C> {
    pub fn new(
        intake_log_service: IntakeLogService<C>,
        schedule_service: ScheduleService<C>,
        notification_service: NotificationService<C>,
    ) -> Self {
        Self {
            intake_log_service,
            schedule_service,
            notification_service,
            book: Arc::new(Mutex::new(ReminderBook::default())),
        }
    }

    fn book(&self) -> MutexGuard<'_, ReminderBook> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push the reminder of a pending log `minutes` past `now`; a snoozed log
    /// is reminded again even if it already was
    pub async fn snooze(
        &self,
        user_id: &str,
        log_id: &str,
        minutes: Option<u32>,
        now: NaiveDateTime,
    ) -> Result<SnoozeResponse> {
        let minutes = minutes.unwrap_or(SNOOZE_MINUTES);
        if minutes == 0 {
            return Err(DomainError::validation("Snooze minutes must be positive").into());
        }

        let entry = self.intake_log_service.get_log(user_id, log_id).await?;
        if entry.log.status != IntakeStatus::Pending {
            return Err(DomainError::validation(format!(
                "Only pending intake logs can be snoozed (log is {})",
                entry.log.status
            ))
            .into());
        }

        let remind_at = now + Duration::minutes(minutes as i64);
        {
            let mut book = self.book();
            let reminders = book.users.entry(user_id.to_string()).or_default();
            reminders.snoozed.insert(entry.log.id.clone(), remind_at);
            reminders.reminded.remove(&entry.log.id);
        }

        info!("Snoozed intake log {} until {}", entry.log.id, remind_at);
        Ok(SnoozeResponse {
            log_id: entry.log.id,
            minutes,
            remind_at: format_local_timestamp(remind_at),
        })
    }

    /// Notify about every pending log of `now`'s day whose reminder is due
    /// and has not gone out yet
    pub async fn run(&self, user_id: &str, now: NaiveDateTime) -> Result<RunRemindersResponse> {
        let logs = self.intake_log_service.logs_for_date(user_id, now.date()).await?;
        let schedules: HashMap<String, Schedule> = self
            .schedule_service
            .list_schedules(user_id, false)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let pending: Vec<IntakeLogWithSubstance> = logs
            .into_iter()
            .filter(|entry| entry.log.status == IntakeStatus::Pending)
            .collect();
        let pending_ids: HashSet<String> = pending.iter().map(|entry| entry.log.id.clone()).collect();

        let due: Vec<IntakeLogWithSubstance> = {
            let mut book = self.book();
            let reminders = book.users.entry(user_id.to_string()).or_default();
            reminders.retain_pending(&pending_ids);

            let due: Vec<IntakeLogWithSubstance> = pending
                .into_iter()
                .filter(|entry| !reminders.reminded.contains_key(&entry.log.id))
                .filter(|entry| {
                    let schedule = entry.log.schedule_id.as_ref().and_then(|id| schedules.get(id));
                    reminder_instant(entry, schedule, reminders.snoozed.get(&entry.log.id).copied()) <= now
                })
                .collect();

            if due.is_empty() && reminders.is_empty() {
                book.users.remove(user_id);
            }
            due
        };

        let mut response = RunRemindersResponse::default();
        for entry in due {
            let result = self
                .notification_service
                .send(
                    user_id,
                    Some(format!("Time for {}", entry.substance.name)),
                    Some(reminder_body(&entry)),
                    Some(json!({
                        "logId": entry.log.id,
                        "substanceId": entry.substance.id,
                        "actions": [
                            NotificationAction::MarkTaken.as_str(),
                            NotificationAction::Snooze.as_str(),
                        ],
                    })),
                )
                .await?;

            {
                let mut book = self.book();
                let reminders = book.users.entry(user_id.to_string()).or_default();
                reminders.snoozed.remove(&entry.log.id);
                reminders.reminded.insert(entry.log.id.clone(), now);
            }
            debug!("Reminded intake log {} ({} sent)", entry.log.id, result.sent);

            response.reminded += 1;
            response.sent += result.sent;
            response.failed += result.failed;
        }

        info!(
            "Reminder run for user {}: {} reminded, {} sent, {} failed",
            user_id, response.reminded, response.sent, response.failed
        );
        Ok(response)
    }
}

/// When the reminder of a log is due: the snooze instant if one is set,
/// otherwise ahead of the dose by the schedule's lead time
fn reminder_instant(
    entry: &IntakeLogWithSubstance,
    schedule: Option<&Schedule>,
    snoozed_until: Option<NaiveDateTime>,
) -> NaiveDateTime {
    if let Some(instant) = snoozed_until {
        return instant;
    }
    match schedule {
        Some(schedule) => {
            entry.log.scheduled_time - Duration::minutes(schedule.reminder_minutes_before as i64)
        }
        None => entry.log.scheduled_time,
    }
}

fn reminder_body(entry: &IntakeLogWithSubstance) -> String {
    let time = entry.log.scheduled_time.format("%H:%M");
    match entry.substance.dosage_label() {
        Some(dosage) => format!("{} at {}", dosage, time),
        None => format!("Scheduled at {}", time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::child_service::ChildService;
    use crate::backend::domain::notification_service::tests::RecordingTransport;
    use crate::backend::io::push::PushTransport;
    use crate::backend::storage::repositories::test_utils::{seed_child, seed_schedule, seed_substance, setup_test};
    use crate::backend::storage::DbConnection;
    use chrono::NaiveDate;
    use serde_json::Value;
    use shared::SubscribeRequest;

    struct Fixture {
        reminders: ReminderService<DbConnection>,
        intake_logs: IntakeLogService<DbConnection>,
        transport: Arc<RecordingTransport>,
        log_id: String,
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    async fn setup() -> Fixture {
        let db = setup_test().await;
        let child = seed_child(&db, "user-1").await;
        let vitamin = seed_substance(&db, &child, "Vitamin D").await;
        // 08:00 with a 15 minute lead
        seed_schedule(&db, &vitamin, 8, &[3]).await;

        let connection = Arc::new(db);
        let transport = Arc::new(RecordingTransport::default());
        let child_service = ChildService::new(connection.clone());
        let intake_logs = IntakeLogService::new(connection.clone(), child_service.clone());
        let schedules = ScheduleService::new(connection.clone(), child_service);
        let notifications = NotificationService::new(connection, Some(transport.clone() as Arc<dyn PushTransport>));
        notifications
            .subscribe(
                "user-1",
                SubscribeRequest {
                    endpoint: Some("https://push.example/phone".to_string()),
                    p256dh: Some("key".to_string()),
                    auth: Some("auth".to_string()),
                    device_info: None,
                },
            )
            .await
            .unwrap();

        let created = intake_logs.reconcile("user-1", at(0, 0).date()).await.unwrap();
        Fixture {
            reminders: ReminderService::new(intake_logs.clone(), schedules, notifications),
            intake_logs,
            transport,
            log_id: created[0].log.id.clone(),
        }
    }

    fn tracked_logs(reminders: &ReminderService<DbConnection>, user_id: &str) -> usize {
        reminders
            .book()
            .users
            .get(user_id)
            .map_or(0, |r| r.snoozed.len() + r.reminded.len())
    }

    #[tokio::test]
    async fn test_reminds_once_after_lead_time() {
        let f = setup().await;

        let early = f.reminders.run("user-1", at(7, 44)).await.unwrap();
        assert_eq!(early.reminded, 0);

        let due = f.reminders.run("user-1", at(7, 45)).await.unwrap();
        assert_eq!(due, RunRemindersResponse { reminded: 1, sent: 1, failed: 0 });

        let again = f.reminders.run("user-1", at(7, 50)).await.unwrap();
        assert_eq!(again.reminded, 0);

        let (_, payload) = &f.transport.delivered()[0];
        let payload: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(payload["title"], "Time for Vitamin D");
        assert_eq!(payload["body"], "5 ml at 08:00");
        assert_eq!(payload["data"]["logId"], f.log_id.as_str());
        assert_eq!(payload["data"]["actions"], serde_json::json!(["mark-taken", "snooze"]));
    }

    #[tokio::test]
    async fn test_snooze_delays_the_next_reminder() {
        let f = setup().await;
        f.reminders.run("user-1", at(7, 45)).await.unwrap();

        let snoozed = f.reminders.snooze("user-1", &f.log_id, None, at(7, 50)).await.unwrap();
        assert_eq!(snoozed.minutes, SNOOZE_MINUTES);
        assert_eq!(snoozed.remind_at, "2024-03-06T08:00:00");

        assert_eq!(f.reminders.run("user-1", at(7, 59)).await.unwrap().reminded, 0);
        assert_eq!(f.reminders.run("user-1", at(8, 0)).await.unwrap().reminded, 1);
        assert_eq!(f.transport.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_completed_logs_are_not_reminded_or_snoozed() {
        let f = setup().await;
        f.intake_logs.mark_taken("user-1", &f.log_id, None).await.unwrap();

        assert_eq!(f.reminders.run("user-1", at(9, 0)).await.unwrap().reminded, 0);
        let err = f
            .reminders
            .snooze("user-1", &f.log_id, Some(5), at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sweep_forgets_logs_of_previous_days() {
        let f = setup().await;
        f.reminders.run("user-1", at(7, 45)).await.unwrap();
        assert_eq!(tracked_logs(&f.reminders, "user-1"), 1);

        // Thursday has no doses
        let next_day = at(7, 45) + Duration::days(1);
        assert_eq!(f.reminders.run("user-1", next_day).await.unwrap().reminded, 0);
        assert_eq!(tracked_logs(&f.reminders, "user-1"), 0);
        assert!(f.reminders.book().users.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_forgets_snoozes_of_completed_logs() {
        let f = setup().await;
        f.reminders.snooze("user-1", &f.log_id, Some(30), at(7, 30)).await.unwrap();
        assert_eq!(tracked_logs(&f.reminders, "user-1"), 1);

        f.intake_logs.mark_skipped("user-1", &f.log_id, None).await.unwrap();
        assert_eq!(f.reminders.run("user-1", at(8, 5)).await.unwrap().reminded, 0);
        assert_eq!(tracked_logs(&f.reminders, "user-1"), 0);
    }
}
