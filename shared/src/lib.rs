use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Deserializes a field that distinguishes "absent" from an explicit `null`.
///
/// Absent fields stay `None` (through `#[serde(default)]`), an explicit `null`
/// becomes `Some(None)` and a value becomes `Some(Some(value))`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Error returned when a string does not name a member of a closed set
#[derive(Debug, Clone, PartialEq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Declares a closed string enum stored and transmitted in its lowercase form.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_enum!(
    /// Gender recorded on a child profile
    Gender, "gender", {
        Male => "male",
        Female => "female",
        Other => "other",
    }
);

closed_enum!(
    /// Category of a trackable substance
    SubstanceType, "substance type", {
        Medicine => "medicine",
        Vitamin => "vitamin",
        Supplement => "supplement",
    }
);

closed_enum!(
    /// Status of a single intake occurrence
    IntakeStatus, "intake status", {
        Pending => "pending",
        Taken => "taken",
        Skipped => "skipped",
        Missed => "missed",
    }
);

closed_enum!(
    /// Kind of health event
    HealthEventType, "health event type", {
        Illness => "illness",
        Vaccination => "vaccination",
        Milestone => "milestone",
        Appointment => "appointment",
        Treatment => "treatment",
        Other => "other",
    }
);

closed_enum!(
    /// Severity of a health event
    Severity, "severity", {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

impl Default for IntakeStatus {
    fn default() -> Self {
        IntakeStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Child profile
// ---------------------------------------------------------------------------

/// The child profile owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// ISO 8601 date (YYYY-MM-DD)
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub head_circumference_cm: Option<f64>,
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub medical_conditions: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Full replacement of the tracked profile fields.
///
/// Fields left out of the body are treated as "no value", matching how the
/// profile editor always submits the whole form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateChildRequest {
    pub name: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<Gender>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub head_circumference_cm: Option<f64>,
    pub blood_type: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_conditions: Option<String>,
    pub notes: Option<String>,
    /// Free-text note stored on the resulting profile log entry
    pub log_notes: Option<String>,
}

/// A single field change: both sides are JSON values, `null` meaning no value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

pub type ProfileChanges = BTreeMap<String, FieldChange>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: Child,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChildResponse {
    pub child: Child,
    pub changes: ProfileChanges,
    pub success_message: String,
}

/// Immutable audit record of one profile update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLog {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub changed_at: String,
    pub changes: ProfileChanges,
    /// Display lines for `changes`, one per field
    #[serde(default)]
    pub summary: Vec<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Age of the child today, with its display label ("1 year, 5 months old")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildAgeResponse {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Substances and schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substance {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub substance_type: SubstanceType,
    pub dosage: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub color: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubstanceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub substance_type: SubstanceType,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Partial substance update; nullable fields accept an explicit `null` to clear
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateSubstanceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub substance_type: Option<SubstanceType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub dosage: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceWithSchedules {
    #[serde(flatten)]
    pub substance: Substance,
    pub schedules: Vec<Schedule>,
}

/// Substances of a child grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstancesByType {
    pub medicine: Vec<Substance>,
    pub vitamin: Vec<Substance>,
    pub supplement: Vec<Substance>,
}

/// Recurrence rule: give a substance at `time` on `days_of_week` within the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub user_id: String,
    pub substance_id: String,
    pub child_id: String,
    /// Wall-clock time of day (HH:MM:SS)
    pub time: String,
    /// Weekday numbers, 0 = Sunday ... 6 = Saturday
    pub days_of_week: Vec<u8>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub reminder_minutes_before: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub substance_id: String,
    pub time: String,
    pub days_of_week: Vec<u8>,
    /// Defaults to today when omitted
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub reminder_minutes_before: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes_before: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWithSubstance {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub substance: Substance,
}

// ---------------------------------------------------------------------------
// Intake logs
// ---------------------------------------------------------------------------

/// One concrete dosing occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeLog {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    pub substance_id: String,
    /// `None` for manually created logs
    pub schedule_id: Option<String>,
    /// Naive local timestamp (YYYY-MM-DDTHH:MM:SS)
    pub scheduled_time: String,
    pub actual_time: Option<String>,
    pub status: IntakeStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeLogWithSubstance {
    #[serde(flatten)]
    pub log: IntakeLog,
    pub substance: Substance,
}

/// Body of `PUT /api/intake-logs/:id`; only the provided fields change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateIntakeLogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IntakeStatus>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub actual_time: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkIntakeRequest {
    pub notes: Option<String>,
}

fn default_manual_status() -> IntakeStatus {
    IntakeStatus::Taken
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateManualLogRequest {
    pub substance_id: String,
    pub scheduled_time: String,
    #[serde(default = "default_manual_status")]
    pub status: IntakeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateLogsRequest {
    /// Target calendar date (YYYY-MM-DD); today when omitted
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateLogsResponse {
    pub created: usize,
    pub logs: Vec<IntakeLogWithSubstance>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayProgress {
    pub taken: usize,
    pub skipped: usize,
    pub pending: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnoozeRequest {
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnoozeResponse {
    pub log_id: String,
    pub minutes: u32,
    pub remind_at: String,
}

// ---------------------------------------------------------------------------
// Health events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub id: String,
    pub user_id: String,
    pub child_id: String,
    #[serde(rename = "type")]
    pub event_type: HealthEventType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: String,
    /// `None` while the event is ongoing
    pub end_date: Option<String>,
    pub severity: Option<Severity>,
    pub metadata: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHealthEventRequest {
    #[serde(rename = "type")]
    pub event_type: HealthEventType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateHealthEventRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<HealthEventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub severity: Option<Option<Severity>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Option<Value>>,
}

/// Join row linking a substance to a health event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEventSubstance {
    pub id: String,
    pub health_event_id: String,
    pub substance_id: String,
    pub dosage_override: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedSubstance {
    #[serde(flatten)]
    pub link: HealthEventSubstance,
    pub substance: Substance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEventWithSubstances {
    #[serde(flatten)]
    pub event: HealthEvent,
    pub health_event_substances: Vec<LinkedSubstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSubstanceRequest {
    pub substance_id: String,
    #[serde(default)]
    pub dosage_override: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Intake entry of the merged calendar feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeCalendarEvent {
    pub id: String,
    pub title: String,
    pub date: String,
    pub status: IntakeStatus,
    pub substance_type: SubstanceType,
    pub dosage: Option<String>,
    pub unit: Option<String>,
}

/// Health event entry of the merged calendar feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCalendarEvent {
    pub id: String,
    pub title: String,
    pub date: String,
    pub event_type: HealthEventType,
    pub severity: Option<Severity>,
    pub description: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarEvent {
    Intake(IntakeCalendarEvent),
    HealthEvent(HealthCalendarEvent),
}

impl CalendarEvent {
    pub fn id(&self) -> &str {
        match self {
            CalendarEvent::Intake(event) => &event.id,
            CalendarEvent::HealthEvent(event) => &event.id,
        }
    }

    /// Either a naive timestamp (intakes) or a plain date (health events)
    pub fn date(&self) -> &str {
        match self {
            CalendarEvent::Intake(event) => &event.date,
            CalendarEvent::HealthEvent(event) => &event.date,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Medication Reminder";
pub const DEFAULT_NOTIFICATION_BODY: &str = "Time to take your medication";
/// Snooze length offered by the device-side "snooze" action
pub const SNOOZE_MINUTES: u32 = 10;

/// Actions a delivered notification offers on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationAction {
    /// `PUT /api/intake-logs/:id` with `{status: "taken", actual_time}`
    MarkTaken,
    /// `POST /api/intake-logs/:id/snooze` with `{minutes: 10}`
    Snooze,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAction::MarkTaken => "mark-taken",
            NotificationAction::Snooze => "snooze",
        }
    }
}

/// A registered delivery endpoint for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub device_info: Option<Value>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscribeRequest {
    pub endpoint: Option<String>,
    pub p256dh: Option<String>,
    pub auth: Option<String>,
    #[serde(rename = "deviceInfo")]
    pub device_info: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendNotificationRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub data: Option<Value>,
}

/// The JSON document handed to the push transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetail {
    /// Subscription id
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub sent: usize,
    pub failed: usize,
    pub details: Vec<DeliveryDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRemindersRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    /// Naive local timestamp overriding the current time
    pub now: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRemindersResponse {
    pub reminded: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Body of every failure response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closed_enum_round_trip_through_strings() {
        for status in IntakeStatus::ALL {
            assert_eq!(status.as_str().parse::<IntakeStatus>().unwrap(), *status);
        }
        assert_eq!(
            "appointment".parse::<HealthEventType>().unwrap(),
            HealthEventType::Appointment
        );

        let err = "sometimes".parse::<IntakeStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid intake status: sometimes");
    }

    #[test]
    fn test_update_intake_log_request_distinguishes_null_from_absent() {
        let absent: UpdateIntakeLogRequest = serde_json::from_value(json!({"status": "taken"})).unwrap();
        assert_eq!(absent.status, Some(IntakeStatus::Taken));
        assert_eq!(absent.notes, None);

        let cleared: UpdateIntakeLogRequest = serde_json::from_value(json!({"notes": null})).unwrap();
        assert_eq!(cleared.notes, Some(None));

        let set: UpdateIntakeLogRequest = serde_json::from_value(json!({"notes": "with food"})).unwrap();
        assert_eq!(set.notes, Some(Some("with food".to_string())));
    }

    #[test]
    fn test_calendar_event_is_tagged_by_type() {
        let event = CalendarEvent::HealthEvent(HealthCalendarEvent {
            id: "e1".to_string(),
            title: "Flu".to_string(),
            date: "2024-03-01".to_string(),
            event_type: HealthEventType::Illness,
            severity: Some(Severity::Medium),
            description: None,
            end_date: None,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "health_event");
        assert_eq!(value["eventType"], "illness");
        assert_eq!(value["endDate"], Value::Null);
        assert_eq!(event.date(), "2024-03-01");
    }

    #[test]
    fn test_manual_log_defaults_to_taken() {
        let request: CreateManualLogRequest = serde_json::from_value(json!({
            "substance_id": "s1",
            "scheduled_time": "2024-03-01T08:00:00"
        }))
        .unwrap();
        assert_eq!(request.status, IntakeStatus::Taken);
    }

    #[test]
    fn test_notification_action_names() {
        assert_eq!(serde_json::to_value(NotificationAction::MarkTaken).unwrap(), "mark-taken");
        assert_eq!(NotificationAction::Snooze.as_str(), "snooze");
    }
}
