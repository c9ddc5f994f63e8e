//! Persisted record shape.
//!
//! Persistence hands reminders over as loosely-typed data: dates may be
//! numbers or strings, flags may disagree with each other. `ReminderRecord`
//! mirrors that shape so the auditor can inspect it as stored, and converts
//! leniently into the typed [`Reminder`] the engine works on.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::date::{DateInput, format_time_of_day, parse_time_of_day};
use crate::error::CoreResult;
use crate::model::{
    AnchorInstant, Frequency, NotificationConfig, NotificationTiming, RecurrenceRule,
    RecurrenceWindow, Reminder, Status,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRecord {
    pub pattern: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Signed so out-of-range values survive to validation.
    #[serde(default)]
    pub days_of_week: Vec<i32>,
    /// Window start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateInput>,
    /// Last date of the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<u32>,
    /// Window end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateInput>,
}

const fn default_interval() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRecord>,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub notification_timings: Vec<NotificationTiming>,
    #[serde(default)]
    pub status: Status,
    /// Legacy completion flag kept alongside `status`.
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_notification_at: Option<DateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateInput>,
}

fn parse_date(input: Option<&DateInput>, tz: Tz) -> Option<NaiveDate> {
    input.and_then(|value| value.parse(tz)).map(|parsed| parsed.date)
}

fn parse_instant(input: Option<&DateInput>, tz: Tz) -> Option<DateTime<Utc>> {
    input.and_then(|value| value.to_instant(tz))
}

impl RecurrenceRecord {
    /// Converts into the typed rule, dropping unparseable dates.
    #[must_use]
    pub fn to_rule(&self, tz: Tz) -> RecurrenceRule {
        let start_date = parse_date(self.start_date.as_ref(), tz);
        let window_end = parse_date(self.window_end.as_ref(), tz);
        let window = (start_date.is_some() || window_end.is_some()).then_some(RecurrenceWindow {
            start_date,
            end_date: window_end,
        });

        RecurrenceRule {
            frequency: self.pattern,
            interval: self.interval,
            days_of_week: self.days_of_week.clone(),
            end_date: parse_date(self.end_date.as_ref(), tz),
            occurrence_count: self.occurrence_count,
            window,
        }
    }

    #[must_use]
    pub fn from_rule(rule: &RecurrenceRule) -> Self {
        let window = rule.window.unwrap_or_default();
        Self {
            pattern: rule.frequency,
            interval: rule.interval,
            days_of_week: rule.days_of_week.clone(),
            start_date: window.start_date.map(DateInput::from),
            end_date: rule.end_date.map(DateInput::from),
            occurrence_count: rule.occurrence_count,
            window_end: window.end_date.map(DateInput::from),
        }
    }
}

impl ReminderRecord {
    /// ## Summary
    /// Converts the stored shape into a typed [`Reminder`], reading dates in `tz`.
    ///
    /// Unparseable dates become absent. A time of day comes from `due_time`
    /// when present, otherwise from a time embedded in `due_date`.
    #[must_use]
    pub fn to_reminder(&self, tz: Tz) -> Reminder {
        let anchor = self
            .due_date
            .as_ref()
            .and_then(|input| input.parse(tz))
            .map(|parsed| {
                let time = self
                    .due_time
                    .as_deref()
                    .and_then(parse_time_of_day)
                    .or(parsed.time);
                AnchorInstant::new(parsed.date, time)
            });

        let notifications = (self.notifications_enabled || !self.notification_timings.is_empty())
            .then(|| NotificationConfig {
                enabled: self.notifications_enabled,
                timings: self.notification_timings.clone(),
            });

        Reminder {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            anchor,
            is_recurring: self.is_recurring,
            recurrence: self.recurrence.as_ref().map(|record| record.to_rule(tz)),
            notifications,
            status: self.status,
            owner_id: self.owner_id.clone(),
            assignees: self.assignees.clone(),
            created_at: parse_instant(self.created_at.as_ref(), tz),
            updated_at: parse_instant(self.updated_at.as_ref(), tz),
        }
    }

    /// ## Summary
    /// Builds the stored shape for a typed reminder.
    ///
    /// The legacy `completed` flag follows `status`. `next_notification_at`
    /// is left empty; it is derived state owned by the caller.
    #[must_use]
    pub fn from_reminder(reminder: &Reminder) -> Self {
        let notifications = reminder.notifications.as_ref();
        Self {
            id: reminder.id.clone(),
            title: reminder.title.clone(),
            description: reminder.description.clone(),
            due_date: reminder.anchor.map(|anchor| DateInput::from(anchor.date)),
            due_time: reminder
                .anchor
                .and_then(|anchor| anchor.time)
                .map(format_time_of_day),
            is_recurring: reminder.is_recurring,
            recurrence: reminder.recurrence.as_ref().map(RecurrenceRecord::from_rule),
            notifications_enabled: notifications.is_some_and(|config| config.enabled),
            notification_timings: notifications
                .map(|config| config.timings.clone())
                .unwrap_or_default(),
            status: reminder.status,
            completed: reminder.status == Status::Completed,
            owner_id: reminder.owner_id.clone(),
            assignees: reminder.assignees.clone(),
            next_notification_at: None,
            created_at: reminder.created_at.map(DateInput::from),
            updated_at: reminder.updated_at.map(DateInput::from),
        }
    }
}

impl Reminder {
    #[must_use]
    pub fn to_record(&self) -> ReminderRecord {
        ReminderRecord::from_reminder(self)
    }
}

/// ## Summary
/// Parses a JSON array of stored reminder records.
///
/// Each element is read on its own. An element that is not a record at all
/// (no `id`, a wrong field type) is logged and skipped so the rest of the
/// batch still reaches the engine.
///
/// ## Errors
/// Returns an error if the text is not a JSON array.
pub fn parse_records(json: &str) -> CoreResult<Vec<ReminderRecord>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let records = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let id = value.get("id").and_then(serde_json::Value::as_str).map(str::to_owned);
            match serde_json::from_value::<ReminderRecord>(value) {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!(index, id = ?id, %error, "skipping unreadable record");
                    None
                }
            }
        })
        .collect();
    Ok(records)
}
