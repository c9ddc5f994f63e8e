use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::notification::NotificationConfig;
use super::recurrence::RecurrenceRule;

/// Lifecycle state of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The date (and optional wall-clock time) seeding a reminder's series.
///
/// An anchor without a time is an all-day reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnchorInstant {
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
}

impl AnchorInstant {
    #[must_use]
    pub const fn new(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self { date, time }
    }

    #[must_use]
    pub const fn all_day(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    #[must_use]
    pub const fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }

    /// Wall-clock datetime of the anchor, placing all-day anchors at `all_day_time`.
    #[must_use]
    pub fn local(&self, all_day_time: NaiveTime) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(all_day_time))
    }
}

/// The root entity: a personal reminder or task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub anchor: Option<AnchorInstant>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reminder {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            anchor: None,
            is_recurring: false,
            recurrence: None,
            notifications: None,
            status: Status::Pending,
            owner_id: String::new(),
            assignees: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: AnchorInstant) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Attaches a rule and marks the reminder as recurring.
    #[must_use]
    pub fn repeating(mut self, rule: RecurrenceRule) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(rule);
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, notifications: NotificationConfig) -> Self {
        self.notifications = Some(notifications);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// The rule the engine should follow: present only when the reminder is
    /// flagged recurring.
    #[must_use]
    pub fn active_rule(&self) -> Option<&RecurrenceRule> {
        if self.is_recurring {
            self.recurrence.as_ref()
        } else {
            None
        }
    }

    /// Returns a copy of this reminder due at `anchor` instead.
    #[must_use]
    pub fn with_due(&self, anchor: AnchorInstant) -> Self {
        Self {
            anchor: Some(anchor),
            ..self.clone()
        }
    }
}
