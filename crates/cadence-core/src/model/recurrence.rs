use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Repetition frequency as stored on a reminder.
///
/// `Custom` repeats on explicit days of the week; `CustomInterval` repeats
/// every `interval` days and never carries days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Daily,
    Weekdays,
    Weekly,
    Monthly,
    Yearly,
    FirstMondayOfMonth,
    LastFridayOfMonth,
    Custom,
    CustomInterval,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekdays => "weekdays",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::FirstMondayOfMonth => "firstMondayOfMonth",
            Self::LastFridayOfMonth => "lastFridayOfMonth",
            Self::Custom => "custom",
            Self::CustomInterval => "customInterval",
        }
    }

    /// Frequencies that read `days_of_week`.
    #[must_use]
    pub const fn uses_days_of_week(self) -> bool {
        matches!(self, Self::Weekly | Self::Custom)
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a series stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndCondition {
    Never,
    /// Last date (inclusive) on which an occurrence may fall.
    OnDate(NaiveDate),
    /// Total number of occurrences in the series, counted from the anchor.
    AfterOccurrences(u32),
}

/// Optional date range outside of which occurrences are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceWindow {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceWindow {
    /// Returns true if the window begins after it ends.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        matches!((self.start_date, self.end_date), (Some(start), Some(end)) if start > end)
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| date >= start)
            && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Repetition policy embedded in a reminder.
///
/// The end date and occurrence count are kept as two independent fields so a
/// record that sets both can be represented and rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Days of the week, 0 = Sunday through 6 = Saturday.
    #[serde(default)]
    pub days_of_week: Vec<i32>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub occurrence_count: Option<u32>,
    #[serde(default)]
    pub window: Option<RecurrenceWindow>,
}

const fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    #[must_use]
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: default_interval(),
            days_of_week: Vec::new(),
            end_date: None,
            occurrence_count: None,
            window: None,
        }
    }

    #[must_use]
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn on_days(mut self, days: impl IntoIterator<Item = i32>) -> Self {
        self.days_of_week = days.into_iter().collect();
        self
    }

    #[must_use]
    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn times(mut self, count: u32) -> Self {
        self.occurrence_count = Some(count);
        self
    }

    #[must_use]
    pub fn within(mut self, window: RecurrenceWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// ## Summary
    /// Returns the end condition, or `None` when both an end date and an
    /// occurrence count are set.
    #[must_use]
    pub fn end_condition(&self) -> Option<EndCondition> {
        match (self.end_date, self.occurrence_count) {
            (None, None) => Some(EndCondition::Never),
            (Some(date), None) => Some(EndCondition::OnDate(date)),
            (None, Some(count)) => Some(EndCondition::AfterOccurrences(count)),
            (Some(_), Some(_)) => None,
        }
    }
}
