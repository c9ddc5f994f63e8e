use serde::{Deserialize, Serialize};

/// Direction of a notification offset relative to an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingKind {
    Before,
    Exact,
    After,
}

impl TimingKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Exact => "exact",
            Self::After => "after",
        }
    }
}

impl std::fmt::Display for TimingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relative alert time attached to every occurrence of a reminder.
///
/// `offset_minutes` is signed so that negative values coming from storage
/// survive deserialization and can be reported by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTiming {
    pub kind: TimingKind,
    #[serde(default)]
    pub offset_minutes: i64,
}

impl NotificationTiming {
    #[must_use]
    pub const fn before(minutes: i64) -> Self {
        Self {
            kind: TimingKind::Before,
            offset_minutes: minutes,
        }
    }

    #[must_use]
    pub const fn after(minutes: i64) -> Self {
        Self {
            kind: TimingKind::After,
            offset_minutes: minutes,
        }
    }

    #[must_use]
    pub const fn exact() -> Self {
        Self {
            kind: TimingKind::Exact,
            offset_minutes: 0,
        }
    }

    /// ## Summary
    /// Signed shift from the occurrence instant, or `None` if the offset does
    /// not fit in a `TimeDelta`.
    #[must_use]
    pub fn shift(&self) -> Option<chrono::TimeDelta> {
        let minutes = match self.kind {
            TimingKind::Before => self.offset_minutes.checked_neg()?,
            TimingKind::After => self.offset_minutes,
            TimingKind::Exact => 0,
        };
        chrono::TimeDelta::try_minutes(minutes)
    }
}

impl std::fmt::Display for NotificationTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TimingKind::Exact => f.write_str("exact"),
            kind => write!(f, "{kind} {}m", self.offset_minutes),
        }
    }
}

/// Ordered notification timings plus the on/off toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub timings: Vec<NotificationTiming>,
}

const fn default_enabled() -> bool {
    true
}

impl NotificationConfig {
    #[must_use]
    pub fn new(timings: impl IntoIterator<Item = NotificationTiming>) -> Self {
        Self {
            enabled: true,
            timings: timings.into_iter().collect(),
        }
    }

    /// Returns true if notifications are on and at least one timing exists.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.timings.is_empty()
    }
}
