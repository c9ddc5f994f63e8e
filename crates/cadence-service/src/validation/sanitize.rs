//! Reminder sanitization.
//!
//! [`sanitize`] rewrites a reminder so that [`validate`](super::validate)
//! accepts it, recording each change as a [`Correction`].

use std::collections::HashSet;

use cadence_calendar::arithmetic::day_of_week;
use cadence_core::config::ValidationConfig;
use cadence_core::constants::DEFAULT_UNTITLED_TITLE;
use cadence_core::model::{Frequency, NotificationTiming, Reminder, TimingKind};

/// One change made by [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    TitleDefaulted,
    /// The reminder lacked a rule or a due date and no longer recurs.
    RecurrenceDisabled,
    IntervalRaised,
    DaysOfWeekDropped { values: Vec<i32> },
    DaysOfWeekNormalized,
    /// A custom rule without days now repeats on the due date's weekday.
    DaysOfWeekDefaulted { day: u8 },
    DaysOfWeekCleared,
    OccurrenceCountCleared,
    EndDateCleared,
    WindowCleared,
    TimingDropped { timing: NotificationTiming },
    TimingMadeExact { timing: NotificationTiming },
    DuplicateTimingRemoved { timing: NotificationTiming },
    TimingsTruncated { removed: usize },
    AssigneesTruncated { removed: usize },
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleDefaulted => f.write_str("empty title replaced"),
            Self::RecurrenceDisabled => f.write_str("recurrence disabled"),
            Self::IntervalRaised => f.write_str("interval raised to 1"),
            Self::DaysOfWeekDropped { values } => {
                write!(f, "out-of-range days of week dropped: {values:?}")
            }
            Self::DaysOfWeekNormalized => f.write_str("days of week sorted and deduplicated"),
            Self::DaysOfWeekDefaulted { day } => write!(f, "days of week set to [{day}]"),
            Self::DaysOfWeekCleared => f.write_str("days of week cleared"),
            Self::OccurrenceCountCleared => f.write_str("occurrence count cleared"),
            Self::EndDateCleared => f.write_str("end date cleared"),
            Self::WindowCleared => f.write_str("recurrence window cleared"),
            Self::TimingDropped { timing } => write!(f, "timing {timing} dropped"),
            Self::TimingMadeExact { timing } => write!(f, "timing {timing} made exact"),
            Self::DuplicateTimingRemoved { timing } => {
                write!(f, "duplicate timing {timing} removed")
            }
            Self::TimingsTruncated { removed } => write!(f, "{removed} timings removed"),
            Self::AssigneesTruncated { removed } => write!(f, "{removed} assignees removed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub reminder: Reminder,
    pub corrections: Vec<Correction>,
}

impl Sanitized {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// ## Summary
/// Returns a corrected copy of `reminder` and the corrections applied.
///
/// The result always passes validation. Day lists come back sorted and
/// deduplicated, and exact timings carry a zero offset.
#[tracing::instrument(skip_all, fields(reminder_id = %reminder.id))]
#[must_use]
pub fn sanitize(reminder: &Reminder, config: &ValidationConfig) -> Sanitized {
    let mut fixed = reminder.clone();
    let mut corrections = Vec::new();

    if fixed.title.trim().is_empty() {
        fixed.title = if config.untitled_title.trim().is_empty() {
            DEFAULT_UNTITLED_TITLE.to_string()
        } else {
            config.untitled_title.clone()
        };
        corrections.push(Correction::TitleDefaulted);
    }

    if fixed.is_recurring && (fixed.recurrence.is_none() || fixed.anchor.is_none()) {
        fixed.is_recurring = false;
        corrections.push(Correction::RecurrenceDisabled);
    }

    sanitize_rule(&mut fixed, &mut corrections);
    sanitize_timings(&mut fixed, config, &mut corrections);

    if fixed.assignees.len() > config.max_assignees {
        let removed = fixed.assignees.len() - config.max_assignees;
        fixed.assignees.truncate(config.max_assignees);
        corrections.push(Correction::AssigneesTruncated { removed });
    }

    if !corrections.is_empty() {
        tracing::debug!(corrections = corrections.len(), "sanitized reminder");
    }
    Sanitized {
        reminder: fixed,
        corrections,
    }
}

fn sanitize_rule(reminder: &mut Reminder, corrections: &mut Vec<Correction>) {
    if !reminder.is_recurring {
        return;
    }
    let anchor = reminder.anchor;
    let Some(rule) = reminder.recurrence.as_mut() else {
        return;
    };

    if rule.interval == 0 {
        rule.interval = 1;
        corrections.push(Correction::IntervalRaised);
    }

    let (kept, dropped): (Vec<i32>, Vec<i32>) = rule
        .days_of_week
        .iter()
        .partition(|&&day| (0..=6).contains(&day));
    if !dropped.is_empty() {
        corrections.push(Correction::DaysOfWeekDropped { values: dropped });
    }
    let mut normalized = kept.clone();
    normalized.sort_unstable();
    normalized.dedup();
    if normalized != kept {
        corrections.push(Correction::DaysOfWeekNormalized);
    }
    rule.days_of_week = normalized;

    match rule.frequency {
        Frequency::Custom if rule.days_of_week.is_empty() => {
            if let Some(anchor) = anchor {
                let day = day_of_week(anchor.date);
                rule.days_of_week = vec![i32::from(day)];
                corrections.push(Correction::DaysOfWeekDefaulted { day });
            }
        }
        Frequency::CustomInterval if !rule.days_of_week.is_empty() => {
            rule.days_of_week.clear();
            corrections.push(Correction::DaysOfWeekCleared);
        }
        _ => {}
    }

    if rule.occurrence_count == Some(0) {
        rule.occurrence_count = None;
        corrections.push(Correction::OccurrenceCountCleared);
    }
    if rule.end_date.is_some() && rule.occurrence_count.is_some() {
        rule.occurrence_count = None;
        corrections.push(Correction::OccurrenceCountCleared);
    }
    let ends_too_early = match (rule.end_date, anchor) {
        (Some(end_date), Some(anchor)) => end_date <= anchor.date,
        _ => false,
    };
    if ends_too_early {
        rule.end_date = None;
        corrections.push(Correction::EndDateCleared);
    }

    if rule.window.is_some_and(|window| window.is_inverted()) {
        rule.window = None;
        corrections.push(Correction::WindowCleared);
    }
}

fn sanitize_timings(
    reminder: &mut Reminder,
    config: &ValidationConfig,
    corrections: &mut Vec<Correction>,
) {
    let Some(notifications) = reminder.notifications.as_mut() else {
        return;
    };

    let mut seen = HashSet::new();
    let mut timings = Vec::with_capacity(notifications.timings.len());
    for &timing in &notifications.timings {
        if timing.offset_minutes < 0 {
            corrections.push(Correction::TimingDropped { timing });
            continue;
        }
        let normalized = if timing.kind == TimingKind::Exact || timing.offset_minutes == 0 {
            NotificationTiming::exact()
        } else {
            timing
        };
        if normalized != timing {
            corrections.push(Correction::TimingMadeExact { timing });
        }
        if seen.insert(normalized) {
            timings.push(normalized);
        } else {
            corrections.push(Correction::DuplicateTimingRemoved { timing });
        }
    }

    if timings.len() > config.max_notification_timings {
        let removed = timings.len() - config.max_notification_timings;
        timings.truncate(config.max_notification_timings);
        corrections.push(Correction::TimingsTruncated { removed });
    }
    notifications.timings = timings;
}
