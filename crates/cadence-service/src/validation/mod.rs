//! Structural validation of reminders.
//!
//! [`validate`] reports problems without touching its input. Blocking
//! problems are [`ErrorKind`]s; advisory ones are [`WarningKind`]s. Each
//! issue names the field it refers to using the stored (camelCase) field
//! names, e.g. `recurrence.daysOfWeek[3]` or `notifications.timings[1]`.

mod sanitize;

pub use sanitize::{Correction, Sanitized, sanitize};

use std::collections::HashSet;

use cadence_calendar::timezone::localize;
use cadence_core::config::ValidationConfig;
use cadence_core::model::{Frequency, NotificationConfig, Reminder, RecurrenceRule, TimingKind};
use thiserror::Error;

use crate::context::EvalContext;

/// Blocking validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("recurring reminder has no recurrence rule")]
    MissingRecurrenceRule,
    #[error("recurring reminder has no due date")]
    MissingAnchor,
    #[error("custom recurrence needs at least one day of the week")]
    EmptyDaysOfWeek,
    #[error("interval-only recurrence cannot list days of the week")]
    DaysOfWeekNotAllowed,
    #[error("day of week {value} is outside 0..=6")]
    DayOfWeekOutOfRange { value: i32 },
    #[error("interval must be at least 1")]
    IntervalTooSmall,
    #[error("end date must be after the due date")]
    EndDateNotAfterAnchor,
    #[error("end date and occurrence count cannot both be set")]
    ConflictingEndConditions,
    #[error("occurrence count must be at least 1")]
    OccurrenceCountTooSmall,
    #[error("recurrence window starts after it ends")]
    WindowInverted,
    #[error("notification offset {offset_minutes} is negative")]
    NegativeOffset { offset_minutes: i64 },
    #[error("before/after notification needs a non-zero offset")]
    ZeroRelativeOffset,
    #[error("duplicate notification timing")]
    DuplicateTiming,
    #[error("{count} notification timings exceed the maximum of {max}")]
    TooManyTimings { count: usize, max: usize },
    #[error("{count} assignees exceed the maximum of {max}")]
    TooManyAssignees { count: usize, max: usize },
    #[error("title is empty")]
    EmptyTitle,
}

/// Advisory warnings; a reminder with warnings is still valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum WarningKind {
    #[error("due date is in the past")]
    AnchorInPast,
    #[error("interval {interval} is unusually large")]
    LargeInterval { interval: u32 },
    #[error("notification offset of {offset_minutes} minutes is unusually large")]
    LargeOffset { offset_minutes: i64 },
    #[error("{count} notification timings is a lot")]
    ManyTimings { count: usize },
    #[error("days of the week are ignored by this frequency")]
    DaysOfWeekIgnored,
}

/// A problem tied to the field it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue<K> {
    pub field: String,
    pub kind: K,
}

impl<K> ValidationIssue<K> {
    fn new(field: impl Into<String>, kind: K) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl<K: std::fmt::Display> std::fmt::Display for ValidationIssue<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue<ErrorKind>>,
    pub warnings: Vec<ValidationIssue<WarningKind>>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if some error has the given kind.
    #[must_use]
    pub fn has_error(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|issue| issue.kind == kind)
    }

    #[must_use]
    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|issue| issue.kind == kind)
    }

    fn error(&mut self, field: impl Into<String>, kind: ErrorKind) {
        self.errors.push(ValidationIssue::new(field, kind));
    }

    fn warn(&mut self, field: impl Into<String>, kind: WarningKind) {
        self.warnings.push(ValidationIssue::new(field, kind));
    }
}

/// ## Summary
/// Validates a reminder before it is saved or fed to the generator.
///
/// The rule is only checked when the reminder is flagged recurring.
#[tracing::instrument(skip_all, fields(reminder_id = %reminder.id))]
#[must_use]
pub fn validate(
    reminder: &Reminder,
    config: &ValidationConfig,
    ctx: &EvalContext,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if reminder.title.trim().is_empty() {
        report.error("title", ErrorKind::EmptyTitle);
    }

    if reminder.is_recurring {
        if reminder.recurrence.is_none() {
            report.error("recurrence", ErrorKind::MissingRecurrenceRule);
        }
        if reminder.anchor.is_none() {
            report.error("anchor", ErrorKind::MissingAnchor);
        }
    }

    if let Some(rule) = reminder.active_rule() {
        validate_rule(rule, reminder, config, &mut report);
    }

    if let Some(anchor) = reminder.anchor {
        let due = localize(anchor.local(ctx.limits.all_day_time), ctx.tz);
        let in_past = match anchor.time {
            Some(_) => due < ctx.now,
            None => anchor.date < ctx.today(),
        };
        if in_past {
            report.warn("anchor", WarningKind::AnchorInPast);
        }
    }

    if let Some(notifications) = &reminder.notifications {
        validate_notifications(notifications, config, &mut report);
    }

    if reminder.assignees.len() > config.max_assignees {
        report.error(
            "assignees",
            ErrorKind::TooManyAssignees {
                count: reminder.assignees.len(),
                max: config.max_assignees,
            },
        );
    }

    tracing::trace!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated reminder"
    );
    report
}

fn validate_rule(
    rule: &RecurrenceRule,
    reminder: &Reminder,
    config: &ValidationConfig,
    report: &mut ValidationReport,
) {
    if rule.interval == 0 {
        report.error("recurrence.interval", ErrorKind::IntervalTooSmall);
    } else if rule.interval > config.large_interval_threshold {
        report.warn(
            "recurrence.interval",
            WarningKind::LargeInterval {
                interval: rule.interval,
            },
        );
    }

    for (index, &value) in rule.days_of_week.iter().enumerate() {
        if !(0..=6).contains(&value) {
            report.error(
                format!("recurrence.daysOfWeek[{index}]"),
                ErrorKind::DayOfWeekOutOfRange { value },
            );
        }
    }

    match rule.frequency {
        Frequency::Custom if rule.days_of_week.is_empty() => {
            report.error("recurrence.daysOfWeek", ErrorKind::EmptyDaysOfWeek);
        }
        Frequency::CustomInterval if !rule.days_of_week.is_empty() => {
            report.error("recurrence.daysOfWeek", ErrorKind::DaysOfWeekNotAllowed);
        }
        frequency if !frequency.uses_days_of_week() && !rule.days_of_week.is_empty() => {
            report.warn("recurrence.daysOfWeek", WarningKind::DaysOfWeekIgnored);
        }
        _ => {}
    }

    if rule.end_date.is_some() && rule.occurrence_count.is_some() {
        report.error("recurrence", ErrorKind::ConflictingEndConditions);
    }
    let ends_too_early = match (rule.end_date, reminder.anchor) {
        (Some(end_date), Some(anchor)) => end_date <= anchor.date,
        _ => false,
    };
    if ends_too_early {
        report.error("recurrence.endDate", ErrorKind::EndDateNotAfterAnchor);
    }
    if rule.occurrence_count == Some(0) {
        report.error(
            "recurrence.occurrenceCount",
            ErrorKind::OccurrenceCountTooSmall,
        );
    }

    if rule.window.is_some_and(|window| window.is_inverted()) {
        report.error("recurrence.window", ErrorKind::WindowInverted);
    }
}

fn validate_notifications(
    notifications: &NotificationConfig,
    config: &ValidationConfig,
    report: &mut ValidationReport,
) {
    let count = notifications.timings.len();
    if count > config.max_notification_timings {
        report.error(
            "notifications.timings",
            ErrorKind::TooManyTimings {
                count,
                max: config.max_notification_timings,
            },
        );
    } else if count > config.many_timings_threshold {
        report.warn("notifications.timings", WarningKind::ManyTimings { count });
    }

    let mut seen = HashSet::new();
    for (index, timing) in notifications.timings.iter().enumerate() {
        let field = format!("notifications.timings[{index}]");
        if timing.offset_minutes < 0 {
            report.error(
                field.clone(),
                ErrorKind::NegativeOffset {
                    offset_minutes: timing.offset_minutes,
                },
            );
        } else if timing.offset_minutes == 0 && timing.kind != TimingKind::Exact {
            report.error(field.clone(), ErrorKind::ZeroRelativeOffset);
        } else if timing.offset_minutes > config.large_offset_minutes {
            report.warn(
                field.clone(),
                WarningKind::LargeOffset {
                    offset_minutes: timing.offset_minutes,
                },
            );
        }

        if !seen.insert(*timing) {
            report.error(field, ErrorKind::DuplicateTiming);
        }
    }
}
