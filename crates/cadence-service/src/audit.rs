//! Consistency auditing and repair of stored reminder records.
//!
//! [`audit`] is read-only: it re-derives what each record should look like
//! and reports where the stored state disagrees. [`repair`] is the explicit
//! write path that reconciles a single record.

use std::collections::BTreeMap;

use cadence_core::config::ValidationConfig;
use cadence_core::date::DateInput;
use cadence_core::model::Status;
use cadence_core::record::ReminderRecord;
use chrono_tz::Tz;
use serde::Serialize;

use crate::context::EvalContext;
use crate::generator::generate;
use crate::notification::next_notification;
use crate::schedule::Schedule;
use crate::validation::{Correction, ErrorKind, ValidationIssue, sanitize, validate};

/// Kinds of inconsistency the auditor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    RecurringWithoutRule,
    NotificationsWithoutTimings,
    CompletedFlagMismatch,
    UnparseableDueDate,
    UnparseableStartDate,
    UnparseableEndDate,
    /// Pending and recurring, but no occurrence is left.
    ExhaustedRecurrence,
    /// The stored next notification time differs from the derived one.
    NotificationDrift,
}

impl IssueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecurringWithoutRule => "recurring-without-rule",
            Self::NotificationsWithoutTimings => "notifications-without-timings",
            Self::CompletedFlagMismatch => "completed-flag-mismatch",
            Self::UnparseableDueDate => "unparseable-due-date",
            Self::UnparseableStartDate => "unparseable-start-date",
            Self::UnparseableEndDate => "unparseable-end-date",
            Self::ExhaustedRecurrence => "exhausted-recurrence",
            Self::NotificationDrift => "notification-drift",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFinding {
    pub issue: IssueKind,
    pub affected_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// One entry per issue kind found, in `IssueKind` order.
    pub findings: Vec<AuditFinding>,
    pub scanned: usize,
}

impl AuditReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    #[must_use]
    pub fn affected(&self, issue: IssueKind) -> &[String] {
        self.findings
            .iter()
            .find(|finding| finding.issue == issue)
            .map_or(&[], |finding| finding.affected_ids.as_slice())
    }
}

/// ## Summary
/// Scans stored records for inconsistencies.
#[tracing::instrument(skip_all, fields(records = records.len()))]
#[must_use]
pub fn audit(records: &[ReminderRecord], ctx: &EvalContext) -> AuditReport {
    let mut grouped: BTreeMap<IssueKind, Vec<String>> = BTreeMap::new();

    for record in records {
        for issue in record_issues(record, ctx) {
            grouped.entry(issue).or_default().push(record.id.clone());
        }
    }

    let findings: Vec<AuditFinding> = grouped
        .into_iter()
        .map(|(issue, affected_ids)| AuditFinding {
            issue,
            affected_ids,
        })
        .collect();
    tracing::debug!(findings = findings.len(), "audit finished");

    AuditReport {
        findings,
        scanned: records.len(),
    }
}

fn unparseable(input: Option<&DateInput>) -> bool {
    input.is_some_and(|value| !value.is_parseable())
}

fn record_issues(record: &ReminderRecord, ctx: &EvalContext) -> Vec<IssueKind> {
    let mut issues = Vec::new();

    if record.is_recurring && record.recurrence.is_none() {
        issues.push(IssueKind::RecurringWithoutRule);
    }
    if record.notifications_enabled && record.notification_timings.is_empty() {
        issues.push(IssueKind::NotificationsWithoutTimings);
    }
    if (record.status == Status::Completed) != record.completed {
        issues.push(IssueKind::CompletedFlagMismatch);
    }

    if unparseable(record.due_date.as_ref()) {
        issues.push(IssueKind::UnparseableDueDate);
    }
    if let Some(recurrence) = &record.recurrence {
        if unparseable(recurrence.start_date.as_ref()) {
            issues.push(IssueKind::UnparseableStartDate);
        }
        if unparseable(recurrence.end_date.as_ref()) || unparseable(recurrence.window_end.as_ref())
        {
            issues.push(IssueKind::UnparseableEndDate);
        }
    }

    let reminder = record.to_reminder(ctx.tz);
    let compiles = reminder
        .active_rule()
        .is_some_and(|rule| Schedule::compile(rule).is_ok());
    if compiles
        && reminder.status == Status::Pending
        && reminder.anchor.is_some()
        && generate(&reminder, 1, ctx).is_empty()
    {
        issues.push(IssueKind::ExhaustedRecurrence);
    }

    if record.notifications_enabled {
        let stored = stored_next_notification(record, ctx.tz);
        let derived = next_notification(&reminder, ctx).map(|next| next.at.timestamp_millis());
        if stored.is_some() && stored != derived {
            issues.push(IssueKind::NotificationDrift);
        }
    }

    issues
}

fn stored_next_notification(record: &ReminderRecord, tz: Tz) -> Option<i64> {
    record
        .next_notification_at
        .as_ref()
        .and_then(|value| value.to_instant(tz))
        .map(|instant| instant.timestamp_millis())
}

/// A change made by [`repair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    /// The legacy completed flag now follows the status.
    StatusReconciled,
    NotificationsDisabled,
    NextNotificationRefreshed,
    UnparseableDateCleared { field: &'static str },
    Sanitized(Correction),
}

impl std::fmt::Display for RepairAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatusReconciled => f.write_str("completed flag reconciled with status"),
            Self::NotificationsDisabled => f.write_str("notifications disabled, no timings"),
            Self::NextNotificationRefreshed => f.write_str("next notification time refreshed"),
            Self::UnparseableDateCleared { field } => write!(f, "unparseable {field} cleared"),
            Self::Sanitized(correction) => write!(f, "{correction}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    Repaired {
        record: Box<ReminderRecord>,
        actions: Vec<RepairAction>,
    },
    Unchanged,
    /// Even the sanitized record does not validate.
    Rejected {
        errors: Vec<ValidationIssue<ErrorKind>>,
    },
}

/// ## Summary
/// Reconciles one stored record.
///
/// Status wins over the legacy completed flag, unparseable dates are
/// dropped, the reminder is sanitized, notifications without timings are
/// switched off and the stored next notification time is recomputed. The
/// corrected record is returned only if it validates.
#[tracing::instrument(skip_all, fields(reminder_id = %record.id))]
#[must_use]
pub fn repair(
    record: &ReminderRecord,
    config: &ValidationConfig,
    ctx: &EvalContext,
) -> RepairOutcome {
    let mut actions = Vec::new();

    let dated_fields = [
        ("dueDate", record.due_date.as_ref()),
        (
            "recurrence.startDate",
            record.recurrence.as_ref().and_then(|r| r.start_date.as_ref()),
        ),
        (
            "recurrence.endDate",
            record.recurrence.as_ref().and_then(|r| r.end_date.as_ref()),
        ),
        (
            "recurrence.windowEnd",
            record.recurrence.as_ref().and_then(|r| r.window_end.as_ref()),
        ),
    ];
    for (field, value) in dated_fields {
        if unparseable(value) {
            actions.push(RepairAction::UnparseableDateCleared { field });
        }
    }

    if (record.status == Status::Completed) != record.completed {
        actions.push(RepairAction::StatusReconciled);
    }

    let sanitized = sanitize(&record.to_reminder(ctx.tz), config);
    let report = validate(&sanitized.reminder, config, ctx);
    if !report.is_valid() {
        tracing::warn!(errors = report.errors.len(), "record rejected by validation");
        return RepairOutcome::Rejected {
            errors: report.errors,
        };
    }
    actions.extend(sanitized.corrections.into_iter().map(RepairAction::Sanitized));

    let mut repaired = sanitized.reminder.to_record();
    repaired.created_at.clone_from(&record.created_at);
    repaired.updated_at.clone_from(&record.updated_at);

    if repaired.notifications_enabled && repaired.notification_timings.is_empty() {
        repaired.notifications_enabled = false;
        actions.push(RepairAction::NotificationsDisabled);
    }

    let derived = if repaired.notifications_enabled {
        next_notification(&sanitized.reminder, ctx).map(|next| next.at.to_utc())
    } else {
        None
    };
    let stored = stored_next_notification(record, ctx.tz);
    if stored == derived.map(|at| at.timestamp_millis()) {
        repaired.next_notification_at.clone_from(&record.next_notification_at);
    } else {
        repaired.next_notification_at = derived.map(DateInput::from);
        actions.push(RepairAction::NextNotificationRefreshed);
    }

    if actions.is_empty() {
        return RepairOutcome::Unchanged;
    }
    tracing::info!(actions = actions.len(), "record repaired");
    RepairOutcome::Repaired {
        record: Box::new(repaired),
        actions,
    }
}
