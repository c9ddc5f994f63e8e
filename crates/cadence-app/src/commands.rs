//! Subcommand implementations.
//!
//! Each command renders its result as text: tab-separated lines, or JSON
//! for `repair`. Logging goes to stderr.

use std::path::Path;

use cadence_calendar::timezone::TimeZoneResolver;
use cadence_core::config::Settings;
use cadence_core::record::{ReminderRecord, parse_records};
use cadence_service::audit::{RepairOutcome, audit, repair};
use cadence_service::context::{EngineLimits, EvalContext, FixedClock, SystemClock};
use cadence_service::generator::{GenerateOptions, generate_with};
use cadence_service::notification::next_notification;
use cadence_service::rrule_export::reminder_rrule;
use cadence_service::schedule::Schedule;
use cadence_service::validation::validate;
use chrono::{DateTime, Utc};

use crate::cli::{Command, Invocation};
use crate::error::{AppError, AppResult};

/// Settings plus the evaluation context every command runs under.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub ctx: EvalContext,
}

impl Session {
    /// ## Summary
    /// Resolves the zone and captures "now" once for the whole run.
    ///
    /// ## Errors
    /// Returns an error if the zone is unknown or the engine settings are invalid.
    pub fn new(
        settings: Settings,
        timezone: Option<&str>,
        now: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        let zone = timezone.unwrap_or(&settings.timezone.default);
        let tz = TimeZoneResolver::new().resolve(zone)?;
        let limits = EngineLimits::from_settings(&settings)?;
        let ctx = match now {
            Some(now) => EvalContext::capture(&FixedClock(now), tz, limits),
            None => EvalContext::capture(&SystemClock, tz, limits),
        };
        tracing::debug!(tz = %ctx.tz, now = %ctx.now, "session started");
        Ok(Self { settings, ctx })
    }
}

/// ## Summary
/// Reads a JSON array of stored reminder records.
///
/// ## Errors
/// Returns an error if the file cannot be read or is not a record array.
pub fn read_records(path: &Path) -> AppResult<Vec<ReminderRecord>> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadInput {
        path: path.display().to_string(),
        source,
    })?;
    let records = parse_records(&text)?;
    tracing::info!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

/// ## Summary
/// Runs a parsed invocation end to end and returns its output.
///
/// ## Errors
/// Returns an error if the session cannot be set up, the input cannot be
/// read or the output cannot be rendered.
pub fn run(invocation: &Invocation, settings: Settings) -> AppResult<String> {
    let session = Session::new(settings, invocation.timezone.as_deref(), invocation.now)?;
    let records = read_records(invocation.command.input())?;
    execute(&invocation.command, &records, &session)
}

/// ## Summary
/// Runs `command` over already loaded records.
///
/// ## Errors
/// Returns an error only if the `repair` output cannot be serialized.
#[tracing::instrument(skip(records, session), fields(records = records.len()))]
pub fn execute(
    command: &Command,
    records: &[ReminderRecord],
    session: &Session,
) -> AppResult<String> {
    let lines = match command {
        Command::Preview { count, .. } => preview(records, *count, session),
        Command::Next(_) => next(records, session),
        Command::Validate(_) => validate_all(records, session),
        Command::Audit(_) => audit_all(records, session),
        Command::Repair(_) => return repair_all(records, session),
        Command::Rrule(_) => export_all(records, session),
    };
    Ok(lines.join("\n"))
}

fn preview(records: &[ReminderRecord], count: Option<usize>, session: &Session) -> Vec<String> {
    let mut options = GenerateOptions::from_settings(&session.settings);
    if let Some(count) = count {
        options = options.with_max(count);
    }

    let mut lines = Vec::new();
    for record in records {
        let reminder = record.to_reminder(session.ctx.tz);
        let occurrences = generate_with(&reminder, &options, &session.ctx);
        if occurrences.is_empty() {
            lines.push(format!("{}\t-\tno upcoming occurrences", record.id));
        }
        lines.extend(occurrences.iter().map(|occurrence| {
            format!(
                "{}\t{}\t{}\t{}",
                record.id,
                occurrence.position,
                occurrence.instant.to_rfc3339(),
                reminder.title
            )
        }));
    }
    lines
}

fn next(records: &[ReminderRecord], session: &Session) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let reminder = record.to_reminder(session.ctx.tz);
            match next_notification(&reminder, &session.ctx) {
                Some(next) => format!(
                    "{}\t{}\t{}\t{}",
                    record.id,
                    next.at.to_rfc3339(),
                    next.timing,
                    next.occurrence.date
                ),
                None => format!("{}\t-\tno upcoming notification", record.id),
            }
        })
        .collect()
}

fn validate_all(records: &[ReminderRecord], session: &Session) -> Vec<String> {
    let mut lines = Vec::new();
    for record in records {
        let reminder = record.to_reminder(session.ctx.tz);
        let report = validate(&reminder, &session.settings.validation, &session.ctx);
        if report.errors.is_empty() && report.warnings.is_empty() {
            lines.push(format!("{}\tok", record.id));
            continue;
        }
        lines.extend(report.errors.iter().map(|issue| format!("{}\terror\t{issue}", record.id)));
        lines.extend(
            report
                .warnings
                .iter()
                .map(|issue| format!("{}\twarning\t{issue}", record.id)),
        );
    }
    lines
}

fn audit_all(records: &[ReminderRecord], session: &Session) -> Vec<String> {
    let report = audit(records, &session.ctx);
    let mut lines = vec![format!("scanned {} records", report.scanned)];
    if report.is_clean() {
        lines.push("no issues found".to_string());
    }
    lines.extend(
        report
            .findings
            .iter()
            .map(|finding| format!("{}\t{}", finding.issue, finding.affected_ids.join(","))),
    );
    lines
}

fn repair_all(records: &[ReminderRecord], session: &Session) -> AppResult<String> {
    let repaired: Vec<ReminderRecord> = records
        .iter()
        .map(|record| match repair(record, &session.settings.validation, &session.ctx) {
            RepairOutcome::Repaired { record: fixed, actions } => {
                for action in &actions {
                    tracing::info!(reminder_id = %record.id, %action, "repaired");
                }
                *fixed
            }
            RepairOutcome::Unchanged => record.clone(),
            RepairOutcome::Rejected { errors } => {
                tracing::warn!(
                    reminder_id = %record.id,
                    errors = errors.len(),
                    "repair rejected, record kept as stored"
                );
                record.clone()
            }
        })
        .collect();
    Ok(serde_json::to_string_pretty(&repaired)?)
}

fn export_all(records: &[ReminderRecord], session: &Session) -> Vec<String> {
    let mut lines = Vec::new();
    for record in records {
        let reminder = record.to_reminder(session.ctx.tz);
        let Some(rule) = reminder.active_rule() else {
            continue;
        };
        let description = Schedule::compile(rule)
            .map_or_else(|error| format!("invalid rule: {error}"), |schedule| schedule.to_string());
        match reminder_rrule(&reminder, &session.ctx) {
            Ok(text) => {
                lines.push(format!("# {}: {description}", record.id));
                lines.push(text);
            }
            Err(error) => lines.push(format!("# {}: not exportable ({error})", record.id)),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Records;
    use chrono::TimeZone;

    const RECORDS: &str = r#"[
        {"id":"gym","title":"Gym","dueDate":"2024-01-15","dueTime":"18:00",
         "isRecurring":true,"recurrence":{"pattern":"custom","daysOfWeek":[1,4]},
         "notificationsEnabled":true,
         "notificationTimings":[{"kind":"before","offsetMinutes":30}]},
        {"id":"tax","title":"File taxes","dueDate":"2024-04-15"},
        {"id":"bad","title":"","isRecurring":true,"status":"completed"}
    ]"#;

    fn session() -> Session {
        let now = Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap();
        Session::new(Settings::default(), Some("UTC"), Some(now)).unwrap()
    }

    fn records() -> Records {
        Records {
            input: "reminders.json".into(),
        }
    }

    fn run_command(command: &Command) -> String {
        let records = parse_records(RECORDS).unwrap();
        execute(command, &records, &session()).unwrap()
    }

    #[test_log::test]
    fn test_preview_lists_positions() {
        let output = run_command(&Command::Preview {
            records: records(),
            count: Some(2),
        });
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            [
                "gym\t0\t2024-01-18T18:00:00+00:00\tGym",
                "gym\t1\t2024-01-22T18:00:00+00:00\tGym",
                "tax\t0\t2024-04-15T09:00:00+00:00\tFile taxes",
                "bad\t-\tno upcoming occurrences",
            ]
        );
    }

    #[test_log::test]
    fn test_next_notification_lines() {
        let output = run_command(&Command::Next(records()));
        let first = output.lines().next().unwrap();
        assert_eq!(first, "gym\t2024-01-18T17:30:00+00:00\tbefore 30m\t2024-01-18");
        assert!(output.contains("tax\t-\tno upcoming notification"));
    }

    #[test_log::test]
    fn test_validate_and_audit() {
        let output = run_command(&Command::Validate(records()));
        assert!(output.contains("tax\tok"));
        assert!(output.contains("bad\terror\ttitle: "));

        let output = run_command(&Command::Audit(records()));
        assert!(output.starts_with("scanned 3 records"));
        assert!(output.contains("recurring-without-rule\tbad"));
        assert!(output.contains("completed-flag-mismatch\tbad"));
    }

    #[test_log::test]
    fn test_repair_outputs_records() {
        let output = run_command(&Command::Repair(records()));
        let repaired: Vec<ReminderRecord> = serde_json::from_str(&output).unwrap();
        assert_eq!(repaired.len(), 3);
        assert!(repaired[2].completed);
        assert!(!repaired[2].is_recurring);
    }

    #[test_log::test]
    fn test_rrule_skips_one_off_reminders() {
        let output = run_command(&Command::Rrule(records()));
        assert_eq!(
            output,
            "# gym: every week on Mon, Thu\n\
             DTSTART:20240115T180000Z\n\
             RRULE:FREQ=WEEKLY;INTERVAL=1;WKST=SU;BYDAY=MO,TH"
        );
    }

    #[test_log::test]
    fn test_unknown_zone_is_rejected() {
        let result = Session::new(Settings::default(), Some("Mars/Olympus_Mons"), None);
        assert!(matches!(result, Err(AppError::CalendarError(_))));
    }
}
