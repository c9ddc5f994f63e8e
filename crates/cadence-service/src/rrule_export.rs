//! RFC 5545 export of compiled schedules.
//!
//! The exported `DTSTART` is the first occurrence of the series rather than
//! the stored due date, because RFC 5545 always counts `DTSTART` as an
//! occurrence even when it does not match the rule. Month-end clamping is
//! written as `BYMONTHDAY=28,..,d;BYSETPOS=-1` so calendar clients clamp the
//! way the interpreter does.
//!
//! A window start has no RRULE counterpart and is not exported. A window end
//! becomes `UNTIL` unless the series is counted.

use cadence_calendar::arithmetic::end_of_day;
use cadence_core::model::{EndCondition, Reminder};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::context::{EvalContext, Instant};
use crate::error::{ServiceError, ServiceResult};
use crate::interpreter::occurrence_at_or_after;
use crate::schedule::{Pattern, Schedule};
use crate::validation::ErrorKind;

const WEEKDAYS_BYDAY: &str = "MO,TU,WE,TH,FR";

fn byday(index: u8) -> &'static str {
    match index {
        0 => "SU",
        1 => "MO",
        2 => "TU",
        3 => "WE",
        4 => "TH",
        5 => "FR",
        _ => "SA",
    }
}

/// `BYMONTHDAY` (and `BYSETPOS`) for a day of month that must clamp.
fn month_day_rule(day: u32) -> String {
    if day <= 28 {
        format!("BYMONTHDAY={day}")
    } else {
        let days: Vec<String> = (28..=day).map(|d| d.to_string()).collect();
        format!("BYMONTHDAY={};BYSETPOS=-1", days.join(","))
    }
}

fn format_until(date: NaiveDate, tz: Tz) -> Option<String> {
    let end = end_of_day(date, tz)?;
    Some(end.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string())
}

fn format_dtstart(first: &Instant) -> String {
    if first.timezone() == Tz::UTC {
        format!("DTSTART:{}", first.format("%Y%m%dT%H%M%SZ"))
    } else {
        format!(
            "DTSTART;TZID={}:{}",
            first.timezone().name(),
            first.naive_local().format("%Y%m%dT%H%M%S")
        )
    }
}

/// ## Summary
/// Builds the `RRULE` value (without the `RRULE:` prefix) for a series
/// whose first occurrence falls on `first`.
#[must_use]
pub fn rrule_body(schedule: &Schedule, first: NaiveDate, tz: Tz) -> String {
    let interval = schedule.interval.get();
    let mut body = match schedule.pattern {
        Pattern::Daily | Pattern::CustomInterval => format!("FREQ=DAILY;INTERVAL={interval}"),
        Pattern::Weekdays => format!("FREQ=WEEKLY;BYDAY={WEEKDAYS_BYDAY}"),
        Pattern::Weekly { days: None } => format!("FREQ=WEEKLY;INTERVAL={interval}"),
        Pattern::Weekly { days: Some(days) } | Pattern::CustomDays { days } => {
            let byday: Vec<&str> = days.indices().into_iter().map(byday).collect();
            format!(
                "FREQ=WEEKLY;INTERVAL={interval};WKST=SU;BYDAY={}",
                byday.join(",")
            )
        }
        Pattern::Monthly => format!(
            "FREQ=MONTHLY;INTERVAL={interval};{}",
            month_day_rule(first.day())
        ),
        Pattern::Yearly => format!(
            "FREQ=YEARLY;INTERVAL={interval};BYMONTH={};{}",
            first.month(),
            month_day_rule(first.day())
        ),
        Pattern::FirstMondayOfMonth => format!("FREQ=MONTHLY;INTERVAL={interval};BYDAY=1MO"),
        Pattern::LastFridayOfMonth => format!("FREQ=MONTHLY;INTERVAL={interval};BYDAY=-1FR"),
    };

    let window_end = schedule.window.and_then(|window| window.end_date);
    let until = match schedule.end {
        EndCondition::AfterOccurrences(count) => {
            body.push_str(&format!(";COUNT={count}"));
            None
        }
        EndCondition::OnDate(end) => Some(window_end.map_or(end, |window_end| end.min(window_end))),
        EndCondition::Never => window_end,
    };
    // An end at the last representable date is no bound at all
    if let Some(until) = until.and_then(|until| format_until(until, tz)) {
        body.push_str(";UNTIL=");
        body.push_str(&until);
    }
    body
}

/// ## Summary
/// Renders a schedule as `DTSTART` and `RRULE` lines.
///
/// ## Errors
/// Returns `ServiceError::EmptySeries` if the series has no occurrence at
/// or after `anchor`, or ends before its first occurrence.
#[tracing::instrument(skip(schedule, ctx), fields(pattern = ?schedule.pattern))]
pub fn to_rrule_text(
    schedule: &Schedule,
    anchor: NaiveDateTime,
    ctx: &EvalContext,
) -> ServiceResult<String> {
    let start = cadence_calendar::timezone::localize(anchor, ctx.tz);
    let first =
        occurrence_at_or_after(schedule, anchor, start, ctx).ok_or(ServiceError::EmptySeries)?;
    let first_date = first.date_naive();

    let ends_before_first = match schedule.end {
        EndCondition::OnDate(end) => end < first_date,
        _ => false,
    };
    let window_ends_before_first = schedule
        .window
        .and_then(|window| window.end_date)
        .is_some_and(|end| end < first_date);
    if ends_before_first || window_ends_before_first {
        return Err(ServiceError::EmptySeries);
    }

    let text = format!(
        "{}\nRRULE:{}",
        format_dtstart(&first),
        rrule_body(schedule, first_date, ctx.tz)
    );
    tracing::trace!(rrule = %text, "exported schedule");
    Ok(text)
}

/// ## Summary
/// Exports a schedule and parses the result back into an `RRuleSet`.
///
/// ## Errors
/// Returns the errors of [`to_rrule_text`], or `ServiceError::RRuleError`
/// if the `rrule` crate rejects the generated text.
pub fn to_rrule(
    schedule: &Schedule,
    anchor: NaiveDateTime,
    ctx: &EvalContext,
) -> ServiceResult<RRuleSet> {
    let text = to_rrule_text(schedule, anchor, ctx)?;
    text.parse::<RRuleSet>()
        .map_err(|err| ServiceError::RRuleError(err.to_string()))
}

/// ## Summary
/// Exports the recurrence of a stored reminder.
///
/// ## Errors
/// Returns `ServiceError::InvalidRule` when the reminder does not recur, has
/// no due date or its rule does not compile, and the errors of
/// [`to_rrule_text`] otherwise.
pub fn reminder_rrule(reminder: &Reminder, ctx: &EvalContext) -> ServiceResult<String> {
    let rule = reminder
        .active_rule()
        .ok_or(ErrorKind::MissingRecurrenceRule)?;
    let anchor = reminder.anchor.ok_or(ErrorKind::MissingAnchor)?;
    let schedule = Schedule::compile(rule)?;
    to_rrule_text(&schedule, anchor.local(ctx.limits.all_day_time), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::model::{Frequency, RecurrenceRule, RecurrenceWindow};
    use chrono::{NaiveTime, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    fn ctx(tz: Tz) -> EvalContext {
        EvalContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), tz)
    }

    fn export(rule: &RecurrenceRule, anchor: NaiveDateTime, tz: Tz) -> String {
        let schedule = Schedule::compile(rule).unwrap();
        to_rrule_text(&schedule, anchor, &ctx(tz)).unwrap()
    }

    #[test]
    fn test_month_day_rule_clamps_late_days() {
        assert_eq!(month_day_rule(15), "BYMONTHDAY=15");
        assert_eq!(month_day_rule(28), "BYMONTHDAY=28");
        assert_eq!(month_day_rule(31), "BYMONTHDAY=28,29,30,31;BYSETPOS=-1");
    }

    #[test]
    fn test_export_utc_daily_count() {
        let text = export(
            &RecurrenceRule::new(Frequency::Daily).every(2).times(5),
            at(2024, 1, 15, 9, 0),
            Tz::UTC,
        );
        assert_eq!(
            text,
            "DTSTART:20240115T090000Z\nRRULE:FREQ=DAILY;INTERVAL=2;COUNT=5"
        );
    }

    #[test]
    fn test_export_zoned_weekly_until() {
        let text = export(
            &RecurrenceRule::new(Frequency::Custom)
                .on_days([1, 3])
                .every(2)
                .until(date(2024, 3, 31)),
            at(2024, 1, 16, 7, 30),
            Tz::America__New_York,
        );
        // First occurrence after Tuesday the 16th is Wednesday the 17th;
        // end of Mar 31 in New York (EDT) is 03:59:59 UTC on Apr 1
        assert_eq!(
            text,
            "DTSTART;TZID=America/New_York:20240117T073000\n\
             RRULE:FREQ=WEEKLY;INTERVAL=2;WKST=SU;BYDAY=MO,WE;UNTIL=20240401T035959Z"
        );
    }

    #[test]
    fn test_export_nth_weekday_and_leap_day() {
        let text = export(
            &RecurrenceRule::new(Frequency::LastFridayOfMonth),
            at(2024, 1, 2, 9, 0),
            Tz::UTC,
        );
        assert_eq!(
            text,
            "DTSTART:20240126T090000Z\nRRULE:FREQ=MONTHLY;INTERVAL=1;BYDAY=-1FR"
        );

        let text = export(
            &RecurrenceRule::new(Frequency::Yearly),
            at(2024, 2, 29, 9, 0),
            Tz::UTC,
        );
        assert_eq!(
            text,
            "DTSTART:20240229T090000Z\n\
             RRULE:FREQ=YEARLY;INTERVAL=1;BYMONTH=2;BYMONTHDAY=28,29;BYSETPOS=-1"
        );
    }

    #[test]
    fn test_window_end_becomes_until() {
        let text = export(
            &RecurrenceRule::new(Frequency::Weekdays).within(RecurrenceWindow {
                start_date: None,
                end_date: Some(date(2024, 6, 28)),
            }),
            at(2024, 1, 15, 9, 0),
            Tz::UTC,
        );
        assert!(text.ends_with("RRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20240628T235959Z"));
    }

    #[test]
    fn test_end_at_last_representable_date_has_no_until() {
        let text = export(
            &RecurrenceRule::new(Frequency::Daily).until(NaiveDate::MAX),
            at(2024, 1, 15, 9, 0),
            Tz::UTC,
        );
        assert!(text.ends_with("RRULE:FREQ=DAILY;INTERVAL=1"), "got {text}");
    }

    #[test]
    fn test_series_ending_before_first_occurrence_is_empty() {
        let schedule =
            Schedule::compile(&RecurrenceRule::new(Frequency::FirstMondayOfMonth).until(date(2024, 1, 3)))
                .unwrap();
        // First Monday on or after Jan 2 is Feb 5
        let result = to_rrule_text(&schedule, at(2024, 1, 2, 9, 0), &ctx(Tz::UTC));
        assert!(matches!(result, Err(ServiceError::EmptySeries)));
    }

    #[test]
    fn test_reminder_rrule_requires_rule_and_anchor() {
        let reminder = Reminder::new("r-1", "One-off");
        assert!(matches!(
            reminder_rrule(&reminder, &ctx(Tz::UTC)),
            Err(ServiceError::InvalidRule(ErrorKind::MissingRecurrenceRule))
        ));

        let reminder = Reminder::new("r-2", "Floating").repeating(RecurrenceRule::new(Frequency::Daily));
        assert!(matches!(
            reminder_rrule(&reminder, &ctx(Tz::UTC)),
            Err(ServiceError::InvalidRule(ErrorKind::MissingAnchor))
        ));
    }

    #[test]
    fn test_parsed_set_matches_interpreter() {
        let schedule = Schedule::compile(&RecurrenceRule::new(Frequency::Monthly).times(4)).unwrap();
        let set = to_rrule(&schedule, at(2024, 1, 31, 9, 0), &ctx(Tz::UTC)).unwrap();
        let dates: Vec<String> = set
            .all(10)
            .dates
            .iter()
            .map(|d| d.with_timezone(&Utc).format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, ["2024-01-31", "2024-02-29", "2024-03-31", "2024-04-30"]);
    }
}
