// Shared occurrence cases. The including module brings `EvalContext`,
// `generate` and `reminder_rrule` into scope.

use cadence_core::model::{
    AnchorInstant, Frequency, RecurrenceRule, RecurrenceWindow, Reminder,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

pub struct OccurrenceCase {
    pub name: &'static str,
    pub rule: RecurrenceRule,
    /// `YYYY-MM-DD` for all-day reminders, `YYYY-MM-DDTHH:MM` otherwise.
    pub anchor: &'static str,
    pub tz: Tz,
    pub now: &'static str,
    pub max: usize,
    pub expected: &'static [&'static str],
    /// Compare against the `rrule` crate's expansion of the exported rule.
    pub cross_check: bool,
}

fn case_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn parse_anchor(text: &str) -> AnchorInstant {
    if let Ok(local) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return AnchorInstant::at(local.date(), local.time());
    }
    AnchorInstant::all_day(NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap())
}

fn parse_utc(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

#[expect(clippy::too_many_lines)]
pub fn occurrence_cases() -> Vec<OccurrenceCase> {
    vec![
        OccurrenceCase {
            name: "daily_every_three_days",
            rule: RecurrenceRule::new(Frequency::Daily).every(3),
            anchor: "2024-01-01T08:00",
            tz: Tz::UTC,
            now: "2024-01-10T12:00:00Z",
            max: 4,
            expected: &[
                "2024-01-10T08:00:00Z",
                "2024-01-13T08:00:00Z",
                "2024-01-16T08:00:00Z",
                "2024-01-19T08:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "weekdays_skip_weekend",
            rule: RecurrenceRule::new(Frequency::Weekdays),
            anchor: "2024-01-05T09:00",
            tz: Tz::UTC,
            now: "2024-01-06T10:00:00Z",
            max: 3,
            expected: &[
                "2024-01-08T09:00:00Z",
                "2024-01-09T09:00:00Z",
                "2024-01-10T09:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "biweekly_on_anchor_weekday",
            rule: RecurrenceRule::new(Frequency::Weekly).every(2),
            anchor: "2024-01-03T18:30",
            tz: Tz::Europe__Berlin,
            now: "2024-01-20T00:00:00Z",
            max: 3,
            expected: &[
                "2024-01-31T17:30:00Z",
                "2024-02-14T17:30:00Z",
                "2024-02-28T17:30:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "custom_days_every_other_week",
            rule: RecurrenceRule::new(Frequency::Custom).on_days([1, 5]).every(2),
            anchor: "2024-01-02T07:00",
            tz: Tz::UTC,
            now: "2024-01-02T00:00:00Z",
            max: 4,
            expected: &[
                "2024-01-05T07:00:00Z",
                "2024-01-15T07:00:00Z",
                "2024-01-19T07:00:00Z",
                "2024-01-29T07:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "monthly_clamps_month_end",
            rule: RecurrenceRule::new(Frequency::Monthly),
            anchor: "2024-01-31",
            tz: Tz::UTC,
            now: "2024-01-01T00:00:00Z",
            max: 4,
            expected: &[
                "2024-01-31T09:00:00Z",
                "2024-02-29T09:00:00Z",
                "2024-03-31T09:00:00Z",
                "2024-04-30T09:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "yearly_from_leap_day",
            rule: RecurrenceRule::new(Frequency::Yearly),
            anchor: "2024-02-29T10:00",
            tz: Tz::UTC,
            now: "2024-03-01T00:00:00Z",
            max: 3,
            expected: &[
                "2025-02-28T10:00:00Z",
                "2026-02-28T10:00:00Z",
                "2027-02-28T10:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "first_monday_after_passed_one",
            rule: RecurrenceRule::new(Frequency::FirstMondayOfMonth),
            anchor: "2024-01-02T09:00",
            tz: Tz::UTC,
            now: "2024-01-02T00:00:00Z",
            max: 3,
            expected: &[
                "2024-02-05T09:00:00Z",
                "2024-03-04T09:00:00Z",
                "2024-04-01T09:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "last_friday_every_two_months",
            rule: RecurrenceRule::new(Frequency::LastFridayOfMonth).every(2),
            anchor: "2024-01-10T17:00",
            tz: Tz::UTC,
            now: "2024-01-10T00:00:00Z",
            max: 3,
            expected: &[
                "2024-01-26T17:00:00Z",
                "2024-03-29T17:00:00Z",
                "2024-05-31T17:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "count_runs_from_anchor",
            rule: RecurrenceRule::new(Frequency::Weekly).times(4),
            anchor: "2024-01-01T09:00",
            tz: Tz::UTC,
            now: "2024-01-10T00:00:00Z",
            max: 10,
            expected: &["2024-01-15T09:00:00Z", "2024-01-22T09:00:00Z"],
            cross_check: true,
        },
        OccurrenceCase {
            name: "end_date_is_inclusive",
            rule: RecurrenceRule::new(Frequency::Daily).until(case_date(2024, 1, 12)),
            anchor: "2024-01-01T20:00",
            tz: Tz::America__New_York,
            now: "2024-01-10T12:00:00Z",
            max: 10,
            expected: &[
                "2024-01-11T01:00:00Z",
                "2024-01-12T01:00:00Z",
                "2024-01-13T01:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "daily_across_spring_forward",
            rule: RecurrenceRule::new(Frequency::Daily),
            anchor: "2024-03-08T09:00",
            tz: Tz::America__New_York,
            now: "2024-03-08T00:00:00Z",
            max: 4,
            expected: &[
                "2024-03-08T14:00:00Z",
                "2024-03-09T14:00:00Z",
                "2024-03-10T13:00:00Z",
                "2024-03-11T13:00:00Z",
            ],
            cross_check: true,
        },
        OccurrenceCase {
            name: "window_bounds_daily_series",
            rule: RecurrenceRule::new(Frequency::Daily).within(RecurrenceWindow {
                start_date: Some(case_date(2024, 2, 1)),
                end_date: Some(case_date(2024, 2, 3)),
            }),
            anchor: "2024-01-01T09:00",
            tz: Tz::UTC,
            now: "2024-01-15T00:00:00Z",
            max: 10,
            expected: &[
                "2024-02-01T09:00:00Z",
                "2024-02-02T09:00:00Z",
                "2024-02-03T09:00:00Z",
            ],
            cross_check: false,
        },
        OccurrenceCase {
            name: "custom_interval_all_day_tokyo",
            rule: RecurrenceRule::new(Frequency::CustomInterval).every(10),
            anchor: "2024-01-01",
            tz: Tz::Asia__Tokyo,
            now: "2024-01-25T00:00:00Z",
            max: 2,
            expected: &["2024-01-31T00:00:00Z", "2024-02-10T00:00:00Z"],
            cross_check: true,
        },
    ]
}

pub fn assert_case(case: &OccurrenceCase) {
    let ctx = EvalContext::at(parse_utc(case.now), case.tz);
    let reminder = Reminder::new(case.name, case.name)
        .with_anchor(parse_anchor(case.anchor))
        .repeating(case.rule.clone());

    let actual: Vec<DateTime<Utc>> = generate(&reminder, case.max, &ctx)
        .iter()
        .map(|occurrence| occurrence.instant.with_timezone(&Utc))
        .collect();
    let expected: Vec<DateTime<Utc>> = case.expected.iter().map(|text| parse_utc(text)).collect();
    assert_eq!(actual, expected, "case {} generated", case.name);

    if !case.cross_check {
        return;
    }
    let text = reminder_rrule(&reminder, &ctx)
        .unwrap_or_else(|err| panic!("case {} failed to export: {err}", case.name));
    let set: RRuleSet = text
        .parse()
        .unwrap_or_else(|err| panic!("case {} exported invalid RRULE {text:?}: {err}", case.name));
    let today = ctx.today();
    let exported: Vec<DateTime<Utc>> = set
        .all(u16::MAX)
        .dates
        .iter()
        .filter(|date| date.with_timezone(&case.tz).date_naive() >= today)
        .take(case.max)
        .map(|date| date.with_timezone(&Utc))
        .collect();
    assert_eq!(exported, actual, "case {} disagrees with {text:?}", case.name);
}
