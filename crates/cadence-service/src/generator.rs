//! Occurrence generator.
//!
//! Drives the interpreter over a reminder's series and applies end
//! conditions, the recurrence window and the caller's maximum.

use cadence_calendar::arithmetic::start_of_day;
use cadence_calendar::timezone::localize;
use cadence_core::config::Settings;
use cadence_core::constants::DEFAULT_PREVIEW_COUNT;
use cadence_core::model::{AnchorInstant, EndCondition, Reminder, Status};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::context::{EvalContext, Instant};
use crate::interpreter::{next_occurrence_after, occurrence_at_or_after};
use crate::schedule::Schedule;

/// One concrete due instant of a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'a> {
    pub reminder: &'a Reminder,
    pub date: NaiveDate,
    /// `None` for all-day reminders.
    pub time: Option<NaiveTime>,
    pub instant: Instant,
    /// Zero-based position in the generated list.
    pub position: usize,
    pub is_next: bool,
}

impl Occurrence<'_> {
    /// Returns an owned copy of the reminder due at this occurrence.
    #[must_use]
    pub fn materialize(&self) -> Reminder {
        self.reminder
            .with_due(AnchorInstant::new(self.date, self.time))
    }
}

/// Options for [`generate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub max_occurrences: usize,
    /// Defaults to the context's "now".
    pub search_start: Option<DateTime<Utc>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_PREVIEW_COUNT,
            search_start: None,
        }
    }
}

impl GenerateOptions {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_occurrences: settings.engine.default_preview_count,
            search_start: None,
        }
    }

    #[must_use]
    pub fn with_max(mut self, max_occurrences: usize) -> Self {
        self.max_occurrences = max_occurrences;
        self
    }

    #[must_use]
    pub fn starting(mut self, search_start: DateTime<Utc>) -> Self {
        self.search_start = Some(search_start);
        self
    }
}

/// ## Summary
/// Returns up to `max_occurrences` upcoming occurrences, starting with today.
#[must_use]
pub fn generate<'a>(
    reminder: &'a Reminder,
    max_occurrences: usize,
    ctx: &EvalContext,
) -> Vec<Occurrence<'a>> {
    generate_from(reminder, max_occurrences, ctx.now, ctx)
}

#[must_use]
pub fn generate_with<'a>(
    reminder: &'a Reminder,
    options: &GenerateOptions,
    ctx: &EvalContext,
) -> Vec<Occurrence<'a>> {
    generate_from(
        reminder,
        options.max_occurrences,
        options.search_start.unwrap_or(ctx.now),
        ctx,
    )
}

/// ## Summary
/// Returns up to `max_occurrences` occurrences on or after the day containing
/// `search_start`.
///
/// Yields nothing for reminders that are not pending or have no anchor. A
/// rule that fails to compile is logged and yields nothing. The output is
/// strictly increasing and its first element is flagged `is_next`.
#[tracing::instrument(skip(reminder, ctx), fields(reminder_id = %reminder.id))]
#[must_use]
pub fn generate_from<'a>(
    reminder: &'a Reminder,
    max_occurrences: usize,
    search_start: DateTime<Utc>,
    ctx: &EvalContext,
) -> Vec<Occurrence<'a>> {
    collect_series(reminder, search_start, ctx, |_, taken| {
        taken < max_occurrences
    })
}

/// ## Summary
/// Returns the occurrences from the day containing `search_start` up to, but
/// not including, the day `before`.
///
/// Bounded by the generator iteration ceiling like every other walk.
#[tracing::instrument(skip(reminder, ctx), fields(reminder_id = %reminder.id))]
#[must_use]
pub fn generate_before<'a>(
    reminder: &'a Reminder,
    search_start: DateTime<Utc>,
    before: NaiveDate,
    ctx: &EvalContext,
) -> Vec<Occurrence<'a>> {
    collect_series(reminder, search_start, ctx, |date, _| date < before)
}

/// Collects occurrences on or after the search start day while `accept`
/// holds for the candidate's date and the number already taken.
fn collect_series<'a>(
    reminder: &'a Reminder,
    search_start: DateTime<Utc>,
    ctx: &EvalContext,
    accept: impl Fn(NaiveDate, usize) -> bool,
) -> Vec<Occurrence<'a>> {
    if reminder.status != Status::Pending {
        return Vec::new();
    }
    let Some(anchor) = reminder.anchor else {
        return Vec::new();
    };
    let cutoff = search_start.with_timezone(&ctx.tz).date_naive();

    let Some(rule) = reminder.active_rule() else {
        return anchor_occurrence(reminder, ctx)
            .filter(|occurrence| occurrence.date >= cutoff && accept(occurrence.date, 0))
            .into_iter()
            .collect();
    };

    let schedule = match Schedule::compile(rule) {
        Ok(schedule) => schedule,
        Err(error) => {
            tracing::warn!(%error, "skipping malformed recurrence rule");
            return Vec::new();
        }
    };

    let mut occurrences = Vec::new();
    walk_series(&schedule, anchor, cutoff, ctx, |instant| {
        let date = instant.date_naive();
        if !accept(date, occurrences.len()) {
            return false;
        }
        occurrences.push(Occurrence {
            reminder,
            date,
            time: anchor.time.map(|_| instant.time()),
            instant,
            position: occurrences.len(),
            is_next: occurrences.is_empty(),
        });
        true
    });
    occurrences
}

/// ## Summary
/// The anchor itself as an occurrence, ignoring any rule.
///
/// `None` for reminders that are not pending or have no anchor.
#[must_use]
pub fn anchor_occurrence<'a>(reminder: &'a Reminder, ctx: &EvalContext) -> Option<Occurrence<'a>> {
    if reminder.status != Status::Pending {
        return None;
    }
    let anchor = reminder.anchor?;
    Some(Occurrence {
        reminder,
        date: anchor.date,
        time: anchor.time,
        instant: localize(anchor.local(ctx.limits.all_day_time), ctx.tz),
        position: 0,
        is_next: true,
    })
}

/// Feeds occurrences on or after `cutoff` to `emit` until it returns false or
/// the series stops.
fn walk_series(
    schedule: &Schedule,
    anchor: AnchorInstant,
    cutoff: NaiveDate,
    ctx: &EvalContext,
    mut emit: impl FnMut(Instant) -> bool,
) {
    let anchor_local = anchor.local(ctx.limits.all_day_time);
    let window_start = schedule.window.and_then(|window| window.start_date);
    let window_end = schedule.window.and_then(|window| window.end_date);
    let first_day = window_start.map_or(cutoff, |start| start.max(cutoff));

    // Counted series are walked from the anchor so skipped occurrences count
    let counted = matches!(schedule.end, EndCondition::AfterOccurrences(_));
    let start = if counted {
        localize(anchor_local, ctx.tz)
    } else {
        start_of_day(first_day, ctx.tz)
    };
    if !counted && start_of_day(anchor.date, ctx.tz) < start {
        tracing::debug!(%first_day, "fast-forwarding past elapsed occurrences");
    }

    let mut cursor = occurrence_at_or_after(schedule, anchor_local, start, ctx);
    let mut series_index: u32 = 0;
    let mut iterations: u32 = 0;

    while let Some(instant) = cursor {
        iterations += 1;
        if iterations > ctx.limits.generator_iterations {
            tracing::debug!(
                limit = ctx.limits.generator_iterations,
                "generator iteration ceiling reached"
            );
            return;
        }

        let date = instant.date_naive();
        let ended = match schedule.end {
            EndCondition::Never => false,
            EndCondition::OnDate(end) => date > end,
            EndCondition::AfterOccurrences(count) => series_index >= count,
        };
        if ended || window_end.is_some_and(|end| date > end) {
            return;
        }

        let visible = schedule.window.is_none_or(|window| window.contains(date));
        if date >= cutoff && visible && !emit(instant) {
            return;
        }

        series_index = series_index.saturating_add(1);
        cursor = next_occurrence_after(schedule, anchor_local, instant, ctx)
            .filter(|next| *next > instant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineLimits;
    use cadence_core::model::{Frequency, RecurrenceRule, RecurrenceWindow};
    use chrono::TimeZone;
    use chrono_tz::Tz;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    /// Monday 2024-01-15, 12:00 UTC.
    fn ctx() -> EvalContext {
        EvalContext::at(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(), Tz::UTC)
    }

    fn recurring(anchor: NaiveDate, rule: RecurrenceRule) -> Reminder {
        Reminder::new("r-1", "Test")
            .with_anchor(AnchorInstant::at(anchor, nine()))
            .repeating(rule)
    }

    fn dates(occurrences: &[Occurrence<'_>]) -> Vec<NaiveDate> {
        occurrences.iter().map(|occurrence| occurrence.date).collect()
    }

    #[test]
    fn test_includes_today_even_if_time_passed() {
        // 09:00 today already passed at 12:00, but today is still listed
        let reminder = recurring(date(2024, 1, 1), RecurrenceRule::new(Frequency::Daily));
        let occurrences = generate(&reminder, 3, &ctx());
        assert_eq!(
            dates(&occurrences),
            vec![date(2024, 1, 15), date(2024, 1, 16), date(2024, 1, 17)]
        );
        assert!(occurrences[0].is_next);
        assert!(!occurrences[1].is_next);
        assert_eq!(occurrences[2].position, 2);
    }

    #[test]
    fn test_custom_days_first_is_next_wednesday() {
        // Anchor Tuesday 2024-01-16; Mon/Wed/Fri
        let reminder = recurring(
            date(2024, 1, 16),
            RecurrenceRule::new(Frequency::Custom).on_days([1, 3, 5]),
        );
        let occurrences = generate(&reminder, 4, &ctx());
        assert_eq!(
            dates(&occurrences),
            vec![
                date(2024, 1, 17),
                date(2024, 1, 19),
                date(2024, 1, 22),
                date(2024, 1, 24)
            ]
        );
    }

    #[test]
    fn test_strictly_increasing_and_bounded() {
        let rules = [
            RecurrenceRule::new(Frequency::Daily).every(3),
            RecurrenceRule::new(Frequency::Weekdays),
            RecurrenceRule::new(Frequency::Weekly).on_days([0, 6]),
            RecurrenceRule::new(Frequency::Monthly),
            RecurrenceRule::new(Frequency::Yearly).every(2),
            RecurrenceRule::new(Frequency::FirstMondayOfMonth),
            RecurrenceRule::new(Frequency::LastFridayOfMonth).every(3),
            RecurrenceRule::new(Frequency::CustomInterval).every(5),
        ];
        for rule in rules {
            let reminder = recurring(date(2023, 8, 31), rule.clone());
            let occurrences = generate(&reminder, 25, &ctx());
            assert_eq!(occurrences.len(), 25, "rule {rule:?}");
            assert!(
                occurrences.windows(2).all(|pair| pair[0].instant < pair[1].instant),
                "rule {rule:?} is not strictly increasing"
            );
        }
    }

    #[test]
    fn test_after_occurrences_counts_from_anchor() {
        // Five daily occurrences from Jan 12: Jan 12..=16; two remain from Jan 15
        let reminder = recurring(
            date(2024, 1, 12),
            RecurrenceRule::new(Frequency::Daily).times(5),
        );
        let occurrences = generate(&reminder, 10, &ctx());
        assert_eq!(dates(&occurrences), vec![date(2024, 1, 15), date(2024, 1, 16)]);
    }

    #[test]
    fn test_after_occurrences_caps_output() {
        let reminder = recurring(
            date(2024, 1, 20),
            RecurrenceRule::new(Frequency::Weekly).times(3),
        );
        assert_eq!(generate(&reminder, 50, &ctx()).len(), 3);
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let reminder = recurring(
            date(2024, 1, 15),
            RecurrenceRule::new(Frequency::Daily).until(date(2024, 1, 18)),
        );
        let occurrences = generate(&reminder, 10, &ctx());
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences.last().map(|o| o.date), Some(date(2024, 1, 18)));
    }

    #[test]
    fn test_window_bounds_occurrences() {
        let reminder = recurring(
            date(2024, 1, 1),
            RecurrenceRule::new(Frequency::Daily).within(RecurrenceWindow {
                start_date: Some(date(2024, 1, 20)),
                end_date: Some(date(2024, 1, 22)),
            }),
        );
        assert_eq!(
            dates(&generate(&reminder, 10, &ctx())),
            vec![date(2024, 1, 20), date(2024, 1, 21), date(2024, 1, 22)]
        );
    }

    #[test]
    fn test_exhausted_series_is_empty() {
        let reminder = recurring(
            date(2023, 1, 1),
            RecurrenceRule::new(Frequency::Monthly).until(date(2023, 12, 31)),
        );
        assert!(generate(&reminder, 10, &ctx()).is_empty());
    }

    #[test]
    fn test_non_recurring_yields_anchor_once() {
        let reminder =
            Reminder::new("r-2", "Dentist").with_anchor(AnchorInstant::at(date(2024, 1, 20), nine()));
        let occurrences = generate(&reminder, 10, &ctx());
        assert_eq!(dates(&occurrences), vec![date(2024, 1, 20)]);
        assert!(occurrences[0].is_next);

        let past =
            Reminder::new("r-3", "Old").with_anchor(AnchorInstant::at(date(2024, 1, 10), nine()));
        assert!(generate(&past, 10, &ctx()).is_empty());
    }

    #[test]
    fn test_not_pending_yields_nothing() {
        let reminder = recurring(date(2024, 1, 1), RecurrenceRule::new(Frequency::Daily))
            .with_status(Status::Completed);
        assert!(generate(&reminder, 10, &ctx()).is_empty());
        assert!(anchor_occurrence(&reminder, &ctx()).is_none());
    }

    #[test_log::test]
    fn test_malformed_rule_yields_nothing() {
        let reminder = recurring(date(2024, 1, 1), RecurrenceRule::new(Frequency::Daily).every(0));
        assert!(generate(&reminder, 10, &ctx()).is_empty());
    }

    #[test]
    fn test_recurring_without_anchor_yields_nothing() {
        let reminder = Reminder::new("r-4", "No date").repeating(RecurrenceRule::new(Frequency::Daily));
        assert!(generate(&reminder, 10, &ctx()).is_empty());
    }

    #[test_log::test]
    fn test_iteration_ceiling_shortens_output() {
        // A counted series walks from the anchor, two years back
        let reminder = recurring(
            date(2022, 1, 1),
            RecurrenceRule::new(Frequency::Daily).times(5000),
        );
        let limits = EngineLimits {
            generator_iterations: 100,
            ..EngineLimits::default()
        };
        let ctx = ctx().with_limits(limits);
        assert!(generate(&reminder, 10, &ctx).is_empty());

        let ctx = ctx.with_limits(EngineLimits {
            generator_iterations: 750,
            ..EngineLimits::default()
        });
        // 2022-01-01 + 744 days = 2024-01-15; iterations 745..=750 are emitted
        assert_eq!(generate(&reminder, 10, &ctx).len(), 6);
    }

    #[test]
    fn test_all_day_occurrence_has_no_time() {
        let reminder = Reminder::new("r-5", "Bins")
            .with_anchor(AnchorInstant::all_day(date(2024, 1, 16)))
            .repeating(RecurrenceRule::new(Frequency::Weekly));
        let occurrences = generate(&reminder, 2, &ctx());
        assert_eq!(occurrences[0].time, None);
        assert_eq!(occurrences[0].instant.time(), nine());

        let materialized = occurrences[1].materialize();
        assert_eq!(
            materialized.anchor,
            Some(AnchorInstant::all_day(date(2024, 1, 23)))
        );
    }

    #[test]
    fn test_search_start_option() {
        let reminder = recurring(date(2024, 1, 1), RecurrenceRule::new(Frequency::Monthly));
        let options = GenerateOptions::default()
            .with_max(2)
            .starting(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(
            dates(&generate_with(&reminder, &options, &ctx())),
            vec![date(2024, 6, 1), date(2024, 7, 1)]
        );
    }

    #[test]
    fn test_generate_before_stops_at_the_day() {
        let reminder = recurring(date(2024, 1, 1), RecurrenceRule::new(Frequency::Daily).every(2));
        let start = Utc.with_ymd_and_hms(2024, 1, 4, 23, 0, 0).unwrap();
        assert_eq!(
            dates(&generate_before(&reminder, start, date(2024, 1, 11), &ctx())),
            vec![date(2024, 1, 5), date(2024, 1, 7), date(2024, 1, 9)]
        );
        assert!(generate_before(&reminder, start, date(2024, 1, 4), &ctx()).is_empty());

        let one_off =
            Reminder::new("r-6", "Once").with_anchor(AnchorInstant::at(date(2024, 1, 8), nine()));
        assert_eq!(
            dates(&generate_before(&one_off, start, date(2024, 1, 9), &ctx())),
            vec![date(2024, 1, 8)]
        );
        assert!(generate_before(&one_off, start, date(2024, 1, 8), &ctx()).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let reminder = recurring(date(2023, 3, 31), RecurrenceRule::new(Frequency::Monthly));
        assert_eq!(generate(&reminder, 12, &ctx()), generate(&reminder, 12, &ctx()));
    }
}
