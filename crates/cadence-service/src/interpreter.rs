//! Pattern interpreter.
//!
//! Finds the next occurrence of a compiled [`Schedule`] relative to a
//! reference instant. All searching happens on wall-clock dates in the
//! evaluation zone; candidates are converted to instants only at the end.
//!
//! Arithmetic patterns (daily, weekly without days, monthly, yearly, custom
//! interval) compute the k-th occurrence directly from the anchor, so a
//! clamped month end never drifts: Jan 31 monthly gives Feb 29, Mar 31,
//! Apr 30. Day-of-week and nth-weekday patterns scan forward.
//!
//! Every search runs under the step budget from
//! [`EngineLimits::interpreter_steps`](crate::context::EngineLimits). Running
//! out of steps yields `None`.

use cadence_calendar::arithmetic::{
    add_days, add_months, add_weeks, add_years, first_weekday_of_month, last_weekday_of_month,
    months_between, week_start, weeks_between,
};
use cadence_calendar::timezone::localize;
use cadence_calendar::weekday::{WeekdaySet, is_weekend};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Weekday};

use crate::context::{EvalContext, Instant};
use crate::schedule::{Pattern, Schedule};

/// Remaining steps for one interpreter call.
struct Budget {
    remaining: u32,
}

impl Budget {
    fn new(steps: u32) -> Self {
        Self { remaining: steps }
    }

    fn step(&mut self) -> Option<()> {
        if self.remaining == 0 {
            tracing::debug!("interpreter step budget exhausted");
            return None;
        }
        self.remaining -= 1;
        Some(())
    }
}

/// ## Summary
/// Returns the first occurrence strictly after `from`.
///
/// `anchor` is the wall-clock start of the series; no occurrence precedes it.
#[must_use]
pub fn next_occurrence_after(
    schedule: &Schedule,
    anchor: NaiveDateTime,
    from: Instant,
    ctx: &EvalContext,
) -> Option<Instant> {
    let after = from.checked_add_signed(TimeDelta::nanoseconds(1))?;
    let next = occurrence_at_or_after(schedule, anchor, after, ctx)?;
    debug_assert!(next > from);
    Some(next)
}

/// ## Summary
/// Returns the first occurrence at or after `from`.
#[must_use]
pub fn occurrence_at_or_after(
    schedule: &Schedule,
    anchor: NaiveDateTime,
    from: Instant,
    ctx: &EvalContext,
) -> Option<Instant> {
    let mut budget = Budget::new(ctx.limits.interpreter_steps);
    let mut lower = from.with_timezone(&ctx.tz).naive_local().max(anchor);

    loop {
        let candidate = candidate_at_or_after(schedule, anchor, lower, &mut budget)?;
        let instant = localize(candidate, ctx.tz);
        // A DST fold can map a later wall-clock reading to an earlier instant
        if instant >= from {
            tracing::trace!(%candidate, %instant, "occurrence found");
            return Some(instant);
        }
        lower = candidate.checked_add_signed(TimeDelta::nanoseconds(1))?;
    }
}

/// First wall-clock occurrence at or after `lower`, which is not before `anchor`.
fn candidate_at_or_after(
    schedule: &Schedule,
    anchor: NaiveDateTime,
    lower: NaiveDateTime,
    budget: &mut Budget,
) -> Option<NaiveDateTime> {
    let time = anchor.time();
    let first_day = if lower.time() <= time {
        lower.date()
    } else {
        lower.date().succ_opt()?
    };
    let anchor_date = anchor.date();
    let step = schedule.step();

    let elapsed_days = (first_day - anchor_date).num_days().max(0);
    let elapsed_months = months_between(anchor_date, first_day).max(0);

    let date = match schedule.pattern {
        Pattern::Daily | Pattern::CustomInterval => {
            nth_at_or_after(first_day, elapsed_days / step, budget, |k| {
                add_days(anchor_date, k.checked_mul(step)?)
            })
        }
        Pattern::Weekly { days: None } => {
            nth_at_or_after(first_day, elapsed_days / (step * 7), budget, |k| {
                add_weeks(anchor_date, k.checked_mul(step)?)
            })
        }
        Pattern::Monthly => nth_at_or_after(first_day, elapsed_months / step, budget, |k| {
            add_months(anchor_date, k.checked_mul(step)?)
        }),
        Pattern::Yearly => {
            nth_at_or_after(first_day, elapsed_months / (step * 12), budget, |k| {
                add_years(anchor_date, k.checked_mul(step)?)
            })
        }
        Pattern::Weekdays => next_weekday(first_day, budget),
        Pattern::Weekly { days: Some(days) } | Pattern::CustomDays { days } => {
            next_day_in_set(anchor_date, first_day, days, step, budget)
        }
        Pattern::FirstMondayOfMonth => {
            next_in_month(anchor_date, first_day, step, budget, |month| {
                first_weekday_of_month(Weekday::Mon, month)
            })
        }
        Pattern::LastFridayOfMonth => {
            next_in_month(anchor_date, first_day, step, budget, |month| {
                last_weekday_of_month(Weekday::Fri, month)
            })
        }
    }?;

    Some(date.and_time(time))
}

/// Smallest `nth(k)` on or after `first_day`, searching up from `k`.
///
/// `nth` is increasing in `k`, and `nth(k)` for the starting `k` must not be
/// after the answer. Starting from the elapsed whole steps guarantees that.
fn nth_at_or_after(
    first_day: NaiveDate,
    mut k: i64,
    budget: &mut Budget,
    nth: impl Fn(i64) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    loop {
        budget.step()?;
        let date = nth(k)?;
        if date >= first_day {
            return Some(date);
        }
        k += 1;
    }
}

fn next_weekday(first_day: NaiveDate, budget: &mut Budget) -> Option<NaiveDate> {
    let mut date = first_day;
    loop {
        budget.step()?;
        if !is_weekend(date.weekday()) {
            return Some(date);
        }
        date = date.succ_opt()?;
    }
}

/// Next day in `days` within a week eligible under the interval.
///
/// Weeks start on Sunday and are counted from the week containing the anchor.
fn next_day_in_set(
    anchor_date: NaiveDate,
    first_day: NaiveDate,
    days: WeekdaySet,
    interval: i64,
    budget: &mut Budget,
) -> Option<NaiveDate> {
    let mut date = first_day;
    loop {
        budget.step()?;
        let offset = weeks_between(anchor_date, date)?.rem_euclid(interval);
        if offset != 0 {
            date = add_days(week_start(date)?, (interval - offset) * 7)?;
            tracing::trace!(%date, "skipping to next eligible week");
            continue;
        }
        if days.contains(date.weekday()) {
            return Some(date);
        }
        date = date.succ_opt()?;
    }
}

/// Next canonical day (per `in_month`) within an eligible month.
///
/// Months are counted from the anchor month.
fn next_in_month(
    anchor_date: NaiveDate,
    first_day: NaiveDate,
    interval: i64,
    budget: &mut Budget,
    in_month: impl Fn(NaiveDate) -> Option<NaiveDate>,
) -> Option<NaiveDate> {
    let mut month = first_day.with_day(1)?;
    loop {
        budget.step()?;
        let offset = months_between(anchor_date, month).rem_euclid(interval);
        if offset != 0 {
            month = add_months(month, interval - offset)?;
            continue;
        }
        let date = in_month(month)?;
        if date >= first_day {
            return Some(date);
        }
        month = add_months(month, interval)?;
    }
}
