//! Compiled recurrence schedules.
//!
//! A stored [`RecurrenceRule`] is loosely shaped: it can carry an interval of
//! zero, day numbers above 6 or both end conditions at once. Compiling it
//! produces a [`Schedule`] whose [`Pattern`] and [`EndCondition`] admit only
//! valid states, which is what the interpreter runs on.

use std::num::NonZeroU32;

use cadence_calendar::weekday::WeekdaySet;
use cadence_core::model::{EndCondition, Frequency, RecurrenceRule, RecurrenceWindow};

use crate::validation::ErrorKind;

/// The shape of a series, one variant per supported frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Daily,
    /// Monday through Friday; the interval does not apply.
    Weekdays,
    /// Every `interval` weeks, on the anchor's weekday or on `days`.
    Weekly { days: Option<WeekdaySet> },
    Monthly,
    Yearly,
    FirstMondayOfMonth,
    LastFridayOfMonth,
    /// The given weekdays, in every `interval`-th week.
    CustomDays { days: WeekdaySet },
    /// Every `interval` days.
    CustomInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub pattern: Pattern,
    pub interval: NonZeroU32,
    pub end: EndCondition,
    pub window: Option<RecurrenceWindow>,
}

impl Schedule {
    /// ## Summary
    /// Compiles a stored rule.
    ///
    /// Checks only what the rule itself can get wrong; anchor-relative checks
    /// such as an end date before the anchor belong to validation.
    ///
    /// ## Errors
    /// Returns the first structural problem found.
    pub fn compile(rule: &RecurrenceRule) -> Result<Self, ErrorKind> {
        let interval = NonZeroU32::new(rule.interval).ok_or(ErrorKind::IntervalTooSmall)?;
        let days = WeekdaySet::from_indices(&rule.days_of_week)
            .map_err(|value| ErrorKind::DayOfWeekOutOfRange { value })?;

        let pattern = match rule.frequency {
            Frequency::Daily => Pattern::Daily,
            Frequency::Weekdays => Pattern::Weekdays,
            Frequency::Weekly => Pattern::Weekly {
                days: (!days.is_empty()).then_some(days),
            },
            Frequency::Monthly => Pattern::Monthly,
            Frequency::Yearly => Pattern::Yearly,
            Frequency::FirstMondayOfMonth => Pattern::FirstMondayOfMonth,
            Frequency::LastFridayOfMonth => Pattern::LastFridayOfMonth,
            Frequency::Custom if days.is_empty() => return Err(ErrorKind::EmptyDaysOfWeek),
            Frequency::Custom => Pattern::CustomDays { days },
            Frequency::CustomInterval if !days.is_empty() => {
                return Err(ErrorKind::DaysOfWeekNotAllowed);
            }
            Frequency::CustomInterval => Pattern::CustomInterval,
        };

        let end = match rule.end_condition() {
            None => return Err(ErrorKind::ConflictingEndConditions),
            Some(EndCondition::AfterOccurrences(0)) => {
                return Err(ErrorKind::OccurrenceCountTooSmall);
            }
            Some(end) => end,
        };

        if rule.window.is_some_and(|window| window.is_inverted()) {
            return Err(ErrorKind::WindowInverted);
        }

        Ok(Self {
            pattern,
            interval,
            end,
            window: rule.window,
        })
    }

    /// Interval as a signed step for calendar arithmetic.
    #[must_use]
    pub fn step(&self) -> i64 {
        i64::from(self.interval.get())
    }
}
