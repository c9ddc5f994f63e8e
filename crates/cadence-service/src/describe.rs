//! Plain English descriptions of compiled schedules.

use std::fmt;

use cadence_core::model::{EndCondition, RecurrenceWindow};

use crate::schedule::{Pattern, Schedule};

/// "every day", "every 3 days", "every 2 weeks"
fn every(f: &mut fmt::Formatter<'_>, interval: u32, unit: &str) -> fmt::Result {
    if interval == 1 {
        write!(f, "every {unit}")
    } else {
        write!(f, "every {interval} {unit}s")
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interval = self.interval.get();
        match self.pattern {
            Pattern::Daily | Pattern::CustomInterval => every(f, interval, "day")?,
            Pattern::Weekdays => f.write_str("every weekday")?,
            Pattern::Weekly { days: None } => every(f, interval, "week")?,
            Pattern::Weekly { days: Some(days) } | Pattern::CustomDays { days } => {
                every(f, interval, "week")?;
                write!(f, " on {days}")?;
            }
            Pattern::Monthly => every(f, interval, "month")?,
            Pattern::Yearly => every(f, interval, "year")?,
            Pattern::FirstMondayOfMonth => {
                f.write_str("on the first Monday of ")?;
                every(f, interval, "month")?;
            }
            Pattern::LastFridayOfMonth => {
                f.write_str("on the last Friday of ")?;
                every(f, interval, "month")?;
            }
        }

        match self.end {
            EndCondition::Never => {}
            EndCondition::OnDate(date) => write!(f, ", until {date}")?,
            EndCondition::AfterOccurrences(1) => f.write_str(", once")?,
            EndCondition::AfterOccurrences(count) => write!(f, ", {count} times")?,
        }

        match self.window {
            Some(RecurrenceWindow {
                start_date: Some(start),
                end_date: Some(end),
            }) => write!(f, ", between {start} and {end}"),
            Some(RecurrenceWindow {
                start_date: Some(start),
                end_date: None,
            }) => write!(f, ", from {start}"),
            Some(RecurrenceWindow {
                start_date: None,
                end_date: Some(end),
            }) => write!(f, ", through {end}"),
            _ => Ok(()),
        }
    }
}
