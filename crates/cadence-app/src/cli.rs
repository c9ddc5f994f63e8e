//! Command-line interface of the `cadence` binary.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Cadence: reminder recurrence engine.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "cadence", version, about)]
pub struct Invocation {
    #[command(subcommand)]
    pub command: Command,

    /// Zone to evaluate in; overrides `timezone.default`.
    #[arg(long = "tz", global = true)]
    pub timezone: Option<String>,

    /// Fixed "now" as an RFC 3339 timestamp, for reproducible output.
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,
}

/// Input shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct Records {
    /// JSON array of stored reminder records.
    pub input: PathBuf,
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Upcoming occurrences of each reminder.
    Preview {
        #[command(flatten)]
        records: Records,
        /// Overrides `engine.default_preview_count`.
        #[arg(long)]
        count: Option<usize>,
    },
    /// Next notification instant of each reminder.
    Next(Records),
    /// Validation errors and warnings of each reminder.
    Validate(Records),
    /// Consistency findings across the stored records.
    Audit(Records),
    /// Reconciled records as JSON.
    Repair(Records),
    /// RFC 5545 export of each recurring reminder.
    Rrule(Records),
}

impl Command {
    /// The records file the command reads.
    #[must_use]
    pub fn input(&self) -> &Path {
        match self {
            Self::Preview { records, .. }
            | Self::Next(records)
            | Self::Validate(records)
            | Self::Audit(records)
            | Self::Repair(records)
            | Self::Rrule(records) => &records.input,
        }
    }
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|now| now.with_timezone(&Utc))
}
