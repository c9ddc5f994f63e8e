//! Reminder data model.
//!
//! `Reminder` is the only root entity. Recurrence rules and notification
//! configuration are embedded values without a lifecycle of their own.

mod notification;
mod recurrence;
mod reminder;

pub use notification::{NotificationConfig, NotificationTiming, TimingKind};
pub use recurrence::{EndCondition, Frequency, RecurrenceRule, RecurrenceWindow};
pub use reminder::{AnchorInstant, Reminder, Status};
