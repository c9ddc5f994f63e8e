//! Calendar arithmetic and time-zone handling for the recurrence engine.
//!
//! Everything here works on civil (wall-clock) dates and times. Converting a
//! wall-clock reading to an absolute instant always goes through a zone the
//! caller supplies; nothing in this crate reads the system clock.

pub mod arithmetic;
pub mod error;
pub mod timezone;
pub mod weekday;
