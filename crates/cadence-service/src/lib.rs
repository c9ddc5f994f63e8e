//! Recurrence engine services.
//!
//! Every entry point takes an [`context::EvalContext`] holding the "now"
//! captured once for the call, the zone used to read wall-clock times and the
//! engine limits. Nothing below reads the system clock.

pub mod audit;
pub mod context;
pub mod describe;
pub mod error;
pub mod generator;
pub mod interpreter;
pub mod notification;
pub mod rrule_export;
pub mod schedule;
pub mod validation;
