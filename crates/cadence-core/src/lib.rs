//! Cadence core: the reminder data model, persisted record shape, lenient
//! date parsing, engine configuration and shared error types.

pub mod config;
pub mod constants;
pub mod date;
pub mod error;
pub mod model;
pub mod record;
