use thiserror::Error;

/// Calendar and time-zone errors
#[derive(Error, Debug)]
pub enum CalendarError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
