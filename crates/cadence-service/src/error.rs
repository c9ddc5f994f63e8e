use thiserror::Error;

use crate::validation::ErrorKind;

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    #[error(transparent)]
    CalendarError(#[from] cadence_calendar::error::CalendarError),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(#[from] ErrorKind),

    #[error("Series has no occurrences")]
    EmptySeries,

    #[error("RRULE error: {0}")]
    RRuleError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
