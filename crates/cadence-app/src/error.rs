use thiserror::Error;

/// Command-line level errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read {path}: {source}")]
    ReadInput {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    ServiceError(#[from] cadence_service::error::ServiceError),

    #[error(transparent)]
    CalendarError(#[from] cadence_calendar::error::CalendarError),

    #[error(transparent)]
    CoreError(#[from] cadence_core::error::CoreError),

    #[error(transparent)]
    SerializationError(#[from] serde_json::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
