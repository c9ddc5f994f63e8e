/// Engine limits shared across crates
pub const DEFAULT_INTERPRETER_STEP_LIMIT: u32 = 366;
pub const MIN_INTERPRETER_STEP_LIMIT: u32 = 100;
pub const MAX_INTERPRETER_STEP_LIMIT: u32 = 400;

pub const DEFAULT_GENERATOR_ITERATION_LIMIT: u32 = 1000;
pub const DEFAULT_PREVIEW_COUNT: usize = 10;

/// Wall-clock time given to reminders that carry a date but no time of day.
pub const DEFAULT_ALL_DAY_TIME: &str = "09:00";

pub const DEFAULT_LOOKAHEAD_OCCURRENCES: usize = 10;

/// Validation thresholds
pub const DEFAULT_MAX_NOTIFICATION_TIMINGS: usize = 10;
pub const DEFAULT_MANY_TIMINGS_THRESHOLD: usize = 5;
pub const DEFAULT_MAX_ASSIGNEES: usize = 20;
pub const DEFAULT_LARGE_INTERVAL_THRESHOLD: u32 = 365;
/// One week.
pub const DEFAULT_LARGE_OFFSET_MINUTES: i64 = 10_080;
pub const DEFAULT_UNTITLED_TITLE: &str = "Untitled reminder";

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Namespace for the UUIDv5 identifiers handed to notification delivery.
pub const NOTIFICATION_ID_NAMESPACE: uuid::Uuid =
    uuid::Uuid::from_u128(0x6f2c_9a41_3d7e_4b0a_9c55_e1d8_7a30_b2f4);
