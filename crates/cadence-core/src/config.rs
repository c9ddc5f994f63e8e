use std::path::Path;

use config::Config;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ALL_DAY_TIME, DEFAULT_GENERATOR_ITERATION_LIMIT, DEFAULT_INTERPRETER_STEP_LIMIT,
    DEFAULT_LARGE_INTERVAL_THRESHOLD, DEFAULT_LARGE_OFFSET_MINUTES, DEFAULT_LOG_LEVEL,
    DEFAULT_LOOKAHEAD_OCCURRENCES, DEFAULT_MANY_TIMINGS_THRESHOLD, DEFAULT_MAX_ASSIGNEES,
    DEFAULT_MAX_NOTIFICATION_TIMINGS, DEFAULT_PREVIEW_COUNT, DEFAULT_TIMEZONE,
    DEFAULT_UNTITLED_TITLE, MAX_INTERPRETER_STEP_LIMIT, MIN_INTERPRETER_STEP_LIMIT,
};
use crate::date::parse_time_of_day;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub engine: EngineConfig,
    pub notifications: NotificationSettings,
    pub validation: ValidationConfig,
    pub timezone: TimezoneConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub interpreter_step_limit: u32,
    pub generator_iteration_limit: u32,
    pub default_preview_count: usize,
    pub all_day_time: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interpreter_step_limit: DEFAULT_INTERPRETER_STEP_LIMIT,
            generator_iteration_limit: DEFAULT_GENERATOR_ITERATION_LIMIT,
            default_preview_count: DEFAULT_PREVIEW_COUNT,
            all_day_time: DEFAULT_ALL_DAY_TIME.to_string(),
        }
    }
}

impl EngineConfig {
    /// ## Summary
    /// Returns the wall-clock time used for reminders without a time of day.
    ///
    /// ## Errors
    /// Returns an error if `all_day_time` is not `HH:MM` or `HH:MM:SS`.
    pub fn all_day_time(&self) -> CoreResult<chrono::NaiveTime> {
        parse_time_of_day(&self.all_day_time).ok_or_else(|| {
            CoreError::ConfigError(format!(
                "engine.all_day_time `{}` is not a time of day",
                self.all_day_time
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    pub lookahead_occurrences: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            lookahead_occurrences: DEFAULT_LOOKAHEAD_OCCURRENCES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub max_notification_timings: usize,
    pub many_timings_threshold: usize,
    pub max_assignees: usize,
    pub large_interval_threshold: u32,
    pub large_offset_minutes: i64,
    pub untitled_title: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_notification_timings: DEFAULT_MAX_NOTIFICATION_TIMINGS,
            many_timings_threshold: DEFAULT_MANY_TIMINGS_THRESHOLD,
            max_assignees: DEFAULT_MAX_ASSIGNEES,
            large_interval_threshold: DEFAULT_LARGE_INTERVAL_THRESHOLD,
            large_offset_minutes: DEFAULT_LARGE_OFFSET_MINUTES,
            untitled_title: DEFAULT_UNTITLED_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimezoneConfig {
    pub default: String,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from defaults, environment variables and an optional
    /// `cadence.toml` in the working directory.
    ///
    /// Environment variables use the `CADENCE__` prefix and `__` as the section
    /// separator, e.g. `CADENCE__ENGINE__INTERPRETER_STEP_LIMIT=200`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> CoreResult<Self> {
        Self::load_from(None)
    }

    /// ## Summary
    /// Same as [`Settings::load`], reading the given file instead of `cadence.toml`.
    ///
    /// ## Errors
    /// Returns an error if the file is unreadable, or building the configuration
    /// or deserializing it fails.
    pub fn load_from(path: Option<&Path>) -> CoreResult<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("cadence").required(false),
        };

        Ok(Config::builder()
            .set_default(
                "engine.interpreter_step_limit",
                i64::from(DEFAULT_INTERPRETER_STEP_LIMIT),
            )?
            .set_default(
                "engine.generator_iteration_limit",
                i64::from(DEFAULT_GENERATOR_ITERATION_LIMIT),
            )?
            .set_default("engine.default_preview_count", DEFAULT_PREVIEW_COUNT as u64)?
            .set_default("engine.all_day_time", DEFAULT_ALL_DAY_TIME)?
            .set_default(
                "notifications.lookahead_occurrences",
                DEFAULT_LOOKAHEAD_OCCURRENCES as u64,
            )?
            .set_default(
                "validation.max_notification_timings",
                DEFAULT_MAX_NOTIFICATION_TIMINGS as u64,
            )?
            .set_default(
                "validation.many_timings_threshold",
                DEFAULT_MANY_TIMINGS_THRESHOLD as u64,
            )?
            .set_default("validation.max_assignees", DEFAULT_MAX_ASSIGNEES as u64)?
            .set_default(
                "validation.large_interval_threshold",
                i64::from(DEFAULT_LARGE_INTERVAL_THRESHOLD),
            )?
            .set_default("validation.large_offset_minutes", DEFAULT_LARGE_OFFSET_MINUTES)?
            .set_default("validation.untitled_title", DEFAULT_UNTITLED_TITLE)?
            .set_default("timezone.default", DEFAULT_TIMEZONE)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            // TOML file
            .add_source(file)
            // Env overrides the file
            .add_source(
                config::Environment::with_prefix("CADENCE")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Checks the loaded values and clamps the interpreter step limit into the
    /// supported range.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` for zero limits, a blank untitled
    /// title or an unparseable `engine.all_day_time`.
    pub fn validated(mut self) -> CoreResult<Self> {
        if self.engine.generator_iteration_limit == 0 {
            return Err(CoreError::ConfigError(
                "engine.generator_iteration_limit must be at least 1".to_string(),
            ));
        }
        if self.notifications.lookahead_occurrences == 0 {
            return Err(CoreError::ConfigError(
                "notifications.lookahead_occurrences must be at least 1".to_string(),
            ));
        }
        if self.validation.untitled_title.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "validation.untitled_title must not be blank".to_string(),
            ));
        }
        self.engine.all_day_time()?;

        let clamped = self
            .engine
            .interpreter_step_limit
            .clamp(MIN_INTERPRETER_STEP_LIMIT, MAX_INTERPRETER_STEP_LIMIT);
        if clamped != self.engine.interpreter_step_limit {
            tracing::warn!(
                configured = self.engine.interpreter_step_limit,
                clamped,
                "engine.interpreter_step_limit out of range, clamping"
            );
            self.engine.interpreter_step_limit = clamped;
        }

        Ok(self)
    }
}

/// ## Summary
/// Loads configuration from environment variables, a `.env` file and
/// `cadence.toml`, then validates it.
///
/// ## Errors
/// Returns an error if loading, deserializing or validating the configuration fails.
pub fn load_config() -> CoreResult<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()?.validated()
}
