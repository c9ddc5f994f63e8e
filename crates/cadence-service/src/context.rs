//! Evaluation context and clock injection.

use cadence_core::config::Settings;
use cadence_core::constants::{
    DEFAULT_GENERATOR_ITERATION_LIMIT, DEFAULT_INTERPRETER_STEP_LIMIT,
    DEFAULT_LOOKAHEAD_OCCURRENCES,
};
use cadence_core::error::CoreResult;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// An absolute instant viewed in the evaluation zone.
pub type Instant = DateTime<Tz>;

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Iteration ceilings and defaults the engine runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// Steps one interpreter call may take before giving up.
    pub interpreter_steps: u32,
    /// Candidates one generator call may examine.
    pub generator_iterations: u32,
    /// Wall-clock time for anchors without a time of day.
    pub all_day_time: NaiveTime,
    /// Occurrences scanned when looking for the next notification.
    pub lookahead_occurrences: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            interpreter_steps: DEFAULT_INTERPRETER_STEP_LIMIT,
            generator_iterations: DEFAULT_GENERATOR_ITERATION_LIMIT,
            all_day_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            lookahead_occurrences: DEFAULT_LOOKAHEAD_OCCURRENCES,
        }
    }
}

impl EngineLimits {
    /// ## Summary
    /// Reads limits from loaded settings.
    ///
    /// ## Errors
    /// Returns an error if `engine.all_day_time` is not a time of day.
    pub fn from_settings(settings: &Settings) -> CoreResult<Self> {
        Ok(Self {
            interpreter_steps: settings.engine.interpreter_step_limit,
            generator_iterations: settings.engine.generator_iteration_limit,
            all_day_time: settings.engine.all_day_time()?,
            lookahead_occurrences: settings.notifications.lookahead_occurrences,
        })
    }
}

/// Per-call snapshot threaded through every engine function.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    pub now: DateTime<Utc>,
    pub tz: Tz,
    pub limits: EngineLimits,
}

impl EvalContext {
    /// Captures "now" from `clock` once.
    #[must_use]
    pub fn capture(clock: &impl Clock, tz: Tz, limits: EngineLimits) -> Self {
        Self {
            now: clock.now(),
            tz,
            limits,
        }
    }

    /// Context at a fixed instant with default limits.
    #[must_use]
    pub fn at(now: DateTime<Utc>, tz: Tz) -> Self {
        Self::capture(&FixedClock(now), tz, EngineLimits::default())
    }

    #[must_use]
    pub fn with_limits(self, limits: EngineLimits) -> Self {
        Self { limits, ..self }
    }

    #[must_use]
    pub fn now_local(&self) -> Instant {
        self.now.with_timezone(&self.tz)
    }

    /// Calendar date of "now" in the evaluation zone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_capture_reads_clock_once() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap();
        let ctx = EvalContext::capture(
            &FixedClock(now),
            Tz::America__Los_Angeles,
            EngineLimits::default(),
        );
        assert_eq!(ctx.now, now);
        // 03:00 UTC is still the previous evening in Los Angeles
        assert_eq!(ctx.today(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
    }

    #[test]
    fn test_limits_from_settings() {
        let mut settings = Settings::default();
        settings.engine.interpreter_step_limit = 150;
        settings.engine.all_day_time = "07:30".to_string();
        settings.notifications.lookahead_occurrences = 3;

        let limits = EngineLimits::from_settings(&settings).unwrap();
        assert_eq!(limits.interpreter_steps, 150);
        assert_eq!(limits.all_day_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(limits.lookahead_occurrences, 3);

        settings.engine.all_day_time = "noon".to_string();
        assert!(EngineLimits::from_settings(&settings).is_err());
    }
}
