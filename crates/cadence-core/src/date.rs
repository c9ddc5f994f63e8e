//! Lenient date handling for values supplied by persistence.
//!
//! Records arrive with dates as either native epoch-millisecond numbers or
//! ISO-8601 strings in a handful of shapes. Some stores write fractional
//! epoch numbers or `{"seconds", "nanoseconds"}` timestamp objects. Anything
//! that cannot be read is treated as absent: parsing returns `None` and never
//! fails, and deserializing a record never fails on a date field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A date-like value as stored by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    /// Milliseconds since the Unix epoch.
    Millis(i64),
    /// ISO-8601 text (date, local date-time, or RFC 3339 with offset).
    Text(String),
    /// Any other stored value, kept as is.
    Other(Value),
}

/// A civil date with an optional wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl DateInput {
    /// ## Summary
    /// Reads the value as a civil date (and time, when present) in `tz`.
    ///
    /// Absolute values (epoch milliseconds, RFC 3339 with an offset) are
    /// converted into `tz`; local values keep their wall-clock reading.
    #[must_use]
    pub fn parse(&self, tz: Tz) -> Option<ParsedDate> {
        match self {
            Self::Millis(millis) => {
                let utc = DateTime::<Utc>::from_timestamp_millis(*millis)?;
                let local = utc.with_timezone(&tz).naive_local();
                Some(ParsedDate {
                    date: local.date(),
                    time: Some(local.time()),
                })
            }
            Self::Text(text) => parse_text(text, tz),
            Self::Other(value) => {
                let local = other_instant(value)?.with_timezone(&tz).naive_local();
                Some(ParsedDate {
                    date: local.date(),
                    time: Some(local.time()),
                })
            }
        }
    }

    /// ## Summary
    /// Reads the value as an absolute instant, interpreting local values in `tz`.
    ///
    /// A bare date resolves to the start of that day.
    #[must_use]
    pub fn to_instant(&self, tz: Tz) -> Option<DateTime<Utc>> {
        use chrono::TimeZone;

        match self {
            Self::Millis(millis) => return DateTime::<Utc>::from_timestamp_millis(*millis),
            Self::Text(text) => {
                if let Ok(fixed) = DateTime::parse_from_rfc3339(text.trim()) {
                    return Some(fixed.with_timezone(&Utc));
                }
            }
            Self::Other(value) => return other_instant(value),
        }

        let parsed = self.parse(tz)?;
        let naive = parsed.date.and_time(parsed.time.unwrap_or(NaiveTime::MIN));
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }

    /// Returns true when the value can be read as a date.
    #[must_use]
    pub fn is_parseable(&self) -> bool {
        self.parse(Tz::UTC).is_some()
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        Self::Text(date.format("%Y-%m-%d").to_string())
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Text(instant.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Fractional epoch milliseconds or a `{"seconds", "nanoseconds"}` object.
fn other_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => {
            let millis = number.as_f64()?;
            if !millis.is_finite() {
                return None;
            }
            // Whole milliseconds; chrono rejects anything out of range
            #[expect(clippy::cast_possible_truncation)]
            let whole = millis.trunc() as i64;
            DateTime::<Utc>::from_timestamp_millis(whole)
        }
        Value::Object(fields) => {
            let seconds = fields.get("seconds").or_else(|| fields.get("_seconds"))?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or_default();
            DateTime::<Utc>::from_timestamp(seconds.as_i64()?, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}

fn parse_text(text: &str, tz: Tz) -> Option<ParsedDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(fixed) = DateTime::parse_from_rfc3339(text) {
        let local = fixed.with_timezone(&tz).naive_local();
        return Some(ParsedDate {
            date: local.date(),
            time: Some(local.time()),
        });
    }

    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ParsedDate {
                date: local.date(),
                time: Some(local.time()),
            });
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| ParsedDate { date, time: None })
}

/// ## Summary
/// Parses a wall-clock time written as `HH:MM` or `HH:MM:SS`.
#[must_use]
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_err| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Formats a wall-clock time the way records store it.
#[must_use]
pub fn format_time_of_day(time: NaiveTime) -> String {
    use chrono::Timelike;

    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}
