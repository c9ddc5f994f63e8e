//! Time-zone resolution and wall-clock to instant conversion.
//!
//! Uses ICU4X for Windows zone ID to IANA mapping and alias canonicalization.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

use crate::error::{CalendarError, CalendarResult};

/// Resolver for host-supplied zone names.
///
/// Caches resolved zones so repeated lookups skip ICU normalization.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Resolves a zone name to a `chrono_tz::Tz`.
    ///
    /// Windows names ("Eastern Standard Time") and IANA aliases
    /// ("Europe/Kiev") are normalized to canonical IANA names first.
    ///
    /// ## Errors
    /// Returns `CalendarError::UnknownTimezone` if the name cannot be resolved.
    ///
    /// ## Side Effects
    /// Caches successful resolutions.
    pub fn resolve(&mut self, name: &str) -> CalendarResult<Tz> {
        if let Some(tz) = self.cache.get(name) {
            return Ok(*tz);
        }

        let normalized = normalize_zone_name(name);
        let tz = Tz::from_str(&normalized).map_err(|_e| {
            tracing::warn!(zone = name, "unresolvable time zone");
            CalendarError::UnknownTimezone(name.to_string())
        })?;

        tracing::trace!(zone = name, resolved = %tz, "resolved time zone");
        self.cache.insert(name.to_string(), tz);
        Ok(tz)
    }

    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// Maps Windows zone names and IANA aliases to canonical IANA names.
///
/// Unrecognized names are returned trimmed but otherwise unchanged.
fn normalize_zone_name(name: &str) -> String {
    let trimmed = name.trim();

    let iana_parser = IanaParserExtended::new();

    let windows = WindowsParser::new()
        .parse(trimmed, None)
        .and_then(|zone| iana_parser.iter().find(|entry| entry.time_zone == zone));
    if let Some(entry) = windows {
        return entry.canonical.to_string();
    }

    let parsed = iana_parser.parse(trimmed);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    trimmed.to_string()
}

/// ## Summary
/// Converts a wall-clock datetime in `tz` to an absolute instant.
///
/// A time repeated by a DST fold resolves to its first (earlier) instant.
/// A time skipped by a DST gap is shifted forward by the length of the gap,
/// so 02:30 in a one-hour gap reads 03:30 and 02:10 in a half-hour gap reads
/// 02:40. Never fails.
#[must_use]
pub fn localize(local: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _latest) => earliest,
        LocalResult::None => {
            tracing::trace!(%local, zone = %tz, "wall-clock time falls in a DST gap");
            // A day earlier is still on the offset in force before the gap
            local
                .checked_sub_signed(TimeDelta::days(1))
                .map(|earlier| tz.offset_from_utc_datetime(&earlier).fix())
                .and_then(|offset| local.checked_sub_offset(offset))
                .map_or_else(|| tz.from_utc_datetime(&local), |utc| tz.from_utc_datetime(&utc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike, Utc};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_iana() {
        let mut resolver = TimeZoneResolver::new();
        assert_eq!(
            resolver.resolve("America/New_York").unwrap(),
            Tz::America__New_York
        );
        assert_eq!(resolver.cached(), 1);

        // Second lookup is served from the cache
        resolver.resolve("America/New_York").unwrap();
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn test_resolve_windows_name() {
        let mut resolver = TimeZoneResolver::new();
        let tz = resolver.resolve("Eastern Standard Time").unwrap();
        assert_eq!(tz, Tz::America__New_York);
    }

    #[test]
    fn test_resolve_alias() {
        let mut resolver = TimeZoneResolver::new();
        let tz = resolver.resolve("Europe/Kiev").unwrap();
        assert!(["Europe/Kyiv", "Europe/Kiev"].contains(&tz.name()), "got {tz}");
    }

    #[test_log::test]
    fn test_resolve_unknown() {
        let mut resolver = TimeZoneResolver::new();
        let result = resolver.resolve("Mars/Olympus_Mons");
        assert!(matches!(result, Err(CalendarError::UnknownTimezone(name)) if name == "Mars/Olympus_Mons"));
        assert_eq!(resolver.cached(), 0);
    }

    #[test]
    fn test_localize_regular_time() {
        let instant = localize(naive(2024, 1, 15, 9, 0), Tz::America__New_York);
        assert_eq!(
            instant.with_timezone(&Utc).naive_utc(),
            naive(2024, 1, 15, 14, 0)
        );
    }

    #[test]
    fn test_localize_gap_shifts_forward() {
        // 02:30 does not exist in New York on 2024-03-10
        let instant = localize(naive(2024, 3, 10, 2, 30), Tz::America__New_York);
        assert_eq!(instant.hour(), 3);
        assert_eq!(instant.minute(), 30);
        assert_eq!(
            instant.with_timezone(&Utc).naive_utc(),
            naive(2024, 3, 10, 7, 30)
        );
    }

    #[test]
    fn test_localize_half_hour_gap_shifts_by_gap() {
        // Lord Howe Island moves from +10:30 to +11:00 at 02:00 on 2024-10-06
        let instant = localize(naive(2024, 10, 6, 2, 10), Tz::Australia__Lord_Howe);
        assert_eq!(instant.hour(), 2);
        assert_eq!(instant.minute(), 40);
        assert_eq!(
            instant.with_timezone(&Utc).naive_utc(),
            naive(2024, 10, 5, 15, 40)
        );
    }

    #[test]
    fn test_localize_fold_takes_earlier_instant() {
        // 01:30 happens twice in New York on 2024-11-03; the first is EDT (-4)
        let instant = localize(naive(2024, 11, 3, 1, 30), Tz::America__New_York);
        assert_eq!(
            instant.with_timezone(&Utc).naive_utc(),
            naive(2024, 11, 3, 5, 30)
        );
    }
}
