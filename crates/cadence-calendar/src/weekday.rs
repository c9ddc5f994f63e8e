//! Weekday numbering and sets.
//!
//! Reminders number days of the week 0 = Sunday through 6 = Saturday.

use chrono::Weekday;

/// Converts a stored day number (0 = Sunday) into a `Weekday`.
#[must_use]
pub const fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Stored day number (0 = Sunday) of a `Weekday`.
#[must_use]
pub fn weekday_index(weekday: Weekday) -> u8 {
    // num_days_from_sunday is always in 0..7
    u8::try_from(weekday.num_days_from_sunday()).unwrap_or_default()
}

#[must_use]
pub const fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

#[must_use]
pub const fn short_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// A set of weekdays stored as a bitmask (bit 0 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);
    /// Monday through Friday.
    pub const WORKDAYS: Self = Self(0b011_1110);

    #[must_use]
    pub fn single(weekday: Weekday) -> Self {
        Self(1u8 << weekday.num_days_from_sunday())
    }

    /// ## Summary
    /// Builds a set from stored day numbers.
    ///
    /// Returns the first out-of-range value as the error.
    ///
    /// ## Errors
    /// Returns `Err(value)` for any value greater than 6.
    pub fn from_indices(indices: &[i32]) -> Result<Self, i32> {
        indices.iter().try_fold(Self::EMPTY, |set, &index| {
            u8::try_from(index)
                .ok()
                .and_then(weekday_from_index)
                .map(|weekday| set.with(weekday))
                .ok_or(index)
        })
    }

    #[must_use]
    pub fn with(self, weekday: Weekday) -> Self {
        Self(self.0 | Self::single(weekday).0)
    }

    #[must_use]
    pub fn contains(self, weekday: Weekday) -> bool {
        self.0 & Self::single(weekday).0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Members in Sunday-first order.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        (0..7u8)
            .filter_map(weekday_from_index)
            .filter(move |weekday| self.contains(*weekday))
    }

    /// Members as stored day numbers, ascending.
    #[must_use]
    pub fn indices(self) -> Vec<u8> {
        self.iter().map(weekday_index).collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl std::fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(short_name).collect();
        f.write_str(&names.join(", "))
    }
}
