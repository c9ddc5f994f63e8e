//! Civil date arithmetic.
//!
//! Month and year addition clamp the day of month to the last valid day of
//! the target month: Jan 31 + 1 month is Feb 28 (or 29), Feb 29 + 1 year is
//! Feb 28. Functions return `None` only when the result would leave chrono's
//! representable range.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use chrono_tz::Tz;

use crate::timezone::localize;
use crate::weekday::weekday_index;

#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`; 0 for an invalid month.
#[must_use]
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

#[must_use]
pub fn add_weeks(date: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    add_days(date, weeks.checked_mul(7)?)
}

/// Adds calendar months, clamping the day of month.
#[must_use]
pub fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let current = i64::from(date.year()) * 12 + i64::from(date.month0());
    let target = current.checked_add(months)?;
    let year = i32::try_from(target.div_euclid(12)).ok()?;
    // rem_euclid(12) is always in 0..12
    let month = u32::try_from(target.rem_euclid(12)).ok()? + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Adds calendar years, clamping Feb 29 to Feb 28 in non-leap years.
#[must_use]
pub fn add_years(date: NaiveDate, years: i64) -> Option<NaiveDate> {
    add_months(date, years.checked_mul(12)?)
}

/// Day of week as stored on reminders: 0 = Sunday through 6 = Saturday.
#[must_use]
pub fn day_of_week(date: NaiveDate) -> u8 {
    weekday_index(date.weekday())
}

#[must_use]
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

#[must_use]
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let remaining = days_in_month(date.year(), date.month()) - date.day();
    date + Days::new(u64::from(remaining))
}

/// The first `weekday` in the month containing `month_ref`.
#[must_use]
pub fn first_weekday_of_month(weekday: Weekday, month_ref: NaiveDate) -> Option<NaiveDate> {
    let first = first_day_of_month(month_ref);
    let offset = (7 + weekday.num_days_from_sunday() - first.weekday().num_days_from_sunday()) % 7;
    first.checked_add_days(Days::new(u64::from(offset)))
}

/// The last `weekday` in the month containing `month_ref`.
#[must_use]
pub fn last_weekday_of_month(weekday: Weekday, month_ref: NaiveDate) -> Option<NaiveDate> {
    let last = last_day_of_month(month_ref);
    let offset = (7 + last.weekday().num_days_from_sunday() - weekday.num_days_from_sunday()) % 7;
    last.checked_sub_days(Days::new(u64::from(offset)))
}

/// The `n`-th (1-based) `weekday` in the month containing `month_ref`, or
/// `None` if the month has fewer than `n` of them.
#[must_use]
pub fn nth_weekday_of_month(weekday: Weekday, n: u8, month_ref: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(month_ref.year(), month_ref.month(), weekday, n)
}

/// The Sunday starting the week that contains `date`, if representable.
#[must_use]
pub fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
}

/// Whole calendar months from the month of `from` to the month of `to`.
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
        - i64::from(from.month())
}

/// Whole Sunday-based weeks from the week of `from` to the week of `to`.
#[must_use]
pub fn weeks_between(from: NaiveDate, to: NaiveDate) -> Option<i64> {
    Some((week_start(to)? - week_start(from)?).num_days().div_euclid(7))
}

/// First instant of `date` in `tz`.
#[must_use]
pub fn start_of_day(date: NaiveDate, tz: Tz) -> chrono::DateTime<Tz> {
    localize(date.and_time(NaiveTime::MIN), tz)
}

/// Last representable instant of `date` in `tz`; `None` for the last date
/// chrono can represent.
#[must_use]
pub fn end_of_day(date: NaiveDate, tz: Tz) -> Option<chrono::DateTime<Tz>> {
    let next_midnight: NaiveDateTime = date
        .and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::days(1))?;
    localize(next_midnight, tz).checked_sub_signed(TimeDelta::nanoseconds(1))
}
