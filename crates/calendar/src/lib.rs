//! # Rota calendar
//!
//! Pure calendar-day arithmetic for recurring schedules.
//!
//! All dates are `chrono::NaiveDate` values: a calendar day with no time of
//! day and no timezone. Parsing and formatting use the strict `YYYY-MM-DD`
//! form, so a given string always maps to the same calendar day regardless of
//! the host timezone.
//!
//! Month arithmetic clamps rather than overflows: adding one month to
//! 2025-01-31 yields 2025-02-28 (2024-01-31 yields 2024-02-29), never a date
//! in March. This clamp is the contract callers rely on when a procedure is
//! scheduled for the end of a month.

use chrono::{Datelike, Duration, NaiveDate};

/// Errors that can occur when parsing calendar dates.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The input was not a valid `YYYY-MM-DD` date
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
}

/// Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Adds `n` days to a date. `n` may be negative.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    date + Duration::days(n)
}

/// Adds `n` weeks to a date, defined as `add_days(date, 7 * n)`.
pub fn add_weeks(date: NaiveDate, n: i64) -> NaiveDate {
    add_days(date, 7 * n)
}

/// Adds `n` calendar months to a date.
///
/// The month field advances by `n`; if the original day-of-month does not
/// exist in the target month it is clamped to the last valid day of that
/// month. The result is therefore always a valid calendar date.
pub fn add_months(date: NaiveDate, n: i32) -> NaiveDate {
    // Zero-based month index over the whole calendar, so year carry and
    // negative offsets fall out of euclidean division.
    let index = date.year() * 12 + date.month0() as i32 + n;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("clamped day-of-month is always valid for the target month")
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month is always in 1..=12"),
    }
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` string into a calendar date.
///
/// Deterministic by construction: the result carries no time-of-day or
/// timezone component, so two parses of the same string always yield the
/// same calendar day.
pub fn parse_date(input: &str) -> CalendarResult<NaiveDate> {
    NaiveDate::parse_from_str(input, ISO_DATE_FORMAT)
        .map_err(|_| CalendarError::InvalidDate(input.to_owned()))
}

/// Signed number of calendar days from `a` to `b` (positive when `b` is later).
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Whether `date` falls on or after `today`, comparing calendar days only.
pub fn is_today_or_future(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today
}
