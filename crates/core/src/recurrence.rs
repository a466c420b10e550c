//! Next-due-date computation and due-status classification.
//!
//! Both functions are pure: no clock access, no store access. "Today" is an
//! explicit parameter so callers (and tests) control the reference day.

use chrono::NaiveDate;
use rota_types::{Interval, IntervalUnit};

/// Status of a due date relative to a reference day.
///
/// Exactly one variant holds for any `(due, today)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming,
}

/// Computes the next due date from the anchor date and the interval.
///
/// Dispatches on the interval unit; month arithmetic clamps to the end of
/// the target month (see `rota-calendar`). Unrecognised units cannot reach
/// this function: they are rejected when an [`Interval`] is constructed or
/// deserialised.
pub fn next_due_date(anchor: NaiveDate, interval: &Interval) -> NaiveDate {
    let value = interval.value();
    match interval.unit() {
        IntervalUnit::Day => rota_calendar::add_days(anchor, i64::from(value)),
        IntervalUnit::Week => rota_calendar::add_weeks(anchor, i64::from(value)),
        IntervalUnit::Month => rota_calendar::add_months(anchor, value as i32),
    }
}

/// Classifies a due date against a reference day.
pub fn classify(due: NaiveDate, today: NaiveDate) -> DueStatus {
    match due.cmp(&today) {
        std::cmp::Ordering::Less => DueStatus::Overdue,
        std::cmp::Ordering::Equal => DueStatus::DueToday,
        std::cmp::Ordering::Greater => DueStatus::Upcoming,
    }
}
