//! The recurrence period for a schedule definition.
//!
//! An [`Interval`] pairs a calendar unit with a positive count, e.g. "every
//! 2 weeks" or "every 3 months". An unrecognised unit string is a hard error
//! at the data boundary; it must never silently default to another unit.

use std::str::FromStr;

/// Errors that can occur when constructing an interval.
#[derive(Debug, thiserror::Error)]
pub enum IntervalError {
    /// The interval count was zero
    #[error("interval value must be at least 1")]
    ZeroValue,
    /// The unit string did not name a known calendar unit
    #[error("invalid interval unit: {0}")]
    InvalidUnit(String),
}

/// Calendar unit of a recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
}

impl IntervalUnit {
    /// Returns the lowercase wire name of the unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = IntervalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "day" => Ok(IntervalUnit::Day),
            "week" => Ok(IntervalUnit::Week),
            "month" => Ok(IntervalUnit::Month),
            other => Err(IntervalError::InvalidUnit(other.to_owned())),
        }
    }
}

impl<'de> serde::Deserialize<'de> for IntervalUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A validated recurrence period: `value` repetitions of `unit`.
///
/// Invariant: `value >= 1`, enforced at construction and deserialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Interval {
    unit: IntervalUnit,
    value: u32,
}

impl Interval {
    /// Creates a new interval, rejecting a zero count.
    pub fn new(unit: IntervalUnit, value: u32) -> Result<Self, IntervalError> {
        if value == 0 {
            return Err(IntervalError::ZeroValue);
        }
        Ok(Self { unit, value })
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "every {} {}(s)", self.value, self.unit.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw {
            unit: IntervalUnit,
            value: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        Interval::new(raw.unit, raw.value).map_err(serde::de::Error::custom)
    }
}
