//! Engine configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::error::{ScheduleError, ScheduleResult};

/// Limits applied by the scheduling engine, resolved at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Largest projection window a caller may request, in days.
    max_window_days: i64,
}

impl EngineConfig {
    /// Creates a new `EngineConfig`.
    pub fn new(max_window_days: i64) -> ScheduleResult<Self> {
        if max_window_days < 1 {
            return Err(ScheduleError::InvalidInput(
                "max_window_days must be at least 1".into(),
            ));
        }
        Ok(Self { max_window_days })
    }

    pub fn max_window_days(&self) -> i64 {
        self.max_window_days
    }
}

impl Default for EngineConfig {
    /// One year plus the leap day, enough for an annual calendar view.
    fn default() -> Self {
        Self {
            max_window_days: 366,
        }
    }
}
