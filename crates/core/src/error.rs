use chrono::NaiveDate;
use rota_types::ScheduleId;

/// Error taxonomy of the scheduling engine.
///
/// `AccessDenied` and `RecordNotFound` are deliberately distinct: a direct
/// mutation attempt against a forbidden record must surface as an
/// authorisation failure, never be downgraded to "not found" or an empty
/// result. `DuplicateExecution` is an expected concurrency outcome, not a
/// fault: callers refresh their view and report "already completed".
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid interval unit: {0}")]
    InvalidIntervalUnit(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("access denied")]
    AccessDenied,
    #[error("schedule not found: {0}")]
    RecordNotFound(ScheduleId),
    #[error("execution already recorded for schedule {schedule} on {planned_date}")]
    DuplicateExecution {
        schedule: ScheduleId,
        planned_date: NaiveDate,
    },
    #[error("calendar error: {0}")]
    Calendar(#[from] rota_calendar::CalendarError),
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
