//! Domain types for recurring schedules and their execution history.
//!
//! A [`ScheduleDefinition`] is the persisted recurring procedure; a
//! [`ScheduleInstance`] is a derived occurrence on a specific date,
//! regenerated on every query rather than stored. Execution history lives in
//! immutable [`ExecutionRecord`]s, unique per `(schedule, planned_date)`.

use chrono::NaiveDate;
use rota_types::{
    DepartmentId, ExecutionId, Interval, ItemId, NonEmptyText, OrganizationId, PatientId,
    ScheduleId, UserId,
};

use crate::error::{ScheduleError, ScheduleResult};
use crate::visibility::RecordScope;

/// Lifecycle state of a schedule definition.
///
/// `Paused` and `Completed` definitions are excluded from live due-date
/// projection; their execution history remains visible. Definitions are never
/// physically deleted while execution history exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Paused,
    Completed,
}

/// Outcome recorded when a planned occurrence was acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Completed,
    Skipped,
}

/// A recurring procedure registered for a patient.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScheduleDefinition {
    pub id: ScheduleId,
    pub patient: PatientId,
    /// Display name used for stable tie-breaking when sorting instances.
    pub patient_name: NonEmptyText,
    pub item: ItemId,
    pub item_label: NonEmptyText,
    pub interval: Interval,
    /// Date the recurrence is anchored to before any execution exists.
    pub start_date: NaiveDate,
    pub last_performed: Option<NaiveDate>,
    pub status: ScheduleStatus,
    pub organization: OrganizationId,
    pub department: Option<DepartmentId>,
    pub doctor: Option<UserId>,
    pub nurse_owner: Option<UserId>,
    /// Legacy care-type tag, kept for rows predating department assignment.
    pub care_type: Option<String>,
    pub notes: Option<String>,
}

impl ScheduleDefinition {
    /// The authorisation-relevant projection of this record.
    pub fn scope(&self) -> RecordScope {
        RecordScope {
            organization: self.organization,
            department: self.department,
            doctor: self.doctor,
            nurse_owner: self.nurse_owner,
            care_type: self.care_type.clone(),
        }
    }

    /// Date the next-due computation is anchored to: the last performed date,
    /// or the original start date if the procedure was never performed.
    pub fn anchor_date(&self) -> NaiveDate {
        self.last_performed.unwrap_or(self.start_date)
    }
}

/// Input for registering a new schedule definition.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewSchedule {
    pub patient: PatientId,
    pub patient_name: NonEmptyText,
    pub item: ItemId,
    pub item_label: NonEmptyText,
    pub interval: Interval,
    pub start_date: NaiveDate,
    pub department: Option<DepartmentId>,
    pub doctor: Option<UserId>,
    pub care_type: Option<String>,
    pub notes: Option<String>,
}

/// Partial update applied to an existing definition.
///
/// Absent fields leave the stored value untouched; `department`, `doctor`
/// and `notes` use a double `Option` so callers can clear an assignment.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SchedulePatch {
    pub interval: Option<Interval>,
    pub status: Option<ScheduleStatus>,
    pub last_performed: Option<NaiveDate>,
    #[serde(default, with = "double_option")]
    pub department: Option<Option<DepartmentId>>,
    #[serde(default, with = "double_option")]
    pub doctor: Option<Option<UserId>>,
    #[serde(default, with = "double_option")]
    pub notes: Option<Option<String>>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// One completed or skipped occurrence of a schedule.
///
/// Immutable once written, except for `notes`. The store enforces uniqueness
/// of `(schedule, planned_date)`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExecutionRecord {
    pub id: ExecutionId,
    pub schedule: ScheduleId,
    pub organization: OrganizationId,
    pub planned_date: NaiveDate,
    pub executed_date: NaiveDate,
    pub outcome: ExecutionOutcome,
    pub executed_by: UserId,
    pub notes: Option<String>,
}

/// Classification of a derived schedule instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Overdue,
    DueToday,
    Upcoming,
    Completed,
}

/// A single occurrence of a schedule on a specific date, derived per query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScheduleInstance {
    pub schedule: ScheduleId,
    pub patient: PatientId,
    pub patient_name: NonEmptyText,
    pub item_label: NonEmptyText,
    pub date: NaiveDate,
    pub state: InstanceState,
    pub completion: Option<ExecutionId>,
}

/// An inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ScheduleResult<Self> {
        if start > end {
            return Err(ScheduleError::InvalidInput(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether a date falls inside the window (inclusive on both ends).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Length of the window in days, counting both endpoints.
    pub fn len_days(&self) -> i64 {
        rota_calendar::days_between(self.start, self.end) + 1
    }
}
