//! Wire types for the REST surface.
//!
//! Conversions into domain types validate at the boundary; an unknown
//! interval unit or role string is rejected here with a typed error, never
//! defaulted.

use chrono::NaiveDate;
use rota_core::{
    ExecutionOutcome, ExecutionRecord, InstanceState, NewSchedule, ScheduleDefinition,
    ScheduleError, ScheduleInstance, ScheduleStatus,
};
use rota_types::{DepartmentId, Interval, ItemId, NonEmptyText, PatientId, UserId};
use uuid::Uuid;

/// Health check response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Recurrence interval on the wire.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct IntervalDto {
    /// One of `day`, `week`, `month`.
    pub unit: String,
    pub value: u32,
}

impl IntervalDto {
    /// Validates and converts into a domain interval.
    pub fn into_domain(self) -> Result<Interval, ScheduleError> {
        let unit = self
            .unit
            .parse()
            .map_err(|_| ScheduleError::InvalidIntervalUnit(self.unit.clone()))?;
        Interval::new(unit, self.value)
            .map_err(|e| ScheduleError::InvalidInput(e.to_string()))
    }
}

impl From<Interval> for IntervalDto {
    fn from(interval: Interval) -> Self {
        Self {
            unit: interval.unit().as_str().to_owned(),
            value: interval.value(),
        }
    }
}

/// One derived schedule occurrence.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct ScheduleInstanceRes {
    pub schedule_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub item_label: String,
    pub date: NaiveDate,
    /// One of `overdue`, `due_today`, `upcoming`, `completed`.
    pub state: String,
    pub completion_id: Option<Uuid>,
}

impl From<ScheduleInstance> for ScheduleInstanceRes {
    fn from(instance: ScheduleInstance) -> Self {
        let state = match instance.state {
            InstanceState::Overdue => "overdue",
            InstanceState::DueToday => "due_today",
            InstanceState::Upcoming => "upcoming",
            InstanceState::Completed => "completed",
        };
        Self {
            schedule_id: instance.schedule.as_uuid(),
            patient_id: instance.patient.as_uuid(),
            patient_name: instance.patient_name.to_string(),
            item_label: instance.item_label.to_string(),
            date: instance.date,
            state: state.to_owned(),
            completion_id: instance.completion.map(|id| id.as_uuid()),
        }
    }
}

/// Response for the schedule listing endpoint.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct ListSchedulesRes {
    pub instances: Vec<ScheduleInstanceRes>,
}

/// Request to register a recurring schedule.
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct CreateScheduleReq {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub item_id: Uuid,
    pub item_label: String,
    pub interval: IntervalDto,
    pub start_date: NaiveDate,
    pub department_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub care_type: Option<String>,
    pub notes: Option<String>,
}

impl CreateScheduleReq {
    /// Validates and converts into the engine's input type.
    pub fn into_domain(self) -> Result<NewSchedule, ScheduleError> {
        let patient_name = NonEmptyText::new(&self.patient_name)
            .map_err(|_| ScheduleError::InvalidInput("patient_name cannot be empty".into()))?;
        let item_label = NonEmptyText::new(&self.item_label)
            .map_err(|_| ScheduleError::InvalidInput("item_label cannot be empty".into()))?;
        Ok(NewSchedule {
            patient: PatientId::from(self.patient_id),
            patient_name,
            item: ItemId::from(self.item_id),
            item_label,
            interval: self.interval.into_domain()?,
            start_date: self.start_date,
            department: self.department_id.map(DepartmentId::from),
            doctor: self.doctor_id.map(UserId::from),
            care_type: self.care_type,
            notes: self.notes,
        })
    }
}

/// A schedule definition on the wire.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct ScheduleRes {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub item_label: String,
    pub interval: IntervalDto,
    pub start_date: NaiveDate,
    pub last_performed: Option<NaiveDate>,
    /// One of `active`, `paused`, `completed`.
    pub status: String,
    pub organization_id: Uuid,
    pub department_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub care_type: Option<String>,
    pub notes: Option<String>,
}

impl From<ScheduleDefinition> for ScheduleRes {
    fn from(definition: ScheduleDefinition) -> Self {
        let status = match definition.status {
            ScheduleStatus::Active => "active",
            ScheduleStatus::Paused => "paused",
            ScheduleStatus::Completed => "completed",
        };
        Self {
            id: definition.id.as_uuid(),
            patient_id: definition.patient.as_uuid(),
            patient_name: definition.patient_name.to_string(),
            item_label: definition.item_label.to_string(),
            interval: definition.interval.into(),
            start_date: definition.start_date,
            last_performed: definition.last_performed,
            status: status.to_owned(),
            organization_id: definition.organization.as_uuid(),
            department_id: definition.department.map(|id| id.as_uuid()),
            doctor_id: definition.doctor.map(|id| id.as_uuid()),
            care_type: definition.care_type,
            notes: definition.notes,
        }
    }
}

/// Request to record an execution for a schedule's current due occurrence.
#[derive(Debug, Clone, serde::Deserialize, utoipa::ToSchema)]
pub struct CompleteScheduleReq {
    pub executed_date: NaiveDate,
    /// `completed` (default) or `skipped`.
    pub outcome: Option<String>,
    pub notes: Option<String>,
}

impl CompleteScheduleReq {
    /// Resolves the wire outcome string, defaulting to `completed`.
    pub fn outcome(&self) -> Result<ExecutionOutcome, ScheduleError> {
        match self.outcome.as_deref() {
            None | Some("completed") => Ok(ExecutionOutcome::Completed),
            Some("skipped") => Ok(ExecutionOutcome::Skipped),
            Some(other) => Err(ScheduleError::InvalidInput(format!(
                "invalid outcome: {other}"
            ))),
        }
    }
}

/// An execution record on the wire.
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub struct ExecutionRes {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub planned_date: NaiveDate,
    pub executed_date: NaiveDate,
    /// One of `completed`, `skipped`.
    pub outcome: String,
    pub executed_by: Uuid,
    pub notes: Option<String>,
}

impl From<ExecutionRecord> for ExecutionRes {
    fn from(record: ExecutionRecord) -> Self {
        let outcome = match record.outcome {
            ExecutionOutcome::Completed => "completed",
            ExecutionOutcome::Skipped => "skipped",
        };
        Self {
            id: record.id.as_uuid(),
            schedule_id: record.schedule.as_uuid(),
            planned_date: record.planned_date,
            executed_date: record.executed_date,
            outcome: outcome.to_owned(),
            executed_by: record.executed_by.as_uuid(),
            notes: record.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_dto_rejects_unknown_unit() {
        let dto = IntervalDto {
            unit: "fortnight".into(),
            value: 1,
        };
        assert!(matches!(
            dto.into_domain(),
            Err(ScheduleError::InvalidIntervalUnit(u)) if u == "fortnight"
        ));
    }

    #[test]
    fn test_interval_dto_rejects_zero_value() {
        let dto = IntervalDto {
            unit: "week".into(),
            value: 0,
        };
        assert!(matches!(
            dto.into_domain(),
            Err(ScheduleError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_complete_req_outcome_defaults_to_completed() {
        let req: CompleteScheduleReq =
            serde_json::from_str(r#"{"executed_date":"2025-01-29"}"#).unwrap();
        assert_eq!(req.outcome().unwrap(), ExecutionOutcome::Completed);

        let skipped: CompleteScheduleReq =
            serde_json::from_str(r#"{"executed_date":"2025-01-29","outcome":"skipped"}"#).unwrap();
        assert_eq!(skipped.outcome().unwrap(), ExecutionOutcome::Skipped);

        let bad: CompleteScheduleReq =
            serde_json::from_str(r#"{"executed_date":"2025-01-29","outcome":"done"}"#).unwrap();
        assert!(bad.outcome().is_err());
    }

    #[test]
    fn test_create_req_validates_names() {
        let req = CreateScheduleReq {
            patient_id: Uuid::new_v4(),
            patient_name: "   ".into(),
            item_id: Uuid::new_v4(),
            item_label: "B12 injection".into(),
            interval: IntervalDto {
                unit: "week".into(),
                value: 4,
            },
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            department_id: None,
            doctor_id: None,
            care_type: None,
            notes: None,
        };
        assert!(matches!(
            req.into_domain(),
            Err(ScheduleError::InvalidInput(_))
        ));
    }
}
