//! The schedule projection and its guarded write paths.
//!
//! [`SchedulerService`] composes the calendar arithmetic, the recurrence
//! engine and the visibility policy over a [`ScheduleStore`]. `project` is a
//! pure read: it regenerates the instance list on every call and holds no
//! state between calls, so callers may abandon a projection at any point and
//! re-run it with arbitrary concurrency. The write paths (`create`,
//! `complete`, `pause`, `resume`, `edit`) are each guarded by the same
//! per-record visibility check and publish an invalidation event on success.

use std::sync::Arc;

use chrono::NaiveDate;
use rota_types::{ExecutionId, ScheduleId};

use crate::config::EngineConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::notify::InvalidationSender;
use crate::recurrence::{classify, next_due_date, DueStatus};
use crate::schedule::{
    DateWindow, ExecutionOutcome, ExecutionRecord, InstanceState, NewSchedule, ScheduleDefinition,
    ScheduleInstance, SchedulePatch, ScheduleStatus,
};
use crate::store::{ScheduleFilters, ScheduleStore};
use crate::visibility::{Actor, VisibilityPolicy};

impl From<DueStatus> for InstanceState {
    fn from(status: DueStatus) -> Self {
        match status {
            DueStatus::Overdue => InstanceState::Overdue,
            DueStatus::DueToday => InstanceState::DueToday,
            DueStatus::Upcoming => InstanceState::Upcoming,
        }
    }
}

/// Scheduling operations over a store - no API concerns.
#[derive(Clone)]
pub struct SchedulerService {
    store: Arc<dyn ScheduleStore>,
    events: InvalidationSender,
    config: Arc<EngineConfig>,
}

impl SchedulerService {
    /// Creates a new instance of SchedulerService.
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        events: InvalidationSender,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Materialises the schedule instances visible to `actor` inside the
    /// window.
    ///
    /// Live instances are derived from `Active` definitions: the next due
    /// date is computed from the last performed date (or the start date when
    /// never performed), classified against `today`, and clipped to the
    /// window. Completed instances are derived from execution records whose
    /// executed date falls inside the window; they are additive, so a
    /// calendar view shows both what was done and what remains due. The
    /// result is stable-sorted by date, ties broken by patient name.
    ///
    /// A deny-all predicate yields an empty list: for bulk reads the
    /// predicate legitimately matches zero rows. Direct mutations against a
    /// forbidden record raise [`ScheduleError::AccessDenied`] instead.
    pub fn project(
        &self,
        actor: &Actor,
        window: DateWindow,
        filters: &ScheduleFilters,
        today: NaiveDate,
    ) -> ScheduleResult<Vec<ScheduleInstance>> {
        if window.len_days() > self.config.max_window_days() {
            return Err(ScheduleError::InvalidInput(format!(
                "window of {} days exceeds the maximum of {}",
                window.len_days(),
                self.config.max_window_days()
            )));
        }

        let predicate = VisibilityPolicy::predicate(actor);
        if predicate.is_deny_all() {
            return Ok(Vec::new());
        }

        let definitions = self.store.find_schedules(&predicate, filters)?;
        let executions = self.store.find_executions(&predicate, &window)?;

        // An execution takes priority over the live projection for its
        // planned date, so a just-completed occurrence is not shown twice.
        let completed_keys: std::collections::HashSet<(ScheduleId, NaiveDate)> = executions
            .iter()
            .map(|record| (record.schedule, record.planned_date))
            .collect();

        let mut instances = Vec::new();
        for definition in &definitions {
            if definition.status != ScheduleStatus::Active {
                continue;
            }
            let due = next_due_date(definition.anchor_date(), &definition.interval);
            if !window.contains(due) || completed_keys.contains(&(definition.id, due)) {
                continue;
            }
            instances.push(ScheduleInstance {
                schedule: definition.id,
                patient: definition.patient,
                patient_name: definition.patient_name.clone(),
                item_label: definition.item_label.clone(),
                date: due,
                state: classify(due, today).into(),
                completion: None,
            });
        }

        for record in &executions {
            // The definition is in scope whenever the execution is; a miss
            // means the store and predicate disagree, so skip defensively.
            let Some(definition) = definitions.iter().find(|d| d.id == record.schedule) else {
                continue;
            };
            instances.push(ScheduleInstance {
                schedule: record.schedule,
                patient: definition.patient,
                patient_name: definition.patient_name.clone(),
                item_label: definition.item_label.clone(),
                date: record.executed_date,
                state: InstanceState::Completed,
                completion: Some(record.id),
            });
        }

        instances.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.patient_name.cmp(&b.patient_name))
        });
        Ok(instances)
    }

    /// Registers a new recurring schedule in the actor's organization.
    ///
    /// Only admins and nurses register procedures; the creator must also be
    /// able to see the record being created.
    pub fn create(&self, actor: &Actor, input: NewSchedule) -> ScheduleResult<ScheduleDefinition> {
        if !matches!(actor.role, rota_types::Role::Admin | rota_types::Role::Nurse) {
            return Err(ScheduleError::AccessDenied);
        }
        let Some(organization) = actor.organization else {
            return Err(ScheduleError::AccessDenied);
        };

        let definition = ScheduleDefinition {
            id: ScheduleId::generate(),
            patient: input.patient,
            patient_name: input.patient_name,
            item: input.item,
            item_label: input.item_label,
            interval: input.interval,
            start_date: input.start_date,
            last_performed: None,
            status: ScheduleStatus::Active,
            organization,
            department: input.department,
            doctor: input.doctor,
            nurse_owner: (actor.role == rota_types::Role::Nurse).then_some(actor.id),
            care_type: input.care_type,
            notes: input.notes,
        };
        VisibilityPolicy::check(actor, &definition.scope())?;

        let definition = self.store.insert_schedule(definition)?;
        tracing::info!(schedule = %definition.id, actor = %actor.id, "schedule created");
        self.events.publish(organization);
        Ok(definition)
    }

    /// Records an execution for the schedule's current due occurrence and
    /// advances the recurrence.
    ///
    /// The planned date is the due date at the time of completion. A second
    /// completion for the same planned date fails with
    /// [`ScheduleError::DuplicateExecution`]; callers treat that as "already
    /// completed by someone else" and refresh, not as a fault. A `Skipped`
    /// outcome consumes the occurrence without claiming the procedure was
    /// performed, so the recurrence advances from the planned date instead
    /// of the executed date.
    pub fn complete(
        &self,
        actor: &Actor,
        schedule: ScheduleId,
        executed_date: NaiveDate,
        outcome: ExecutionOutcome,
        notes: Option<String>,
    ) -> ScheduleResult<ExecutionRecord> {
        let definition = self.load_guarded(actor, schedule)?;
        if definition.status != ScheduleStatus::Active {
            return Err(ScheduleError::InvalidInput(format!(
                "schedule {schedule} is not active"
            )));
        }

        let planned_date = next_due_date(definition.anchor_date(), &definition.interval);
        let record = self.store.insert_execution(ExecutionRecord {
            id: ExecutionId::generate(),
            schedule,
            organization: definition.organization,
            planned_date,
            executed_date,
            outcome,
            executed_by: actor.id,
            notes,
        })?;

        let advanced_from = match outcome {
            ExecutionOutcome::Completed => executed_date,
            ExecutionOutcome::Skipped => planned_date,
        };
        self.store.update_schedule(
            schedule,
            SchedulePatch {
                last_performed: Some(advanced_from),
                ..Default::default()
            },
        )?;

        tracing::info!(
            %schedule,
            actor = %actor.id,
            %planned_date,
            %executed_date,
            "execution recorded"
        );
        self.events.publish(definition.organization);
        Ok(record)
    }

    /// Pauses an active schedule, removing it from live projection.
    pub fn pause(&self, actor: &Actor, schedule: ScheduleId) -> ScheduleResult<ScheduleDefinition> {
        self.transition(actor, schedule, ScheduleStatus::Active, ScheduleStatus::Paused)
    }

    /// Resumes a paused schedule.
    pub fn resume(
        &self,
        actor: &Actor,
        schedule: ScheduleId,
    ) -> ScheduleResult<ScheduleDefinition> {
        self.transition(actor, schedule, ScheduleStatus::Paused, ScheduleStatus::Active)
    }

    /// Applies an edit to a schedule the actor may mutate.
    pub fn edit(
        &self,
        actor: &Actor,
        schedule: ScheduleId,
        patch: SchedulePatch,
    ) -> ScheduleResult<ScheduleDefinition> {
        let definition = self.load_guarded(actor, schedule)?;
        let updated = self.store.update_schedule(schedule, patch)?;
        tracing::info!(%schedule, actor = %actor.id, "schedule edited");
        self.events.publish(definition.organization);
        Ok(updated)
    }

    /// Fetches a definition and runs the per-record visibility check.
    ///
    /// A missing id is [`ScheduleError::RecordNotFound`]; a record the actor
    /// may not touch is [`ScheduleError::AccessDenied`]. The two are never
    /// conflated.
    fn load_guarded(
        &self,
        actor: &Actor,
        schedule: ScheduleId,
    ) -> ScheduleResult<ScheduleDefinition> {
        let definition = self
            .store
            .get_schedule(schedule)?
            .ok_or(ScheduleError::RecordNotFound(schedule))?;
        VisibilityPolicy::check(actor, &definition.scope())?;
        Ok(definition)
    }

    fn transition(
        &self,
        actor: &Actor,
        schedule: ScheduleId,
        from: ScheduleStatus,
        to: ScheduleStatus,
    ) -> ScheduleResult<ScheduleDefinition> {
        let definition = self.load_guarded(actor, schedule)?;
        if definition.status != from {
            return Err(ScheduleError::InvalidInput(format!(
                "schedule {schedule} is not in the required state"
            )));
        }
        let updated = self.store.update_schedule(
            schedule,
            SchedulePatch {
                status: Some(to),
                ..Default::default()
            },
        )?;
        tracing::info!(%schedule, actor = %actor.id, status = ?to, "schedule state changed");
        self.events.publish(definition.organization);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rota_types::{
        DepartmentId, Interval, IntervalUnit, ItemId, NonEmptyText, OrganizationId, PatientId,
        Role, UserId,
    };

    fn date(s: &str) -> NaiveDate {
        rota_calendar::parse_date(s).unwrap()
    }

    struct Fixture {
        service: SchedulerService,
        org: OrganizationId,
        dept: DepartmentId,
    }

    impl Fixture {
        fn new() -> Self {
            let (events, _rx) = InvalidationSender::channel(16);
            Self {
                service: SchedulerService::new(
                    Arc::new(MemoryStore::new()),
                    events,
                    Arc::new(EngineConfig::default()),
                ),
                org: OrganizationId::generate(),
                dept: DepartmentId::generate(),
            }
        }

        fn nurse(&self) -> Actor {
            Actor {
                id: UserId::generate(),
                role: Role::Nurse,
                organization: Some(self.org),
                department: Some(self.dept),
                care_type: None,
            }
        }

        fn admin(&self) -> Actor {
            Actor {
                id: UserId::generate(),
                role: Role::Admin,
                organization: Some(self.org),
                department: None,
                care_type: None,
            }
        }

        fn super_admin(&self) -> Actor {
            Actor {
                id: UserId::generate(),
                role: Role::SuperAdmin,
                organization: None,
                department: None,
                care_type: None,
            }
        }

        fn four_weekly(&self, patient_name: &str) -> NewSchedule {
            NewSchedule {
                patient: PatientId::generate(),
                patient_name: NonEmptyText::new(patient_name).unwrap(),
                item: ItemId::generate(),
                item_label: NonEmptyText::new("B12 injection").unwrap(),
                interval: Interval::new(IntervalUnit::Week, 4).unwrap(),
                start_date: date("2025-01-01"),
                department: Some(self.dept),
                doctor: None,
                care_type: None,
                notes: None,
            }
        }

        fn window(&self) -> DateWindow {
            DateWindow::new(date("2025-01-25"), date("2025-02-05")).unwrap()
        }
    }

    #[test]
    fn test_four_weekly_schedule_is_due_in_window() {
        let fx = Fixture::new();
        let nurse = fx.nurse();
        let def = fx.service.create(&nurse, fx.four_weekly("Ada Lovelace")).unwrap();
        fx.service
            .edit(
                &nurse,
                def.id,
                SchedulePatch {
                    last_performed: Some(date("2025-01-01")),
                    ..Default::default()
                },
            )
            .unwrap();

        let instances = fx
            .service
            .project(
                &nurse,
                fx.window(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].date, date("2025-01-29"));
        assert_eq!(instances[0].state, InstanceState::DueToday);

        // A day later the same instance is overdue.
        let later = fx
            .service
            .project(
                &nurse,
                fx.window(),
                &ScheduleFilters::default(),
                date("2025-01-30"),
            )
            .unwrap();
        assert_eq!(later[0].state, InstanceState::Overdue);
    }

    #[test]
    fn test_completion_replaces_live_instance_with_completed() {
        let fx = Fixture::new();
        let nurse = fx.nurse();
        let def = fx.service.create(&nurse, fx.four_weekly("Ada Lovelace")).unwrap();
        fx.service
            .edit(
                &nurse,
                def.id,
                SchedulePatch {
                    last_performed: Some(date("2025-01-01")),
                    ..Default::default()
                },
            )
            .unwrap();

        let record = fx
            .service
            .complete(
                &nurse,
                def.id,
                date("2025-01-29"),
                ExecutionOutcome::Completed,
                None,
            )
            .unwrap();
        assert_eq!(record.planned_date, date("2025-01-29"));

        let instances = fx
            .service
            .project(
                &nurse,
                fx.window(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        // The completed occurrence shows; the next live due date (Feb 26)
        // falls outside this window.
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].state, InstanceState::Completed);
        assert_eq!(instances[0].completion, Some(record.id));

        let wide = fx
            .service
            .project(
                &nurse,
                DateWindow::new(date("2025-01-25"), date("2025-03-05")).unwrap(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        // Wider window: the completed instance plus the next live due date.
        assert_eq!(wide.len(), 2);
        assert_eq!(wide[0].state, InstanceState::Completed);
        assert_eq!(wide[1].date, date("2025-02-26"));
        assert_eq!(wide[1].state, InstanceState::Upcoming);
    }

    #[test]
    fn test_double_completion_is_duplicate_and_first_record_stands() {
        let fx = Fixture::new();
        let nurse = fx.nurse();
        let def = fx.service.create(&nurse, fx.four_weekly("Ada Lovelace")).unwrap();

        let planned = next_due_date(def.anchor_date(), &def.interval);
        let first = fx
            .service
            .complete(&nurse, def.id, planned, ExecutionOutcome::Completed, None)
            .unwrap();

        // Second writer: reset the anchor so the planned date collides again,
        // as it would for a concurrent completion of the same occurrence.
        fx.service
            .edit(
                &nurse,
                def.id,
                SchedulePatch {
                    last_performed: Some(def.start_date),
                    ..Default::default()
                },
            )
            .unwrap();
        let second = fx
            .service
            .complete(&nurse, def.id, planned, ExecutionOutcome::Completed, None);
        assert!(matches!(
            second,
            Err(ScheduleError::DuplicateExecution { planned_date, .. })
                if planned_date == planned
        ));

        let window = DateWindow::new(planned, planned).unwrap();
        let instances = fx
            .service
            .project(&nurse, window, &ScheduleFilters::default(), planned)
            .unwrap();
        let completed: Vec<_> = instances
            .iter()
            .filter(|i| i.state == InstanceState::Completed)
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].completion, Some(first.id));
    }

    #[test]
    fn test_paused_schedule_is_excluded_until_resumed() {
        let fx = Fixture::new();
        let nurse = fx.nurse();
        let def = fx.service.create(&nurse, fx.four_weekly("Ada Lovelace")).unwrap();
        fx.service
            .edit(
                &nurse,
                def.id,
                SchedulePatch {
                    last_performed: Some(date("2025-01-01")),
                    ..Default::default()
                },
            )
            .unwrap();

        fx.service.pause(&nurse, def.id).unwrap();
        let instances = fx
            .service
            .project(
                &nurse,
                fx.window(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        assert!(instances.is_empty());

        // Pausing twice is an invalid transition, not a silent no-op.
        assert!(matches!(
            fx.service.pause(&nurse, def.id),
            Err(ScheduleError::InvalidInput(_))
        ));

        fx.service.resume(&nurse, def.id).unwrap();
        let instances = fx
            .service
            .project(
                &nurse,
                fx.window(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        assert_eq!(instances.len(), 1);
    }

    #[test]
    fn test_super_admin_mutation_is_denied_not_hidden() {
        let fx = Fixture::new();
        let nurse = fx.nurse();
        let def = fx.service.create(&nurse, fx.four_weekly("Ada Lovelace")).unwrap();

        let result = fx.service.complete(
            &fx.super_admin(),
            def.id,
            date("2025-01-29"),
            ExecutionOutcome::Completed,
            None,
        );
        assert!(matches!(result, Err(ScheduleError::AccessDenied)));

        // Listing for a SuperAdmin is the empty set, not an error.
        let instances = fx
            .service
            .project(
                &fx.super_admin(),
                fx.window(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        assert!(instances.is_empty());
    }

    #[test]
    fn test_missing_schedule_is_not_found_not_denied() {
        let fx = Fixture::new();
        let result = fx.service.pause(&fx.nurse(), ScheduleId::generate());
        assert!(matches!(result, Err(ScheduleError::RecordNotFound(_))));
    }

    #[test]
    fn test_doctor_cannot_create_schedules() {
        let fx = Fixture::new();
        let doctor = Actor {
            id: UserId::generate(),
            role: Role::Doctor,
            organization: Some(fx.org),
            department: None,
            care_type: None,
        };
        assert!(matches!(
            fx.service.create(&doctor, fx.four_weekly("Ada Lovelace")),
            Err(ScheduleError::AccessDenied)
        ));
    }

    #[test]
    fn test_instances_sorted_by_date_then_patient_name() {
        let fx = Fixture::new();
        let admin = fx.admin();

        let mut early = fx.four_weekly("Zed Shaw");
        early.start_date = date("2025-01-01");
        let mut same_day_a = fx.four_weekly("Ada Lovelace");
        same_day_a.start_date = date("2025-01-03");
        let mut same_day_b = fx.four_weekly("Grace Hopper");
        same_day_b.start_date = date("2025-01-03");
        for input in [early, same_day_a, same_day_b] {
            fx.service.create(&admin, input).unwrap();
        }

        let instances = fx
            .service
            .project(
                &admin,
                DateWindow::new(date("2025-01-01"), date("2025-02-28")).unwrap(),
                &ScheduleFilters::default(),
                date("2025-01-29"),
            )
            .unwrap();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].date, date("2025-01-29"));
        assert_eq!(instances[0].patient_name.as_str(), "Zed Shaw");
        assert_eq!(instances[1].patient_name.as_str(), "Ada Lovelace");
        assert_eq!(instances[2].patient_name.as_str(), "Grace Hopper");
    }

    #[test]
    fn test_window_limit_enforced() {
        let fx = Fixture::new();
        let result = fx.service.project(
            &fx.admin(),
            DateWindow::new(date("2025-01-01"), date("2027-01-01")).unwrap(),
            &ScheduleFilters::default(),
            date("2025-01-01"),
        );
        assert!(matches!(result, Err(ScheduleError::InvalidInput(_))));
    }

    #[test]
    fn test_skipped_outcome_advances_from_planned_date() {
        let fx = Fixture::new();
        let nurse = fx.nurse();
        let def = fx.service.create(&nurse, fx.four_weekly("Ada Lovelace")).unwrap();

        let planned = next_due_date(def.start_date, &def.interval);
        let record = fx
            .service
            .complete(
                &nurse,
                def.id,
                date("2025-02-10"),
                ExecutionOutcome::Skipped,
                Some("patient unavailable".into()),
            )
            .unwrap();
        assert_eq!(record.outcome, ExecutionOutcome::Skipped);

        let updated = fx.service.edit(&nurse, def.id, SchedulePatch::default()).unwrap();
        // The recurrence advanced from the planned date, not the (later)
        // executed date.
        assert_eq!(updated.last_performed, Some(planned));
    }
}
