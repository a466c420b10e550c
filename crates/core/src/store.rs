//! The storage seam of the scheduling engine.
//!
//! [`ScheduleStore`] is the narrow interface the engine reads and writes
//! through. The visibility predicate passed into the find methods is exactly
//! the one [`crate::VisibilityPolicy`] produced; the store applies it as-is
//! and must not re-derive or second-guess it.
//!
//! [`MemoryStore`] is the in-process implementation used by the binary and
//! the test suite. It enforces the one invariant that belongs at the store
//! layer: uniqueness of `(schedule, planned_date)` across execution records.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::NaiveDate;
use rota_types::{DepartmentId, ScheduleId, UserId};

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::{DateWindow, ExecutionRecord, ScheduleDefinition, SchedulePatch};
use crate::visibility::VisibilityPredicate;

/// Caller-supplied narrowing filters, applied on top of the visibility
/// predicate (they can only shrink the result set, never widen it).
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilters {
    pub department: Option<DepartmentId>,
    pub doctor: Option<UserId>,
}

impl ScheduleFilters {
    fn matches(&self, definition: &ScheduleDefinition) -> bool {
        if let Some(dept) = self.department {
            if definition.department != Some(dept) {
                return false;
            }
        }
        if let Some(doctor) = self.doctor {
            if definition.doctor != Some(doctor) {
                return false;
            }
        }
        true
    }
}

/// Narrow store interface consumed by the engine.
pub trait ScheduleStore: Send + Sync {
    /// Returns the schedule definitions matching the visibility predicate and
    /// the caller filters.
    fn find_schedules(
        &self,
        predicate: &VisibilityPredicate,
        filters: &ScheduleFilters,
    ) -> ScheduleResult<Vec<ScheduleDefinition>>;

    /// Returns execution records with `executed_date` inside the window,
    /// scoped by the same visibility predicate as the owning schedule.
    fn find_executions(
        &self,
        predicate: &VisibilityPredicate,
        window: &DateWindow,
    ) -> ScheduleResult<Vec<ExecutionRecord>>;

    /// Fetches one definition by id, without any visibility filtering. The
    /// caller is responsible for the per-record check before acting on it.
    fn get_schedule(&self, id: ScheduleId) -> ScheduleResult<Option<ScheduleDefinition>>;

    /// Persists a new definition.
    fn insert_schedule(&self, definition: ScheduleDefinition) -> ScheduleResult<ScheduleDefinition>;

    /// Persists an execution record; fails with
    /// [`ScheduleError::DuplicateExecution`] when one already exists for the
    /// same `(schedule, planned_date)`.
    fn insert_execution(&self, record: ExecutionRecord) -> ScheduleResult<ExecutionRecord>;

    /// Applies a partial update to a definition.
    fn update_schedule(
        &self,
        id: ScheduleId,
        patch: SchedulePatch,
    ) -> ScheduleResult<ScheduleDefinition>;
}

#[derive(Default)]
struct MemoryInner {
    schedules: HashMap<ScheduleId, ScheduleDefinition>,
    executions: Vec<ExecutionRecord>,
    execution_keys: HashSet<(ScheduleId, NaiveDate)>,
}

/// In-memory store backed by a `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ScheduleResult<std::sync::RwLockReadGuard<'_, MemoryInner>> {
        self.inner
            .read()
            .map_err(|_| ScheduleError::InvalidInput("store lock poisoned".into()))
    }

    fn write(&self) -> ScheduleResult<std::sync::RwLockWriteGuard<'_, MemoryInner>> {
        self.inner
            .write()
            .map_err(|_| ScheduleError::InvalidInput("store lock poisoned".into()))
    }
}

impl ScheduleStore for MemoryStore {
    fn find_schedules(
        &self,
        predicate: &VisibilityPredicate,
        filters: &ScheduleFilters,
    ) -> ScheduleResult<Vec<ScheduleDefinition>> {
        let inner = self.read()?;
        Ok(inner
            .schedules
            .values()
            .filter(|def| predicate.matches(&def.scope()) && filters.matches(def))
            .cloned()
            .collect())
    }

    fn find_executions(
        &self,
        predicate: &VisibilityPredicate,
        window: &DateWindow,
    ) -> ScheduleResult<Vec<ExecutionRecord>> {
        let inner = self.read()?;
        Ok(inner
            .executions
            .iter()
            .filter(|record| {
                if !window.contains(record.executed_date) {
                    return false;
                }
                // Scope comes from the owning schedule; an execution whose
                // definition vanished is treated as out of scope.
                inner
                    .schedules
                    .get(&record.schedule)
                    .is_some_and(|def| predicate.matches(&def.scope()))
            })
            .cloned()
            .collect())
    }

    fn get_schedule(&self, id: ScheduleId) -> ScheduleResult<Option<ScheduleDefinition>> {
        Ok(self.read()?.schedules.get(&id).cloned())
    }

    fn insert_schedule(&self, definition: ScheduleDefinition) -> ScheduleResult<ScheduleDefinition> {
        let mut inner = self.write()?;
        inner.schedules.insert(definition.id, definition.clone());
        Ok(definition)
    }

    fn insert_execution(&self, record: ExecutionRecord) -> ScheduleResult<ExecutionRecord> {
        let mut inner = self.write()?;
        let key = (record.schedule, record.planned_date);
        if !inner.execution_keys.insert(key) {
            return Err(ScheduleError::DuplicateExecution {
                schedule: record.schedule,
                planned_date: record.planned_date,
            });
        }
        inner.executions.push(record.clone());
        Ok(record)
    }

    fn update_schedule(
        &self,
        id: ScheduleId,
        patch: SchedulePatch,
    ) -> ScheduleResult<ScheduleDefinition> {
        let mut inner = self.write()?;
        let definition = inner
            .schedules
            .get_mut(&id)
            .ok_or(ScheduleError::RecordNotFound(id))?;

        if let Some(interval) = patch.interval {
            definition.interval = interval;
        }
        if let Some(status) = patch.status {
            definition.status = status;
        }
        if let Some(last_performed) = patch.last_performed {
            definition.last_performed = Some(last_performed);
        }
        if let Some(department) = patch.department {
            definition.department = department;
        }
        if let Some(doctor) = patch.doctor {
            definition.doctor = doctor;
        }
        if let Some(notes) = patch.notes {
            definition.notes = notes;
        }
        Ok(definition.clone())
    }
}
