//! # Rota Core
//!
//! Core scheduling logic for the Rota recurring-procedure system.
//!
//! This crate contains the pure scheduling engine:
//! - next-due-date computation and instance classification (`recurrence`)
//! - role/tenant-scoped visibility decisions and query predicates (`visibility`)
//! - the materialised schedule projection and guarded write paths (`projector`)
//! - the store trait the engine reads and writes through (`store`)
//! - the invalidation event producer mutations publish to (`notify`)
//!
//! **No API concerns**: HTTP servers, header parsing, and status-code mapping
//! belong in `api-shared` and the `rota-run` binary. Authorisation context is
//! an explicit [`Actor`] value passed into every engine call, never ambient
//! state.

pub mod config;
pub mod error;
pub mod notify;
pub mod projector;
pub mod recurrence;
pub mod schedule;
pub mod store;
pub mod visibility;

pub use config::EngineConfig;
pub use error::{ScheduleError, ScheduleResult};
pub use notify::{Invalidation, InvalidationSender};
pub use projector::SchedulerService;
pub use recurrence::{classify, next_due_date, DueStatus};
pub use schedule::{
    DateWindow, ExecutionOutcome, ExecutionRecord, InstanceState, NewSchedule, ScheduleDefinition,
    ScheduleInstance, SchedulePatch, ScheduleStatus,
};
pub use store::{MemoryStore, ScheduleFilters, ScheduleStore};
pub use visibility::{Actor, RecordScope, VisibilityPolicy, VisibilityPredicate};
