//! # Rota types
//!
//! Validated leaf types shared across the Rota workspace.
//!
//! Contains:
//! - `NonEmptyText`, a string type that guarantees non-empty content
//! - `Interval`, the recurrence period driving next-due computation
//! - `Role`, the clinical role of an authenticated actor
//! - UUID-backed identifier newtypes for the domain entities

mod ids;
mod interval;
mod role;
mod text;

pub use ids::{
    DepartmentId, ExecutionId, IdError, ItemId, OrganizationId, PatientId, ScheduleId, UserId,
};
pub use interval::{Interval, IntervalError, IntervalUnit};
pub use role::{Role, RoleError};
pub use text::{NonEmptyText, TextError};
