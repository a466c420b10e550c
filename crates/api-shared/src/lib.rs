//! # API Shared
//!
//! Shared utilities and definitions for the Rota API surface.
//!
//! Contains:
//! - Request/response DTOs with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//!
//! The DTOs keep the wire format decoupled from the engine's domain types:
//! handlers convert at the boundary and the engine never sees raw JSON.

pub mod dto;
pub mod health;

pub use dto::{
    CompleteScheduleReq, CreateScheduleReq, ExecutionRes, HealthRes, IntervalDto,
    ListSchedulesRes, ScheduleInstanceRes, ScheduleRes,
};
pub use health::HealthService;
