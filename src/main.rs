use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_shared::{
    CompleteScheduleReq, CreateScheduleReq, ExecutionRes, HealthRes, HealthService, IntervalDto,
    ListSchedulesRes, ScheduleInstanceRes, ScheduleRes,
};
use rota_core::{
    Actor, DateWindow, EngineConfig, InvalidationSender, MemoryStore, ScheduleError,
    ScheduleFilters, SchedulerService,
};
use rota_types::{DepartmentId, OrganizationId, Role, ScheduleId, UserId};

/// Application state shared across REST API handlers
///
/// Holds the scheduler service every endpoint dispatches into.
#[derive(Clone)]
struct AppState {
    scheduler: SchedulerService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_schedules,
        create_schedule,
        complete_schedule,
        pause_schedule,
        resume_schedule
    ),
    components(schemas(
        HealthRes,
        ListSchedulesRes,
        ScheduleInstanceRes,
        CreateScheduleReq,
        CompleteScheduleReq,
        IntervalDto,
        ScheduleRes,
        ExecutionRes
    ))
)]
struct ApiDoc;

/// Main entry point for the Rota application
///
/// Starts the REST server exposing the schedule projection and its write
/// paths. Actor context arrives as headers set by the upstream auth layer;
/// session issuance itself is out of scope here.
///
/// # Environment Variables
/// - `ROTA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `ROTA_MAX_WINDOW_DAYS`: largest projection window in days (default: 366)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("rota=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("ROTA_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let max_window_days: i64 = std::env::var("ROTA_MAX_WINDOW_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(366);

    tracing::info!("++ Starting Rota REST on {}", rest_addr);

    let (events, mut invalidations) = InvalidationSender::channel(64);

    // The transports (push, polling fallback) would subscribe here; the
    // binary just logs the events so the producer side is observable.
    tokio::spawn(async move {
        while let Ok(event) = invalidations.recv().await {
            tracing::debug!(organization = %event.organization, "schedules invalidated");
        }
    });

    let scheduler = SchedulerService::new(
        Arc::new(MemoryStore::new()),
        events,
        Arc::new(EngineConfig::new(max_window_days)?),
    );

    let app = Router::new()
        .route("/health", get(health))
        .route("/schedules", get(list_schedules))
        .route("/schedules", post(create_schedule))
        .route("/schedules/:id/complete", post(complete_schedule))
        .route("/schedules/:id/pause", post(pause_schedule))
        .route("/schedules/:id/resume", post(resume_schedule))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { scheduler });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the actor from the headers set by the upstream auth layer.
///
/// The engine receives authorisation context only through this value; there
/// is no ambient session state. Missing or malformed headers are a 401 at
/// this boundary, before any engine call.
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, (StatusCode, &'static str)> {
    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    let id = header(headers, "x-actor-id")
        .and_then(|v| UserId::parse(v).ok())
        .ok_or((StatusCode::UNAUTHORIZED, "missing or invalid x-actor-id"))?;
    let role: Role = header(headers, "x-actor-role")
        .and_then(|v| v.parse().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "missing or invalid x-actor-role"))?;

    let organization = match header(headers, "x-organization-id") {
        Some(v) => Some(
            OrganizationId::parse(v)
                .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid x-organization-id"))?,
        ),
        None => None,
    };
    let department = match header(headers, "x-department-id") {
        Some(v) => Some(
            DepartmentId::parse(v)
                .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid x-department-id"))?,
        ),
        None => None,
    };
    let care_type = header(headers, "x-care-type").map(str::to_owned);

    Ok(Actor {
        id,
        role,
        organization,
        department,
        care_type,
    })
}

/// Maps engine errors onto HTTP status codes.
///
/// A denial is surfaced loudly as 403 and kept distinct from 404; the
/// duplicate-completion outcome is the expected 409 the UI resolves by
/// refreshing.
fn error_response(error: ScheduleError) -> (StatusCode, String) {
    let status = match &error {
        ScheduleError::AccessDenied => StatusCode::FORBIDDEN,
        ScheduleError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        ScheduleError::DuplicateExecution { .. } => StatusCode::CONFLICT,
        ScheduleError::InvalidIntervalUnit(_)
        | ScheduleError::InvalidInput(_)
        | ScheduleError::Calendar(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        tracing::warn!("request rejected: {error}");
    }
    (status, error.to_string())
}

#[derive(serde::Deserialize, utoipa::IntoParams)]
struct ListSchedulesQuery {
    /// Window start, inclusive (YYYY-MM-DD).
    start: NaiveDate,
    /// Window end, inclusive (YYYY-MM-DD).
    end: NaiveDate,
    department_id: Option<Uuid>,
    doctor_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/schedules",
    params(ListSchedulesQuery),
    responses(
        (status = 200, description = "Schedule instances in the window", body = ListSchedulesRes),
        (status = 401, description = "Missing or invalid actor headers"),
        (status = 422, description = "Invalid window")
    )
)]
/// Lists the schedule instances visible to the actor in a date window
///
/// Live due instances and completed executions are both returned, each
/// classified and sorted by date. An actor whose visibility matches nothing
/// receives an empty list.
async fn list_schedules(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListSchedulesQuery>,
) -> Result<Json<ListSchedulesRes>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers).map_err(|(s, m)| (s, m.to_owned()))?;
    let window = DateWindow::new(query.start, query.end).map_err(error_response)?;
    let filters = ScheduleFilters {
        department: query.department_id.map(DepartmentId::from),
        doctor: query.doctor_id.map(UserId::from),
    };

    let today = Utc::now().date_naive();
    let instances = state
        .scheduler
        .project(&actor, window, &filters, today)
        .map_err(error_response)?;
    Ok(Json(ListSchedulesRes {
        instances: instances.into_iter().map(ScheduleInstanceRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/schedules",
    request_body = CreateScheduleReq,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleRes),
        (status = 401, description = "Missing or invalid actor headers"),
        (status = 403, description = "Actor may not create schedules"),
        (status = 422, description = "Invalid schedule data")
    )
)]
/// Registers a new recurring schedule in the actor's organization
async fn create_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateScheduleReq>,
) -> Result<(StatusCode, Json<ScheduleRes>), (StatusCode, String)> {
    let actor = actor_from_headers(&headers).map_err(|(s, m)| (s, m.to_owned()))?;
    let input = req.into_domain().map_err(error_response)?;
    let definition = state.scheduler.create(&actor, input).map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(definition.into())))
}

#[utoipa::path(
    post,
    path = "/schedules/{id}/complete",
    request_body = CompleteScheduleReq,
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 201, description = "Execution recorded", body = ExecutionRes),
        (status = 403, description = "Actor may not mutate this schedule"),
        (status = 404, description = "Schedule does not exist"),
        (status = 409, description = "Already completed for this planned date")
    )
)]
/// Records an execution for the schedule's current due occurrence
///
/// A 409 means someone else completed the same occurrence first; the caller
/// refreshes rather than retries.
async fn complete_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<CompleteScheduleReq>,
) -> Result<(StatusCode, Json<ExecutionRes>), (StatusCode, String)> {
    let actor = actor_from_headers(&headers).map_err(|(s, m)| (s, m.to_owned()))?;
    let outcome = req.outcome().map_err(error_response)?;
    let record = state
        .scheduler
        .complete(
            &actor,
            ScheduleId::from(id),
            req.executed_date,
            outcome,
            req.notes,
        )
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    post,
    path = "/schedules/{id}/pause",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule paused", body = ScheduleRes),
        (status = 403, description = "Actor may not mutate this schedule"),
        (status = 404, description = "Schedule does not exist"),
        (status = 422, description = "Schedule is not active")
    )
)]
/// Pauses an active schedule, removing it from live projection
async fn pause_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleRes>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers).map_err(|(s, m)| (s, m.to_owned()))?;
    let definition = state
        .scheduler
        .pause(&actor, ScheduleId::from(id))
        .map_err(error_response)?;
    Ok(Json(definition.into()))
}

#[utoipa::path(
    post,
    path = "/schedules/{id}/resume",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule resumed", body = ScheduleRes),
        (status = 403, description = "Actor may not mutate this schedule"),
        (status = 404, description = "Schedule does not exist"),
        (status = 422, description = "Schedule is not paused")
    )
)]
/// Resumes a paused schedule
async fn resume_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleRes>, (StatusCode, String)> {
    let actor = actor_from_headers(&headers).map_err(|(s, m)| (s, m.to_owned()))?;
    let definition = state
        .scheduler
        .resume(&actor, ScheduleId::from(id))
        .map_err(error_response)?;
    Ok(Json(definition.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(entries: &[(&str, String)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in entries {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_actor_from_headers_parses_full_context() {
        let id = UserId::generate();
        let org = OrganizationId::generate();
        let dept = DepartmentId::generate();
        let map = headers(&[
            ("x-actor-id", id.to_string()),
            ("x-actor-role", "nurse".into()),
            ("x-organization-id", org.to_string()),
            ("x-department-id", dept.to_string()),
            ("x-care-type", "dialysis".into()),
        ]);

        let actor = actor_from_headers(&map).unwrap();
        assert_eq!(actor.id, id);
        assert_eq!(actor.role, Role::Nurse);
        assert_eq!(actor.organization, Some(org));
        assert_eq!(actor.department, Some(dept));
        assert_eq!(actor.care_type.as_deref(), Some("dialysis"));
    }

    #[test]
    fn test_actor_from_headers_rejects_missing_or_bad_input() {
        let map = headers(&[("x-actor-role", "nurse".into())]);
        assert_eq!(
            actor_from_headers(&map).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );

        let map = headers(&[
            ("x-actor-id", UserId::generate().to_string()),
            ("x-actor-role", "root".into()),
        ]);
        assert_eq!(
            actor_from_headers(&map).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );

        let map = headers(&[
            ("x-actor-id", UserId::generate().to_string()),
            ("x-actor-role", "doctor".into()),
            ("x-organization-id", "not-a-uuid".into()),
        ]);
        assert_eq!(
            actor_from_headers(&map).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_error_response_status_mapping() {
        assert_eq!(
            error_response(ScheduleError::AccessDenied).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            error_response(ScheduleError::RecordNotFound(ScheduleId::generate())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(ScheduleError::DuplicateExecution {
                schedule: ScheduleId::generate(),
                planned_date: NaiveDate::from_ymd_opt(2025, 1, 29).unwrap(),
            })
            .0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(ScheduleError::InvalidIntervalUnit("fortnight".into())).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
