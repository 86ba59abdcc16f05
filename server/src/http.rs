use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        FromRequestParts, Multipart, Path, Query, State, multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{self, HeaderName, HeaderValue, Method, StatusCode, request::Parts},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use platform_api::{ApiError, ApiResult, Envelope};
use platform_db::DbPool;
use products_hr::{
    Department, Employee, EmployeeDraft, EmployeeWithProjects, HrModule, IdField, Page, Project,
    SeaOrmStore, SweepReport, TenureReport, import,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;

pub type Hr = HrModule<SeaOrmStore>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub hr: Arc<Hr>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Arc<AppConfig>) -> Self {
        let hr = HrModule::new(SeaOrmStore::new(pool.clone()))
            .with_stale_after_months(config.sweep.stale_after_months);
        Self {
            pool,
            hr: Arc::new(hr),
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let layer = CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);
    // credentials cannot be combined with a wildcard origin
    if allowed.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        layer
            .allow_credentials(true)
            .allow_origin(AllowOrigin::list(allowed))
    }
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/departments", post(create_department))
        .route("/projects", post(create_project))
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/search", get(search_employees))
        .route("/employees/bulk", post(bulk_import))
        .route("/employees/deactivate-inactive", post(deactivate_inactive))
        .route("/employees/{id}", get(get_employee).delete(soft_delete))
        .route("/employees/{id}/salary", put(update_salary))
        .route("/employees/{id}/projects", post(assign_project))
        .route("/employees/{id}/tenure", get(tenure))
        .route("/employees/{id}/transfer", put(transfer))
        .route("/employees/{id}/activity", post(record_activity))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Employee id taken from the path. Anything that is not a positive integer
/// cannot name an employee, so it is reported as not found.
struct EmployeeId(i32);

impl<S: Send + Sync> FromRequestParts<S> for EmployeeId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::not_found("Employee not found"))?;
        raw.trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(EmployeeId)
            .ok_or_else(|| ApiError::not_found("Employee not found"))
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

fn required_id(value: Option<IdField>, message: &str) -> ApiResult<i32> {
    value
        .as_ref()
        .and_then(IdField::parse)
        .ok_or_else(|| ApiError::validation(message))
}

#[derive(Debug, Default, Deserialize)]
struct NamePayload {
    name: Option<String>,
}

async fn create_department(
    State(state): State<AppState>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Department>>)> {
    let payload = json_body(payload)?;
    let department = state.hr.departments.create(payload.name).await?;
    Ok(Envelope::success("Department created successfully", department).created())
}

async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Project>>)> {
    let payload = json_body(payload)?;
    let project = state.hr.projects.create(payload.name).await?;
    Ok(Envelope::success("Project created successfully", project).created())
}

/// Page parameters arrive as free text; anything unparsable falls back to
/// the defaults.
#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
}

async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    let parse = |raw: Option<String>| raw.and_then(|value| value.trim().parse::<u64>().ok());
    let page = Page::from_request(parse(query.page), parse(query.limit));
    let employees = state.hr.employees.list(page).await?;
    Ok(Json(employees))
}

async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Employee>>)> {
    let draft = json_body(payload)?;
    let employee = state.hr.employees.create(draft).await?;
    Ok(Envelope::success("Employee created successfully", employee).created())
}

async fn get_employee(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
) -> ApiResult<Json<EmployeeWithProjects>> {
    Ok(Json(state.hr.employees.get(id).await?))
}

#[derive(Debug, Default, Deserialize)]
struct SalaryPayload {
    salary: Option<f64>,
}

async fn update_salary(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
    payload: Result<Json<SalaryPayload>, JsonRejection>,
) -> ApiResult<Envelope<Employee>> {
    let payload = json_body(payload)?;
    let employee = state.hr.employees.update_salary(id, payload.salary).await?;
    Ok(Envelope::success("Salary updated successfully", employee))
}

async fn soft_delete(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
) -> ApiResult<Envelope<Employee>> {
    let employee = state.hr.employees.soft_delete(id).await?;
    Ok(Envelope::success("Employee deactivated successfully", employee))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    name: Option<String>,
}

async fn search_employees(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Employee>>> {
    let employees = state.hr.employees.search_by_name(query.name).await?;
    Ok(Json(employees))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignPayload {
    project_id: Option<IdField>,
}

async fn assign_project(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
    payload: Result<Json<AssignPayload>, JsonRejection>,
) -> ApiResult<Envelope<EmployeeWithProjects>> {
    let payload = json_body(payload)?;
    let project_id = required_id(payload.project_id, "Project ID is required")?;
    let employee = state.hr.employees.assign_to_project(id, project_id).await?;
    Ok(Envelope::success(
        "Employee assigned to project successfully",
        employee,
    ))
}

async fn tenure(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
) -> ApiResult<Json<TenureReport>> {
    Ok(Json(state.hr.employees.calculate_tenure(id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferPayload {
    department_id: Option<IdField>,
}

async fn transfer(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
    payload: Result<Json<TransferPayload>, JsonRejection>,
) -> ApiResult<Envelope<Employee>> {
    let payload = json_body(payload)?;
    let department_id = required_id(payload.department_id, "Department ID is required")?;
    let employee = state
        .hr
        .employees
        .transfer_department(id, department_id)
        .await?;
    Ok(Envelope::success("Employee transferred successfully", employee))
}

async fn record_activity(
    State(state): State<AppState>,
    EmployeeId(id): EmployeeId,
) -> ApiResult<Envelope<Employee>> {
    let employee = state.hr.employees.record_activity(id).await?;
    Ok(Envelope::success("Activity recorded", employee))
}

async fn bulk_import(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Vec<Employee>>>)> {
    let mut multipart = multipart.map_err(|_| ApiError::validation("No file uploaded"))?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::validation(err.body_text()))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::validation("No file uploaded"))?;
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(ApiError::validation("Only CSV files are allowed"));
    }

    let drafts = import::parse_csv(&bytes)?;
    let imported = state.hr.employees.bulk_create(drafts).await?;
    Ok(Envelope::success(
        format!("Successfully imported {} employees", imported.len()),
        imported,
    )
    .created())
}

async fn deactivate_inactive(State(state): State<AppState>) -> ApiResult<Envelope<SweepReport>> {
    let report = state.hr.employees.deactivate_inactive_employees().await?;
    Ok(Envelope::success(
        format!("Deactivated {} inactive employees", report.deactivated_count),
        report,
    ))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}
