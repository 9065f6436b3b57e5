// src/handlers/department.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    models::{
        CreateDepartmentRequest, Department, RosterEntry, TrendQuery, UpdateDepartmentRequest,
    },
    services::budget::{DepartmentSummary, Period, TrendPoint},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

/// List all departments with their monthly budgets
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses(
        (status = 200, description = "Departments", body = Vec<Department>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn list_departments(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(state.ledger.departments().await))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Missing name or negative budget"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A department with that name already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn create_department(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateDepartmentRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    let department = state.ledger.add_department(body).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// Rename and/or re-budget a department. A rename is applied to every employee
/// that references the department.
#[utoipa::path(
    put,
    path = "/api/v1/departments/{name}",
    params(("name" = String, Path, description = "Current department name")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found"),
        (status = 409, description = "New name collides with another department"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn update_department(
    user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<UpdateDepartmentRequest>,
) -> AppResult<Json<Department>> {
    let department = state.ledger.update_department(&name, body).await?;
    if department.name != name {
        info!("{} renamed department '{}' to '{}'", user.id, name, department.name);
    }
    Ok(Json(department))
}

/// Delete a department that no active employee references
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{name}",
    params(("name" = String, Path, description = "Department name")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Department still has active employees"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn delete_department(
    user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    state.ledger.delete_department(&name).await?;
    info!("{} deleted department '{}'", user.id, name);
    Ok(StatusCode::NO_CONTENT)
}

/// Budget, spend and category breakdown of one department for a year or month
#[utoipa::path(
    get,
    path = "/api/v1/departments/{name}/summary",
    params(("name" = String, Path, description = "Department name"), Period),
    responses(
        (status = 200, description = "Department summary", body = DepartmentSummary),
        (status = 400, description = "Month outside 1-12"),
        (status = 404, description = "Department not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn department_summary(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(period): Query<Period>,
) -> AppResult<Json<DepartmentSummary>> {
    Ok(Json(state.ledger.department_summary(&name, period).await?))
}

/// Month-by-month payroll and operational spend of one department
#[utoipa::path(
    get,
    path = "/api/v1/departments/{name}/trend",
    params(("name" = String, Path, description = "Department name"), TrendQuery),
    responses(
        (status = 200, description = "Twelve monthly points", body = Vec<TrendPoint>),
        (status = 404, description = "Department not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn department_trend(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<Vec<TrendPoint>>> {
    Ok(Json(state.ledger.department_trend(&name, query.year).await?))
}

/// Active employees working in a department, with their allocated share
#[utoipa::path(
    get,
    path = "/api/v1/departments/{name}/roster",
    params(("name" = String, Path, description = "Department name")),
    responses(
        (status = 200, description = "Roster", body = Vec<RosterEntry>),
        (status = 404, description = "Department not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Departments"
)]
pub async fn department_roster(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<RosterEntry>>> {
    Ok(Json(state.ledger.department_roster(&name).await?))
}
