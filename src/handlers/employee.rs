// src/handlers/employee.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    models::{
        BulkTerminateRequest, CreateEmployeeRequest, Employee, EmployeeQuery, PaymentReceipt,
        RecordPaymentRequest, TerminateEmployeeRequest, UpdateEmployeeRequest,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

/// Onboard a new employee with one or more department allocations
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing fields, unknown department or non-positive salary"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn create_employee(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    let employee = state.ledger.add_employee(body).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// List employees, optionally filtered by status, department or search text
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "List of employees", body = Vec<Employee>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn list_employees(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    Ok(Json(state.ledger.employees(&query).await))
}

/// Get a single employee
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee detail", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn get_employee(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<Json<Employee>> {
    Ok(Json(state.ledger.employee(&employee_id).await?))
}

/// Update profile fields, allocations or append documents
#[utoipa::path(
    patch,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee ID")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid field or allocation"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee is terminated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn update_employee(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Json(body): Json<UpdateEmployeeRequest>,
) -> AppResult<Json<Employee>> {
    Ok(Json(state.ledger.update_employee(&employee_id, body).await?))
}

/// Permanently remove an employee record
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn delete_employee(
    user: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> AppResult<StatusCode> {
    state.ledger.delete_employee(&employee_id).await?;
    info!("{} deleted employee {}", user.id, employee_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Terminate an employee, or move the termination date of one already terminated
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/terminate",
    params(("employee_id" = String, Path, description = "Employee ID")),
    request_body = TerminateEmployeeRequest,
    responses(
        (status = 200, description = "Employee terminated", body = Employee),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn terminate_employee(
    user: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Json(body): Json<TerminateEmployeeRequest>,
) -> AppResult<Json<Employee>> {
    let employee = state
        .ledger
        .terminate_employee(&employee_id, body.termination_date)
        .await?;
    info!(
        "{} terminated employee {} effective {}",
        user.id, employee.id, body.termination_date
    );
    Ok(Json(employee))
}

/// Terminate several employees at once; unknown IDs are skipped
#[utoipa::path(
    post,
    path = "/api/v1/employees/terminate",
    request_body = BulkTerminateRequest,
    responses(
        (status = 200, description = "Employees terminated", body = Vec<Employee>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Employees"
)]
pub async fn terminate_employees(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<BulkTerminateRequest>,
) -> AppResult<Json<Vec<Employee>>> {
    let employees = state
        .ledger
        .terminate_employees(&body.employee_ids, body.termination_date)
        .await?;
    info!(
        "{} terminated {} of {} requested employees",
        user.id,
        employees.len(),
        body.employee_ids.len()
    );
    Ok(Json(employees))
}

/// Record a payout; the matching salary expense is booked against the
/// employee's primary department
#[utoipa::path(
    post,
    path = "/api/v1/employees/{employee_id}/payouts",
    params(("employee_id" = String, Path, description = "Employee ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payout and expense recorded", body = PaymentReceipt),
        (status = 400, description = "Non-positive amount"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee is terminated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn record_payment(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Json(body): Json<RecordPaymentRequest>,
) -> AppResult<(StatusCode, Json<PaymentReceipt>)> {
    let receipt = state.ledger.record_payment(&employee_id, body).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
