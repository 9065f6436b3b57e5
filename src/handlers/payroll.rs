// src/handlers/payroll.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    models::{PaymentReceipt, PayrollSuggestion, RunPayrollRequest},
    state::AppState,
};
use axum::{Json, extract::State};
use tracing::info;

/// Suggested monthly amount for every active employee, for pre-filling a run
#[utoipa::path(
    get,
    path = "/api/v1/payroll/suggestions",
    responses(
        (status = 200, description = "Suggested payments", body = Vec<PayrollSuggestion>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn payroll_suggestions(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PayrollSuggestion>>> {
    Ok(Json(state.ledger.payroll_suggestions().await))
}

/// Pay the selected employees. Each payment is recorded (payout plus salary
/// expense) and written through before the next one starts.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/run",
    request_body = RunPayrollRequest,
    responses(
        (status = 200, description = "Payments recorded", body = Vec<PaymentReceipt>),
        (status = 400, description = "Empty run or non-positive amount"),
        (status = 404, description = "Unknown employee in the run"),
        (status = 409, description = "Terminated employee in the run"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn run_payroll(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<RunPayrollRequest>,
) -> AppResult<Json<Vec<PaymentReceipt>>> {
    info!(
        "{} started a {} run for {} employees",
        user.id,
        body.payout_type,
        body.payments.len()
    );
    Ok(Json(state.ledger.run_payroll(body).await?))
}
