// src/handlers/general.rs

use crate::{services::ledger::SyncMode, state::AppState};
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

/// Root handler: service banner with links
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "hr-ledger",
        "description": "Employee directory, department budgets, expenses and payroll",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
        "health": "/health",
        "api": "/api/v1"
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: SyncMode,
    pub departments: usize,
    pub employees: usize,
    pub expenses: usize,
    pub version: &'static str,
}

/// Health check: reports the sync mode chosen at start-up and collection sizes
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (departments, employees, expenses) = state
        .ledger
        .read(|d| (d.departments.len(), d.employees.len(), d.expenses.len()))
        .await;

    Json(HealthResponse {
        status: "healthy",
        mode: state.ledger.mode(),
        departments,
        employees,
        expenses,
        version: env!("CARGO_PKG_VERSION"),
    })
}
