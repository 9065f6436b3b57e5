// src/handlers/expense.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    models::{
        CreateExpenseRequest, DeleteExpensesRequest, DeleteExpensesResponse, Expense,
        ExpenseQuery,
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::info;

/// Expense ledger for a year or month, newest first
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Matching expenses", body = Vec<Expense>),
        (status = 400, description = "Month outside 1-12"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn list_expenses(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> AppResult<Json<Vec<Expense>>> {
    Ok(Json(state.ledger.expenses(&query).await?))
}

/// Log an operational expense. Salary expenses come from payouts only.
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = Expense),
        (status = 400, description = "Invalid amount, department or category"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn create_expense(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateExpenseRequest>,
) -> AppResult<(StatusCode, Json<Expense>)> {
    let expense = state.ledger.add_expense(body).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// Delete several expenses by ID
#[utoipa::path(
    post,
    path = "/api/v1/expenses/delete",
    request_body = DeleteExpensesRequest,
    responses(
        (status = 200, description = "Number of expenses removed", body = DeleteExpensesResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Expenses"
)]
pub async fn delete_expenses(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<DeleteExpensesRequest>,
) -> AppResult<Json<DeleteExpensesResponse>> {
    let deleted = state.ledger.delete_expenses(&body.ids).await?;
    info!("{} deleted {} expenses", user.id, deleted);
    Ok(Json(DeleteExpensesResponse { deleted }))
}
