// src/handlers/dashboard.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    models::{AnalysisRequest, AnalysisResponse},
    services::{
        analysis::AnalysisScope,
        budget::{BudgetOverview, Period},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
};
use tracing::{debug, warn};

/// Organization-wide budget utilization for a year or a single month
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(Period),
    responses(
        (status = 200, description = "Budget overview", body = BudgetOverview),
        (status = 400, description = "Month outside 1-12"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(period): Query<Period>,
) -> AppResult<Json<BudgetOverview>> {
    Ok(Json(state.ledger.overview(period).await?))
}

/// Ask the summarizer for commentary on the organization or one department.
/// Returns `{"analysis": null}` when the summarizer is disabled or fails.
#[utoipa::path(
    post,
    path = "/api/v1/analysis",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis, or null when unavailable", body = AnalysisResponse),
        (status = 404, description = "Department not found"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn analyze(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<AnalysisRequest>,
) -> AppResult<Json<AnalysisResponse>> {
    let scope = state
        .ledger
        .read(|data| AnalysisScope::from_request(data, &body))
        .await?;
    if !state.analysis.is_enabled() {
        debug!("Analysis requested but ANALYSIS_URL is not set");
        return Ok(Json(AnalysisResponse { analysis: None }));
    }
    debug!(user = %user.id, email = ?user.email, "Requesting analysis: {}", scope.context);

    let analysis = match state.analysis.analyze(&scope).await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!("Analysis failed: {}", e);
            None
        }
    };
    Ok(Json(AnalysisResponse { analysis }))
}
