// src/services/analysis.rs

use crate::{
    config::Config,
    errors::AppError,
    models::{AnalysisRequest, AnalysisResult, Employee, Expense, LedgerSnapshot},
    services::budget::Period,
};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

const CURRENCY: &str = "INR";

/// The slice of the ledger an analysis is run over.
#[derive(Debug, Clone)]
pub struct AnalysisScope {
    pub context: String,
    pub employees: Vec<Employee>,
    pub expenses: Vec<Expense>,
    pub budgets: Vec<BudgetLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub department: String,
    pub amount: Decimal,
}

impl AnalysisScope {
    /// Active employees and the matching expenses, narrowed to one department
    /// and/or period when the request asks for it.
    pub fn from_request(data: &LedgerSnapshot, req: &AnalysisRequest) -> Result<Self, AppError> {
        let period = req.year.map(|year| Period {
            year,
            month: req.month,
        });
        if let Some(dept) = &req.department
            && data.department(dept).is_none()
        {
            return Err(AppError::NotFound(format!("Department '{}' not found", dept)));
        }
        let in_scope = |name: &str| req.department.as_deref().is_none_or(|d| d == name);
        let multiplier = period.map_or(Decimal::ONE, |p| p.budget_multiplier());

        let employees = data
            .employees
            .iter()
            .filter(|e| e.is_active())
            .filter(|e| req.department.as_deref().is_none_or(|d| e.references(d)))
            .cloned()
            .collect();
        let expenses = data
            .expenses
            .iter()
            .filter(|e| in_scope(&e.department))
            .filter(|e| period.is_none_or(|p| p.contains(e.date)))
            .cloned()
            .collect();
        let budgets = data
            .departments
            .iter()
            .filter(|d| in_scope(&d.name))
            .map(|d| BudgetLine {
                department: d.name.clone(),
                amount: d.monthly_budget * multiplier,
            })
            .collect();

        let context = if !req.context.trim().is_empty() {
            req.context.trim().to_string()
        } else {
            let label = period.map_or_else(|| "All time".to_string(), |p| p.label());
            match &req.department {
                Some(dept) => format!("Department: {}. Period: {}", dept, label),
                None => format!("Dashboard View: {}", label),
            }
        };

        Ok(Self {
            context,
            employees,
            expenses,
            budgets,
        })
    }
}

// ─── Digest ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendDetails {
    pub expenses: Decimal,
    pub payroll: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDigest {
    pub department: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub details: SpendDetails,
}

/// Pre-computed totals sent alongside the raw records so the summarizer
/// does not have to add up long lists itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDigest {
    pub context: String,
    pub currency: &'static str,
    pub total_monthly_payroll: Decimal,
    pub total_expenses: Decimal,
    pub department_breakdown: Vec<DepartmentDigest>,
}

fn monthly(annual: Decimal) -> Decimal {
    (annual / dec!(12)).round_dp(2)
}

pub fn digest(scope: &AnalysisScope) -> FinancialDigest {
    let department_breakdown = scope
        .budgets
        .iter()
        .map(|line| {
            let expenses: Decimal = scope
                .expenses
                .iter()
                .filter(|e| e.department == line.department)
                .map(|e| e.amount)
                .sum();
            let payroll: Decimal = scope
                .employees
                .iter()
                .map(|e| monthly(e.allocated_to(&line.department)))
                .sum();
            DepartmentDigest {
                department: line.department.clone(),
                budget: line.amount,
                spent: expenses + payroll,
                details: SpendDetails { expenses, payroll },
            }
        })
        .collect();

    FinancialDigest {
        context: scope.context.clone(),
        currency: CURRENCY,
        total_monthly_payroll: scope
            .employees
            .iter()
            .map(|e| monthly(e.total_annual_salary))
            .sum(),
        total_expenses: scope.expenses.iter().map(|e| e.amount).sum(),
        department_breakdown,
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    employees: &'a [Employee],
    expenses: &'a [Expense],
    budgets: &'a [BudgetLine],
    context: &'a str,
    digest: FinancialDigest,
}

/// Client for the summarization proxy (`POST {ANALYSIS_URL}/ai/analyze`).
#[derive(Clone)]
pub struct AnalysisService {
    client: Client,
    config: Arc<Config>,
}

impl AnalysisService {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.analysis_url.is_some()
    }

    pub async fn analyze(&self, scope: &AnalysisScope) -> Result<AnalysisResult, AppError> {
        let base = self
            .config
            .analysis_url
            .as_deref()
            .ok_or_else(|| AppError::AnalysisUnavailable("ANALYSIS_URL is not set".to_string()))?;
        let url = format!("{}/ai/analyze", base.trim_end_matches('/'));

        let payload = AnalyzeRequest {
            employees: &scope.employees,
            expenses: &scope.expenses,
            budgets: &scope.budgets,
            context: &scope.context,
            digest: digest(scope),
        };

        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &self.config.analysis_api_key {
            request = request.bearer_auth(key);
        }

        debug!(
            "Requesting analysis for {} employees, {} expenses",
            scope.employees.len(),
            scope.expenses.len()
        );
        let resp = request
            .send()
            .await
            .map_err(|e| AppError::AnalysisUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::AnalysisUnavailable(format!(
                "summarizer returned {}: {}",
                status, body
            )));
        }

        resp.json()
            .await
            .map_err(|e| AppError::AnalysisUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::RiskLevel, seed};
    use axum::{Json, Router, http::HeaderMap, routing::post};
    use serde_json::{Value, json};
    use std::path::PathBuf;

    fn config(analysis_url: Option<String>) -> Arc<Config> {
        Arc::new(Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: None,
            data_dir: PathBuf::from("./data"),
            jwt_secret: "secret".to_string(),
            analysis_url,
            analysis_api_key: Some("proxy-key".to_string()),
        })
    }

    #[test]
    fn digest_splits_department_spend() {
        let data = seed::default_snapshot();
        let scope = AnalysisScope::from_request(
            &data,
            &AnalysisRequest {
                department: Some("Tech".to_string()),
                year: Some(2025),
                month: Some(10),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(scope.context, "Department: Tech. Period: October 2025");
        assert_eq!(scope.employees.len(), 1);
        assert_eq!(scope.budgets, vec![BudgetLine {
            department: "Tech".to_string(),
            amount: dec!(2500000),
        }]);

        let digest = digest(&scope);
        assert_eq!(digest.currency, "INR");
        assert_eq!(digest.total_monthly_payroll, dec!(375000));
        assert_eq!(digest.total_expenses, dec!(85000));
        let tech = &digest.department_breakdown[0];
        assert_eq!(tech.details.expenses, dec!(85000));
        assert_eq!(tech.details.payroll, dec!(375000));
        assert_eq!(tech.spent, dec!(460000));
    }

    #[test]
    fn whole_organization_scope_skips_terminated_employees() {
        let mut data = seed::default_snapshot();
        data.employees[6].status = crate::models::EmployeeStatus::Terminated;
        let scope = AnalysisScope::from_request(
            &data,
            &AnalysisRequest {
                context: "  Quarterly review ".to_string(),
                year: Some(2025),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(scope.context, "Quarterly review");
        assert_eq!(scope.employees.len(), 8);
        assert_eq!(scope.budgets.len(), 9);
        assert_eq!(scope.budgets[0].amount, dec!(30000000));
    }

    #[test]
    fn unknown_department_is_not_found() {
        let result = AnalysisScope::from_request(
            &seed::default_snapshot(),
            &AnalysisRequest {
                department: Some("Nowhere".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn disabled_service_reports_unavailable() {
        let service = AnalysisService::new(config(None));
        assert!(!service.is_enabled());
        let scope =
            AnalysisScope::from_request(&seed::default_snapshot(), &AnalysisRequest::default())
                .unwrap();
        assert!(matches!(
            service.analyze(&scope).await,
            Err(AppError::AnalysisUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn posts_digest_to_the_proxy() {
        async fn analyze(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer proxy-key");
            Json(json!({
                "summary": format!(
                    "authorized={} employees={} currency={}",
                    authorized,
                    body["employees"].as_array().map_or(0, Vec::len),
                    body["digest"]["currency"].as_str().unwrap_or_default(),
                ),
                "recommendations": ["Trim software spend"],
                "riskLevel": "Medium"
            }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = Router::new().route("/ai/analyze", post(analyze));
            axum::serve(listener, app).await.unwrap();
        });

        let service = AnalysisService::new(config(Some(format!("http://{}/", addr))));
        let scope =
            AnalysisScope::from_request(&seed::default_snapshot(), &AnalysisRequest::default())
                .unwrap();
        let result = service.analyze(&scope).await.unwrap();
        assert_eq!(result.summary, "authorized=true employees=9 currency=INR");
        assert_eq!(result.recommendations, vec!["Trim software spend".to_string()]);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }
}
