// src/routes/mod.rs

use crate::{
    handlers::{
        dashboard::{analyze, dashboard},
        department::{
            create_department, delete_department, department_roster, department_summary,
            department_trend, list_departments, update_department,
        },
        employee::{
            create_employee, delete_employee, get_employee, list_employees, record_payment,
            terminate_employee, terminate_employees, update_employee,
        },
        expense::{create_expense, delete_expenses, list_expenses},
        general::{health_handler, root_handler},
        payroll::{payroll_suggestions, run_payroll},
    },
    openapi::ApiDoc,
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Departments ──────────────────────────────────────
        .route(
            "/departments",
            get(list_departments).post(create_department),
        )
        .route(
            "/departments/{name}",
            put(update_department).delete(delete_department),
        )
        .route("/departments/{name}/summary", get(department_summary))
        .route("/departments/{name}/trend", get(department_trend))
        .route("/departments/{name}/roster", get(department_roster))
        // ─── Employees ────────────────────────────────────────
        .route("/employees", post(create_employee).get(list_employees))
        .route("/employees/terminate", post(terminate_employees))
        .route(
            "/employees/{employee_id}",
            get(get_employee)
                .patch(update_employee)
                .delete(delete_employee),
        )
        .route(
            "/employees/{employee_id}/terminate",
            post(terminate_employee),
        )
        .route("/employees/{employee_id}/payouts", post(record_payment))
        // ─── Expenses ─────────────────────────────────────────
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/delete", post(delete_expenses))
        // ─── Payroll ──────────────────────────────────────────
        .route("/payroll/run", post(run_payroll))
        .route("/payroll/suggestions", get(payroll_suggestions))
        // ─── Dashboard ────────────────────────────────────────
        .route("/dashboard", get(dashboard))
        .route("/analysis", post(analyze))
}

/// The complete service: public endpoints, the authenticated API and Swagger UI.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::issue_token,
        config::Config,
        services::ledger::Ledger,
        store::{RemoteStore, memory::MemoryStore, snapshot::{SnapshotStore, scratch_dir}},
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::{path::PathBuf, sync::Arc};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";

    async fn test_app() -> Router {
        let ledger = Ledger::bootstrap(
            RemoteStore::new(Arc::new(MemoryStore::unconfigured())),
            SnapshotStore::new(scratch_dir()),
        )
        .await;
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: None,
            data_dir: PathBuf::from("./data"),
            jwt_secret: SECRET.to_string(),
            analysis_url: None,
            analysis_api_key: None,
        };
        app(AppState::new(ledger, config))
    }

    fn bearer() -> String {
        format!("Bearer {}", issue_token("admin-1", SECRET, 1).unwrap())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer());
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_public_and_reports_local_mode() {
        let app = test_app().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["mode"], "local");
        assert_eq!(body["departments"], 9);
    }

    #[tokio::test]
    async fn api_requires_a_valid_token() {
        let app = test_app().await;
        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/departments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], 401);

        let forged = issue_token("admin-1", "another-secret", 1).unwrap();
        let expired = issue_token("admin-1", SECRET, -2).unwrap();
        for token in [forged, expired] {
            let response = app
                .clone()
                .oneshot(
                    Request::get("/api/v1/departments")
                        .header(header::AUTHORIZATION, format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn department_crud_and_rejections() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/v1/departments", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(9));

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/departments",
            Some(json!({"name": "TECH", "monthlyBudget": "100"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 409);

        let (status, _) = send(&app, "DELETE", "/api/v1/departments/Tech", None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/v1/departments/Marketing%20%26%20Social%20Media",
            Some(json!({"name": "Marketing", "monthlyBudget": "3000000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Marketing");

        let (status, body) =
            send(&app, "GET", "/api/v1/employees?department=Marketing", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Meera Iyer");

        let (status, _) = send(&app, "GET", "/api/v1/departments/Nowhere/roster", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn payout_books_a_salary_expense() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/employees/7/payouts",
            Some(json!({"amount": "375000", "type": "Salary", "date": "2025-10-31"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["expense"]["category"], "Salary");
        assert_eq!(body["expense"]["department"], "Tech");
        assert_eq!(body["payout"]["status"], "Paid");

        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/expenses?year=2025&month=10&category=Salary",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["description"], "Salary - Karan Mehra");
    }

    #[tokio::test]
    async fn dashboard_validates_month() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/api/v1/dashboard?year=2025&month=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalBudget"], "22500000");
        assert_eq!(body["periodLabel"], "October 2025");

        let (status, _) = send(&app, "GET", "/api/v1/dashboard?year=2025&month=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analysis_is_null_when_disabled_but_scope_is_checked() {
        let app = test_app().await;
        let (status, body) = send(&app, "POST", "/api/v1/analysis", Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"analysis": null}));

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/analysis",
            Some(json!({"department": "Nowhere"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
