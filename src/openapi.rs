// src/openapi.rs

use crate::{
    models::{
        Allocation, AllocationInput, AnalysisRequest, AnalysisResponse, AnalysisResult,
        BulkTerminateRequest, ContactFields, CreateDepartmentRequest, CreateEmployeeRequest,
        CreateExpenseRequest, DeleteExpensesRequest, DeleteExpensesResponse, Department,
        DocumentRecord, DocumentStatus, DocumentType, Employee, EmployeeStatus, Expense,
        ExpenseCategory, NewDocument, PaymentLine, PaymentReceipt, Payout, PayoutStatus,
        PayoutType, PayrollSuggestion, RecordPaymentRequest, RiskLevel, RosterEntry,
        RunPayrollRequest, TerminateEmployeeRequest, UpdateDepartmentRequest,
        UpdateEmployeeRequest,
    },
    services::budget::{
        BudgetOverview, CategoryTotal, DepartmentBreakdown, DepartmentSummary, TrendPoint,
    },
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Ledger API",
        version = "1.0.0",
        description = "Employee directory, department budgets, expense ledger and payroll \
            for a single organization. Changes apply immediately and are written through \
            to the document store (or a local snapshot) in the background.",
        license(name = "MIT")
    ),
    paths(
        // Departments
        crate::handlers::department::list_departments,
        crate::handlers::department::create_department,
        crate::handlers::department::update_department,
        crate::handlers::department::delete_department,
        crate::handlers::department::department_summary,
        crate::handlers::department::department_trend,
        crate::handlers::department::department_roster,
        // Employees
        crate::handlers::employee::create_employee,
        crate::handlers::employee::list_employees,
        crate::handlers::employee::get_employee,
        crate::handlers::employee::update_employee,
        crate::handlers::employee::delete_employee,
        crate::handlers::employee::terminate_employee,
        crate::handlers::employee::terminate_employees,
        // Expenses
        crate::handlers::expense::list_expenses,
        crate::handlers::expense::create_expense,
        crate::handlers::expense::delete_expenses,
        // Payroll
        crate::handlers::employee::record_payment,
        crate::handlers::payroll::payroll_suggestions,
        crate::handlers::payroll::run_payroll,
        // Dashboard
        crate::handlers::dashboard::dashboard,
        crate::handlers::dashboard::analyze,
    ),
    components(
        schemas(
            Department, CreateDepartmentRequest, UpdateDepartmentRequest,
            Employee, EmployeeStatus, Allocation, AllocationInput, ContactFields,
            CreateEmployeeRequest, UpdateEmployeeRequest, TerminateEmployeeRequest,
            BulkTerminateRequest, RosterEntry,
            DocumentRecord, DocumentType, DocumentStatus, NewDocument,
            Payout, PayoutType, PayoutStatus, RecordPaymentRequest, PaymentLine,
            RunPayrollRequest, PaymentReceipt, PayrollSuggestion,
            Expense, ExpenseCategory, CreateExpenseRequest, DeleteExpensesRequest,
            DeleteExpensesResponse,
            BudgetOverview, DepartmentBreakdown, DepartmentSummary, CategoryTotal, TrendPoint,
            AnalysisRequest, AnalysisResponse, AnalysisResult, RiskLevel,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Departments", description = "Departments, budgets and per-department views"),
        (name = "Employees", description = "Onboard, update and terminate employees"),
        (name = "Expenses", description = "Operational expense ledger"),
        (name = "Payroll", description = "Payouts and payroll runs"),
        (name = "Dashboard", description = "Budget utilization and financial analysis"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/departments/{name}",
            "/api/v1/employees/terminate",
            "/api/v1/expenses/delete",
            "/api/v1/payroll/run",
            "/api/v1/analysis",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
