// src/models/mod.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::{IntoParams, ToSchema};

// ─── Department ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(default)]
    pub id: String,
    /// Unique, compared case-insensitively
    pub name: String,
    /// Monthly allocation in INR
    pub monthly_budget: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub monthly_budget: Decimal,
}

/// Rename and/or re-budget a department. Renames cascade to employees.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentRequest {
    pub name: String,
    pub monthly_budget: Decimal,
}

// ─── Employee ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EmployeeStatus {
    Active,
    Terminated,
}

/// Portion of an employee's annual salary attributed to one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub department: String,
    pub annual_salary: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub role: String,
    /// Always the department of the first allocation
    pub primary_department: String,
    /// Always the sum of the allocations
    pub total_annual_salary: Decimal,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    pub status: EmployeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub payouts: Vec<Payout>,
    #[serde(default)]
    pub contact: ContactFields,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// True when the department is the primary one or appears in any allocation.
    pub fn references(&self, department: &str) -> bool {
        self.primary_department == department
            || self.allocations.iter().any(|a| a.department == department)
    }

    /// Annual amount allocated to `department`, falling back to the whole salary
    /// for records that predate allocations.
    pub fn allocated_to(&self, department: &str) -> Decimal {
        match self.allocations.iter().find(|a| a.department == department) {
            Some(a) => a.annual_salary,
            None if self.primary_department == department => self.total_annual_salary,
            None => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationInput {
    pub department: String,
    pub monthly_salary: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub role: String,
    pub start_date: NaiveDate,
    pub allocations: Vec<AllocationInput>,
    #[serde(default)]
    pub contact: ContactFields,
    #[serde(default)]
    pub documents: Vec<NewDocument>,
}

/// Partial update. `newDocuments` are appended, never diffed against existing ones.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub allocations: Option<Vec<AllocationInput>>,
    pub contact: Option<ContactFields>,
    #[serde(default)]
    pub new_documents: Vec<NewDocument>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TerminateEmployeeRequest {
    pub termination_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkTerminateRequest {
    pub employee_ids: Vec<String>,
    pub termination_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub status: Option<EmployeeStatus>,
    /// Matches the primary department or any allocation
    pub department: Option<String>,
    /// Case-insensitive match on name or role
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendQuery {
    pub year: i32,
}

/// Active employee as seen from one department.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub role: String,
    pub allocated_annual: Decimal,
    pub total_annual_salary: Decimal,
}

// ─── Documents ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DocumentType {
    #[serde(rename = "Aadhar Card")]
    AadharCard,
    #[serde(rename = "PAN Card")]
    PanCard,
    #[serde(rename = "Bank Details")]
    BankDetails,
    Photo,
    #[serde(rename = "Employment Form")]
    EmploymentForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DocumentStatus {
    Verified,
    Uploaded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub last_updated: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Base64 payload for small files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<String>,
    /// Share link for documents kept elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub file_name: Option<String>,
    pub inline_data: Option<String>,
    pub external_url: Option<String>,
}

// ─── Payouts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PayoutType {
    Salary,
    Bonus,
    Reimbursement,
}

impl fmt::Display for PayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayoutType::Salary => "Salary",
            PayoutType::Bonus => "Bonus",
            PayoutType::Reimbursement => "Reimbursement",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PayoutStatus {
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub payout_type: PayoutType,
    pub status: PayoutStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub payout_type: PayoutType,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    pub employee_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunPayrollRequest {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub payout_type: PayoutType,
    pub payments: Vec<PaymentLine>,
}

/// The payout appended to the employee and the paired salary expense.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub employee_id: String,
    pub payout: Payout,
    pub expense: Expense,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSuggestion {
    pub employee_id: String,
    pub name: String,
    pub primary_department: String,
    pub monthly_salary: Decimal,
}

// ─── Expenses ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ExpenseCategory {
    Software,
    Equipment,
    Travel,
    Events,
    Miscellaneous,
    Contractor,
    /// Only ever produced by recording a payout
    Salary,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Software,
        ExpenseCategory::Equipment,
        ExpenseCategory::Travel,
        ExpenseCategory::Events,
        ExpenseCategory::Miscellaneous,
        ExpenseCategory::Contractor,
        ExpenseCategory::Salary,
    ];

    pub fn is_payroll(self) -> bool {
        self == ExpenseCategory::Salary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    pub department: String,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount: Decimal,
    pub department: String,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteExpensesRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteExpensesResponse {
    /// Expenses actually removed; unknown identifiers are ignored
    pub deleted: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    pub year: i32,
    /// 1-12; omit for the whole year
    pub month: Option<u32>,
    pub department: Option<String>,
    pub category: Option<ExpenseCategory>,
    /// Case-insensitive match on the description
    pub search: Option<String>,
}

// ─── Snapshot ─────────────────────────────────────────────────────────────────

/// The three canonical collections, as persisted in the local snapshot slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl LedgerSnapshot {
    pub fn department(&self, name: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.name == name)
    }
}

// ─── Analysis ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Free-text context passed through to the summarizer
    #[serde(default)]
    pub context: String,
    /// Restrict the analysis to one department
    pub department: Option<String>,
    /// Restrict expenses to one year (and optionally one month)
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    /// Absent when the summarizer is disabled or failed
    pub analysis: Option<AnalysisResult>,
}

// ─── Identity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    pub iat: usize,
}
