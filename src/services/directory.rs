// src/services/directory.rs

use crate::{
    models::{Employee, EmployeeQuery, Expense, ExpenseQuery, PayrollSuggestion, RosterEntry},
    services::budget::Period,
};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

fn matches_search(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn filter_employees(employees: &[Employee], query: &EmployeeQuery) -> Vec<Employee> {
    employees
        .iter()
        .filter(|e| query.status.is_none_or(|s| e.status == s))
        .filter(|e| query.department.as_deref().is_none_or(|d| e.references(d)))
        .filter(|e| {
            query
                .search
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .is_none_or(|s| {
                    matches_search(&e.name, s.trim()) || matches_search(&e.role, s.trim())
                })
        })
        .cloned()
        .collect()
}

/// Newest first; same-day entries fall back to identifier order, newest first.
pub fn filter_expenses(expenses: &[Expense], query: &ExpenseQuery) -> Vec<Expense> {
    let period = Period {
        year: query.year,
        month: query.month,
    };
    let mut matched: Vec<Expense> = expenses
        .iter()
        .filter(|e| period.contains(e.date))
        .filter(|e| query.department.as_deref().is_none_or(|d| e.department == d))
        .filter(|e| query.category.is_none_or(|c| e.category == c))
        .filter(|e| {
            query
                .search
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .is_none_or(|s| matches_search(&e.description, s.trim()))
        })
        .cloned()
        .collect();

    matched.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    matched
}

/// Active employees referencing `department`, with the share allocated to it.
pub fn roster(employees: &[Employee], department: &str) -> Vec<RosterEntry> {
    employees
        .iter()
        .filter(|e| e.is_active() && e.references(department))
        .map(|e| RosterEntry {
            id: e.id.clone(),
            name: e.name.clone(),
            role: e.role.clone(),
            allocated_annual: e.allocated_to(department),
            total_annual_salary: e.total_annual_salary,
        })
        .collect()
}

/// Monthly salary for each active employee, rounded to whole rupees.
pub fn payroll_suggestions(employees: &[Employee]) -> Vec<PayrollSuggestion> {
    employees
        .iter()
        .filter(|e| e.is_active())
        .map(|e| PayrollSuggestion {
            employee_id: e.id.clone(),
            name: e.name.clone(),
            primary_department: e.primary_department.clone(),
            monthly_salary: monthly(e.total_annual_salary),
        })
        .collect()
}

fn monthly(annual: Decimal) -> Decimal {
    (annual / dec!(12)).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
