// src/services/budget.rs
//
// Budget and spend aggregation. Everything here is a pure function of the
// current collections and never fails: empty input yields zero totals.

use crate::models::{Department, Employee, Expense, ExpenseCategory, LedgerSnapshot};
use chrono::{Datelike, Month, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// A calendar year, optionally narrowed to one month (1-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Period {
    pub year: i32,
    /// 1-12; omit for the whole year
    pub month: Option<u32>,
}

impl Period {
    #[cfg(test)]
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    #[cfg(test)]
    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && self.month.is_none_or(|m| date.month() == m)
    }

    /// Monthly budgets scale by twelve for a full-year view.
    pub fn budget_multiplier(&self) -> Decimal {
        if self.month.is_some() {
            Decimal::ONE
        } else {
            dec!(12)
        }
    }

    pub fn label(&self) -> String {
        match self.month.and_then(month_name) {
            Some(name) => format!("{} {}", name, self.year),
            None => self.year.to_string(),
        }
    }
}

fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}

/// Spend as a percentage of budget, four decimal places; zero when there is no budget.
pub fn utilization(spend: Decimal, budget: Decimal) -> Decimal {
    if budget > Decimal::ZERO {
        (spend / budget * dec!(100)).round_dp(4)
    } else {
        Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Split {
    payroll: Decimal,
    operations: Decimal,
}

impl Split {
    fn add(&mut self, expense: &Expense) {
        if expense.category.is_payroll() {
            self.payroll += expense.amount;
        } else {
            self.operations += expense.amount;
        }
    }

    fn total(&self) -> Decimal {
        self.payroll + self.operations
    }
}

// ─── Organization overview ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentBreakdown {
    pub name: String,
    pub payroll: Decimal,
    pub operations: Decimal,
    pub total: Decimal,
    pub budget: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetOverview {
    pub period_label: String,
    pub total_spend: Decimal,
    pub total_budget: Decimal,
    pub remaining_budget: Decimal,
    /// Percentage
    pub utilization: Decimal,
    pub active_headcount: usize,
    /// Sorted by descending total spend
    pub departments: Vec<DepartmentBreakdown>,
}

pub fn overview(data: &LedgerSnapshot, period: Period) -> BudgetOverview {
    let multiplier = period.budget_multiplier();
    let in_period: Vec<&Expense> = data
        .expenses
        .iter()
        .filter(|e| period.contains(e.date))
        .collect();

    let total_spend: Decimal = in_period.iter().map(|e| e.amount).sum();
    let total_budget: Decimal = data
        .departments
        .iter()
        .map(|d| d.monthly_budget * multiplier)
        .sum();

    let mut departments: Vec<DepartmentBreakdown> = data
        .departments
        .iter()
        .map(|dept| {
            let mut split = Split::default();
            in_period
                .iter()
                .filter(|e| e.department == dept.name)
                .for_each(|e| split.add(e));
            DepartmentBreakdown {
                name: dept.name.clone(),
                payroll: split.payroll,
                operations: split.operations,
                total: split.total(),
                budget: dept.monthly_budget * multiplier,
            }
        })
        .collect();
    departments.sort_by(|a, b| b.total.cmp(&a.total));

    BudgetOverview {
        period_label: period.label(),
        total_spend,
        total_budget,
        remaining_budget: total_budget - total_spend,
        utilization: utilization(total_spend, total_budget),
        active_headcount: data.employees.iter().filter(|e| e.is_active()).count(),
        departments,
    }
}

// ─── Department view ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    pub period_label: String,
    pub payroll: Decimal,
    pub operations: Decimal,
    pub total_spend: Decimal,
    pub budget: Decimal,
    pub remaining: Decimal,
    pub utilization: Decimal,
    pub active_headcount: usize,
    pub categories: Vec<CategoryTotal>,
}

pub fn department_summary(
    department: &Department,
    employees: &[Employee],
    expenses: &[Expense],
    period: Period,
) -> DepartmentSummary {
    let scoped: Vec<&Expense> = expenses
        .iter()
        .filter(|e| e.department == department.name && period.contains(e.date))
        .collect();

    let mut split = Split::default();
    scoped.iter().for_each(|e| split.add(e));

    let categories = ExpenseCategory::ALL
        .iter()
        .map(|&category| CategoryTotal {
            category,
            amount: scoped
                .iter()
                .filter(|e| e.category == category)
                .map(|e| e.amount)
                .sum(),
        })
        .collect();

    let budget = department.monthly_budget * period.budget_multiplier();
    let total_spend = split.total();

    DepartmentSummary {
        department: department.name.clone(),
        period_label: period.label(),
        payroll: split.payroll,
        operations: split.operations,
        total_spend,
        budget,
        remaining: budget - total_spend,
        utilization: utilization(total_spend, budget),
        active_headcount: employees
            .iter()
            .filter(|e| e.is_active() && e.references(&department.name))
            .count(),
        categories,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// 1-12
    pub month: u32,
    pub label: String,
    pub payroll: Decimal,
    pub operations: Decimal,
    pub total: Decimal,
}

/// Twelve points, January through December, for one department and year.
pub fn monthly_trend(department: &str, expenses: &[Expense], year: i32) -> Vec<TrendPoint> {
    let mut months = [Split::default(); 12];
    for expense in expenses
        .iter()
        .filter(|e| e.department == department && e.date.year() == year)
    {
        months[expense.date.month0() as usize].add(expense);
    }

    months
        .iter()
        .zip(1u32..)
        .map(|(split, month)| TrendPoint {
            month,
            label: month_name(month)
                .map(|n| n[..3].to_string())
                .unwrap_or_default(),
            payroll: split.payroll,
            operations: split.operations,
            total: split.total(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn expense(
        amount: Decimal,
        dept: &str,
        date: (i32, u32, u32),
        category: ExpenseCategory,
    ) -> Expense {
        Expense {
            id: format!("e-{}-{}", dept, amount),
            description: "test".to_string(),
            amount,
            department: dept.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category,
        }
    }

    fn three_departments() -> Vec<Department> {
        ["A", "B", "C"]
            .iter()
            .map(|n| Department {
                id: n.to_string(),
                name: n.to_string(),
                monthly_budget: dec!(2500000),
            })
            .collect()
    }

    #[test]
    fn full_year_view_scales_budget_by_twelve() {
        let data = LedgerSnapshot {
            departments: three_departments(),
            employees: vec![],
            expenses: vec![expense(dec!(85000), "A", (2025, 10, 1), ExpenseCategory::Software)],
        };

        let view = overview(&data, Period::year(2025));
        assert_eq!(view.total_budget, dec!(90000000));
        assert_eq!(view.total_spend, dec!(85000));
        assert_eq!(view.remaining_budget, dec!(89915000));
        assert_eq!(view.utilization, dec!(0.0944));
        assert_eq!(view.period_label, "2025");

        let month = overview(&data, Period::month(2025, 10));
        assert_eq!(month.total_budget, dec!(7500000));
        assert_eq!(month.total_spend, dec!(85000));
        assert_eq!(month.period_label, "October 2025");

        let other_month = overview(&data, Period::month(2025, 9));
        assert_eq!(other_month.total_spend, Decimal::ZERO);
    }

    #[test]
    fn spend_counts_every_expense_in_the_year_regardless_of_department() {
        let data = LedgerSnapshot {
            departments: three_departments(),
            employees: vec![],
            expenses: vec![
                expense(dec!(100), "A", (2025, 1, 31), ExpenseCategory::Travel),
                expense(dec!(200), "Unlisted", (2025, 12, 31), ExpenseCategory::Events),
                expense(dec!(400), "B", (2024, 12, 31), ExpenseCategory::Events),
            ],
        };
        let view = overview(&data, Period::year(2025));
        assert_eq!(view.total_spend, dec!(300));
        // The unlisted department has no breakdown row.
        let listed: Decimal = view.departments.iter().map(|d| d.total).sum();
        assert_eq!(listed, dec!(100));
    }

    #[test]
    fn breakdown_splits_payroll_and_sorts_by_total() {
        let data = LedgerSnapshot {
            departments: three_departments(),
            employees: seed::default_employees(),
            expenses: vec![
                expense(dec!(10), "A", (2025, 3, 1), ExpenseCategory::Software),
                expense(dec!(50), "B", (2025, 3, 2), ExpenseCategory::Salary),
                expense(dec!(5), "B", (2025, 3, 3), ExpenseCategory::Equipment),
            ],
        };
        let view = overview(&data, Period::month(2025, 3));
        let names: Vec<&str> = view.departments.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
        assert_eq!(view.departments[0].payroll, dec!(50));
        assert_eq!(view.departments[0].operations, dec!(5));
        assert_eq!(view.departments[0].budget, dec!(2500000));
        assert_eq!(view.active_headcount, 9);
    }

    #[test]
    fn empty_input_yields_zero_totals() {
        let view = overview(&LedgerSnapshot::default(), Period::year(2025));
        assert_eq!(view.total_spend, Decimal::ZERO);
        assert_eq!(view.total_budget, Decimal::ZERO);
        assert_eq!(view.utilization, Decimal::ZERO);
        assert!(view.departments.is_empty());
    }

    #[test]
    fn department_summary_covers_every_category() {
        let dept = &three_departments()[0];
        let expenses = vec![
            expense(dec!(300), "A", (2025, 5, 1), ExpenseCategory::Salary),
            expense(dec!(100), "A", (2025, 5, 9), ExpenseCategory::Travel),
            expense(dec!(999), "B", (2025, 5, 9), ExpenseCategory::Travel),
        ];
        let summary = department_summary(dept, &[], &expenses, Period::month(2025, 5));
        assert_eq!(summary.payroll, dec!(300));
        assert_eq!(summary.operations, dec!(100));
        assert_eq!(summary.total_spend, dec!(400));
        assert_eq!(summary.budget, dec!(2500000));
        assert_eq!(summary.remaining, dec!(2499600));
        assert_eq!(summary.categories.len(), ExpenseCategory::ALL.len());
        let travel = summary
            .categories
            .iter()
            .find(|c| c.category == ExpenseCategory::Travel)
            .unwrap();
        assert_eq!(travel.amount, dec!(100));
    }

    #[test]
    fn trend_has_twelve_points() {
        let expenses = vec![
            expense(dec!(20), "A", (2025, 1, 15), ExpenseCategory::Salary),
            expense(dec!(7), "A", (2025, 12, 1), ExpenseCategory::Contractor),
            expense(dec!(1), "A", (2024, 12, 1), ExpenseCategory::Contractor),
        ];
        let trend = monthly_trend("A", &expenses, 2025);
        assert_eq!(trend.len(), 12);
        assert_eq!(trend[0].label, "Jan");
        assert_eq!(trend[0].payroll, dec!(20));
        assert_eq!(trend[11].operations, dec!(7));
        assert_eq!(trend[11].total, dec!(7));
        assert_eq!(trend[5].total, Decimal::ZERO);
    }
}
