// src/seed.rs
//
// Demonstration data used to populate an empty remote store and to build the
// first local snapshot, so a fresh install never starts blank.

use crate::models::{
    Allocation, ContactFields, Department, DocumentRecord, DocumentStatus, DocumentType, Employee,
    EmployeeStatus, Expense, ExpenseCategory, LedgerSnapshot, Payout, PayoutStatus, PayoutType,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const DEFAULT_MONTHLY_BUDGET: Decimal = dec!(2500000);

pub const DEFAULT_DEPARTMENTS: [&str; 9] = [
    "Academics",
    "Sales",
    "Content",
    "Editing",
    "Designing",
    "Softwares",
    "Creators",
    "Tech",
    "Marketing & Social Media",
];

// (id, name, role, department, annual salary, start date, payout id, payout amount)
#[rustfmt::skip]
const EMPLOYEES: [(&str, &str, &str, &str, Decimal, (i32, u32, u32), &str, Decimal); 9] = [
    ("1", "Arjun Sharma", "Head of Academics", "Academics", dec!(2400000), (2022, 1, 15), "p1", dec!(200000)),
    ("2", "Priya Verma", "Sales Lead", "Sales", dec!(1800000), (2023, 3, 1), "p2", dec!(150000)),
    ("3", "Rohan Gupta", "Senior Editor", "Editing", dec!(1200000), (2021, 11, 20), "p3", dec!(100000)),
    ("4", "Ananya Singh", "Lead Designer", "Designing", dec!(1500000), (2022, 6, 10), "p4", dec!(125000)),
    ("5", "Vikram Malhotra", "Software Engineer", "Softwares", dec!(2000000), (2023, 1, 5), "p5", dec!(166666)),
    ("6", "Sneha Patel", "Content Creator", "Creators", dec!(900000), (2023, 7, 22), "p6", dec!(75000)),
    ("7", "Karan Mehra", "CTO", "Tech", dec!(4500000), (2020, 5, 15), "p7", dec!(375000)),
    ("8", "Meera Iyer", "Marketing Manager", "Marketing & Social Media", dec!(1600000), (2021, 2, 14), "p8", dec!(133333)),
    ("9", "Rahul Nair", "Content Strategist", "Content", dec!(1400000), (2022, 9, 1), "p9", dec!(116666)),
];

// (id, description, amount, department, day of October 2025, category)
#[rustfmt::skip]
const EXPENSES: [(&str, &str, Decimal, &str, u32, ExpenseCategory); 9] = [
    ("101", "AWS Cloud Hosting", dec!(85000), "Tech", 1, ExpenseCategory::Software),
    ("102", "Diwali Marketing Campaign", dec!(500000), "Marketing & Social Media", 3, ExpenseCategory::Events),
    ("103", "New MacBook Pros (x3)", dec!(650000), "Designing", 5, ExpenseCategory::Equipment),
    ("104", "Sales Team Offsite - Goa", dec!(250000), "Sales", 7, ExpenseCategory::Travel),
    ("105", "Research Journals", dec!(15000), "Academics", 10, ExpenseCategory::Software),
    ("106", "Freelance Writers", dec!(45000), "Content", 12, ExpenseCategory::Contractor),
    ("107", "Adobe Creative Cloud", dec!(85000), "Editing", 15, ExpenseCategory::Software),
    ("108", "Jira Enterprise License", dec!(120000), "Softwares", 16, ExpenseCategory::Software),
    ("109", "Creator Collabs", dec!(150000), "Creators", 18, ExpenseCategory::Events),
];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn default_documents() -> Vec<DocumentRecord> {
    [
        (DocumentType::AadharCard, DocumentStatus::Verified, 10),
        (DocumentType::PanCard, DocumentStatus::Verified, 10),
        (DocumentType::BankDetails, DocumentStatus::Uploaded, 12),
        (DocumentType::Photo, DocumentStatus::Uploaded, 10),
        (DocumentType::EmploymentForm, DocumentStatus::Verified, 15),
    ]
    .into_iter()
    .map(|(doc_type, status, day)| DocumentRecord {
        doc_type,
        status,
        last_updated: date(2023, 1, day),
        file_name: None,
        inline_data: None,
        external_url: None,
    })
    .collect()
}

pub fn default_departments() -> Vec<Department> {
    DEFAULT_DEPARTMENTS
        .iter()
        .enumerate()
        .map(|(i, name)| Department {
            id: format!("dept-{}", i),
            name: name.to_string(),
            monthly_budget: DEFAULT_MONTHLY_BUDGET,
        })
        .collect()
}

pub fn default_employees() -> Vec<Employee> {
    EMPLOYEES
        .iter()
        .map(
            |&(id, name, role, dept, salary, (y, m, d), payout_id, payout)| Employee {
                id: id.to_string(),
                name: name.to_string(),
                role: role.to_string(),
                primary_department: dept.to_string(),
                total_annual_salary: salary,
                allocations: vec![Allocation {
                    department: dept.to_string(),
                    annual_salary: salary,
                }],
                status: EmployeeStatus::Active,
                termination_date: None,
                start_date: Some(date(y, m, d)),
                documents: default_documents(),
                payouts: vec![Payout {
                    id: payout_id.to_string(),
                    date: date(2025, 9, 30),
                    amount: payout,
                    payout_type: PayoutType::Salary,
                    status: PayoutStatus::Paid,
                }],
                contact: ContactFields::default(),
            },
        )
        .collect()
}

pub fn default_expenses() -> Vec<Expense> {
    EXPENSES
        .iter()
        .map(|&(id, description, amount, dept, day, category)| Expense {
            id: id.to_string(),
            description: description.to_string(),
            amount,
            department: dept.to_string(),
            date: date(2025, 10, day),
            category,
        })
        .collect()
}

pub fn default_snapshot() -> LedgerSnapshot {
    LedgerSnapshot {
        departments: default_departments(),
        employees: default_employees(),
        expenses: default_expenses(),
    }
}
