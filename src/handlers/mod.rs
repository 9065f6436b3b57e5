// src/handlers/mod.rs

pub mod dashboard;
pub mod department;
pub mod employee;
pub mod expense;
pub mod general;
pub mod payroll;
