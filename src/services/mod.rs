// src/services/mod.rs

pub mod analysis;
pub mod budget;
pub mod directory;
pub mod ledger;
