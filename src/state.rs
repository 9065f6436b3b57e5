// src/state.rs

use crate::{
    config::Config,
    services::{analysis::AnalysisService, ledger::Ledger},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub analysis: AnalysisService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(ledger: Ledger, config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            ledger,
            analysis: AnalysisService::new(config.clone()),
            config,
        }
    }
}
