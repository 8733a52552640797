// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pet health companion backend.
//!
//! Veterinary provider search, AI-assisted symptom checks and cached
//! per-pet health summaries.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{GenerativeModel, PetSummaryService, SymptomAnalyzer, VetAdvisor};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    pub symptom_analyzer: SymptomAnalyzer,
    pub summary_service: PetSummaryService,
    pub vet_advisor: VetAdvisor,
}

impl AppState {
    /// Wire services over one store and one generative model.
    pub fn new(
        config: Config,
        db: Arc<dyn DocumentStore>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            config,
            symptom_analyzer: SymptomAnalyzer::new(model.clone()),
            summary_service: PetSummaryService::new(db.clone(), model.clone()),
            vet_advisor: VetAdvisor::new(model),
            db,
        }
    }
}
