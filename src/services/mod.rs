// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod geo;
pub mod media;
pub mod oracle;
pub mod providers;
pub mod summary;
pub mod symptom_analysis;
pub mod vet_advisor;

pub use oracle::{GeminiClient, GenerateRequest, GenerativeModel, OracleError, Part};
pub use providers::{ProviderQuery, SortBy};
pub use summary::{PetSummaryResponse, PetSummaryService};
pub use symptom_analysis::{Assessment, PetContext, SymptomAnalyzer, SymptomSubmission};
pub use vet_advisor::VetAdvisor;
