// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`DocumentStore`] is the boundary between services and storage. Firestore
//! backs production; [`MemoryDb`] serves local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    Pet, PetHealthSummary, PetHealthSummaryHistoryEntry, Provider, SymptomCheck, User,
};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PETS: &str = "pets";
    pub const PROVIDERS: &str = "providers";
    pub const SYMPTOM_CHECKS: &str = "symptom_checks";
    /// Current summary per pet (keyed by pet ID)
    pub const PET_HEALTH_SUMMARIES: &str = "pet_health_summaries";
    /// Append-only summary archive
    pub const PET_HEALTH_SUMMARY_HISTORY: &str = "pet_health_summary_history";
}

/// Typed document operations used by the services.
///
/// List operations return newest first.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Users & Pets ────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_pet(&self, pet_id: &str) -> Result<Option<Pet>, AppError>;

    async fn upsert_pet(&self, pet: &Pet) -> Result<(), AppError>;

    // ─── Providers ───────────────────────────────────────────────

    /// All providers, optionally only those open around the clock.
    async fn list_providers(&self, only_24x7: bool) -> Result<Vec<Provider>, AppError>;

    async fn get_provider(&self, provider_id: &str) -> Result<Option<Provider>, AppError>;

    async fn upsert_provider(&self, provider: &Provider) -> Result<(), AppError>;

    // ─── Symptom Checks ──────────────────────────────────────────

    async fn get_symptom_check(&self, check_id: &str) -> Result<Option<SymptomCheck>, AppError>;

    /// Insert or replace a symptom check.
    async fn save_symptom_check(&self, check: &SymptomCheck) -> Result<(), AppError>;

    async fn delete_symptom_check(&self, check_id: &str) -> Result<(), AppError>;

    async fn list_symptom_checks_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<SymptomCheck>, AppError>;

    async fn list_symptom_checks_for_pet(
        &self,
        pet_id: &str,
        limit: usize,
    ) -> Result<Vec<SymptomCheck>, AppError>;

    // ─── Pet Health Summaries ────────────────────────────────────

    async fn get_pet_summary(&self, pet_id: &str) -> Result<Option<PetHealthSummary>, AppError>;

    /// Replace the current summary for `summary.pet_id`.
    async fn upsert_pet_summary(&self, summary: &PetHealthSummary) -> Result<(), AppError>;

    async fn delete_pet_summary(&self, pet_id: &str) -> Result<(), AppError>;

    async fn insert_summary_history(
        &self,
        entry: &PetHealthSummaryHistoryEntry,
    ) -> Result<(), AppError>;

    async fn get_summary_history(
        &self,
        entry_id: &str,
    ) -> Result<Option<PetHealthSummaryHistoryEntry>, AppError>;

    async fn list_summary_history(
        &self,
        pet_id: &str,
        limit: usize,
    ) -> Result<Vec<PetHealthSummaryHistoryEntry>, AppError>;

    async fn delete_summary_history(&self, entry_id: &str) -> Result<(), AppError>;
}

/// Sort symptom checks newest first and keep at most `limit`.
pub(crate) fn newest_checks(mut checks: Vec<SymptomCheck>, limit: usize) -> Vec<SymptomCheck> {
    checks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    checks.truncate(limit);
    checks
}

/// Sort history entries newest first and keep at most `limit`.
pub(crate) fn newest_history(
    mut entries: Vec<PetHealthSummaryHistoryEntry>,
    limit: usize,
) -> Vec<PetHealthSummaryHistoryEntry> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(limit);
    entries
}
