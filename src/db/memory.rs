// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore collections with one `DashMap` each. Used for local
//! development (`DATABASE_BACKEND=memory`) and by the test suite.

use crate::db::{newest_checks, newest_history, DocumentStore};
use crate::error::AppError;
use crate::models::{
    Pet, PetHealthSummary, PetHealthSummaryHistoryEntry, Provider, SymptomCheck, User,
};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    pets: DashMap<String, Pet>,
    providers: DashMap<String, Provider>,
    symptom_checks: DashMap<String, SymptomCheck>,
    summaries: DashMap<String, PetHealthSummary>,
    summary_history: DashMap<String, PetHealthSummaryHistoryEntry>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDb {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_pet(&self, pet_id: &str) -> Result<Option<Pet>, AppError> {
        Ok(self.pets.get(pet_id).map(|p| p.clone()))
    }

    async fn upsert_pet(&self, pet: &Pet) -> Result<(), AppError> {
        self.pets.insert(pet.id.clone(), pet.clone());
        Ok(())
    }

    async fn list_providers(&self, only_24x7: bool) -> Result<Vec<Provider>, AppError> {
        let mut providers: Vec<Provider> = self
            .providers
            .iter()
            .filter(|p| !only_24x7 || p.is_24x7)
            .map(|p| p.value().clone())
            .collect();
        // DashMap iteration order is arbitrary; keep retrieval order stable.
        providers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(providers)
    }

    async fn get_provider(&self, provider_id: &str) -> Result<Option<Provider>, AppError> {
        Ok(self.providers.get(provider_id).map(|p| p.clone()))
    }

    async fn upsert_provider(&self, provider: &Provider) -> Result<(), AppError> {
        self.providers.insert(provider.id.clone(), provider.clone());
        Ok(())
    }

    async fn get_symptom_check(&self, check_id: &str) -> Result<Option<SymptomCheck>, AppError> {
        Ok(self.symptom_checks.get(check_id).map(|c| c.clone()))
    }

    async fn save_symptom_check(&self, check: &SymptomCheck) -> Result<(), AppError> {
        self.symptom_checks.insert(check.id.clone(), check.clone());
        Ok(())
    }

    async fn delete_symptom_check(&self, check_id: &str) -> Result<(), AppError> {
        self.symptom_checks.remove(check_id);
        Ok(())
    }

    async fn list_symptom_checks_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<SymptomCheck>, AppError> {
        let checks = self
            .symptom_checks
            .iter()
            .filter(|c| c.is_owned_by(user_id))
            .map(|c| c.value().clone())
            .collect();
        Ok(newest_checks(checks, usize::MAX))
    }

    async fn list_symptom_checks_for_pet(
        &self,
        pet_id: &str,
        limit: usize,
    ) -> Result<Vec<SymptomCheck>, AppError> {
        let checks = self
            .symptom_checks
            .iter()
            .filter(|c| c.pet_id.as_deref() == Some(pet_id))
            .map(|c| c.value().clone())
            .collect();
        Ok(newest_checks(checks, limit))
    }

    async fn get_pet_summary(&self, pet_id: &str) -> Result<Option<PetHealthSummary>, AppError> {
        Ok(self.summaries.get(pet_id).map(|s| s.clone()))
    }

    async fn upsert_pet_summary(&self, summary: &PetHealthSummary) -> Result<(), AppError> {
        self.summaries
            .insert(summary.pet_id.clone(), summary.clone());
        Ok(())
    }

    async fn delete_pet_summary(&self, pet_id: &str) -> Result<(), AppError> {
        self.summaries.remove(pet_id);
        Ok(())
    }

    async fn insert_summary_history(
        &self,
        entry: &PetHealthSummaryHistoryEntry,
    ) -> Result<(), AppError> {
        if self.summary_history.contains_key(&entry.id) {
            return Err(AppError::Database(format!(
                "History entry {} already exists",
                entry.id
            )));
        }
        self.summary_history.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn get_summary_history(
        &self,
        entry_id: &str,
    ) -> Result<Option<PetHealthSummaryHistoryEntry>, AppError> {
        Ok(self.summary_history.get(entry_id).map(|e| e.clone()))
    }

    async fn list_summary_history(
        &self,
        pet_id: &str,
        limit: usize,
    ) -> Result<Vec<PetHealthSummaryHistoryEntry>, AppError> {
        let entries = self
            .summary_history
            .iter()
            .filter(|e| e.pet_id == pet_id)
            .map(|e| e.value().clone())
            .collect();
        Ok(newest_history(entries, limit))
    }

    async fn delete_summary_history(&self, entry_id: &str) -> Result<(), AppError> {
        self.summary_history.remove(entry_id);
        Ok(())
    }
}
