// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and pets (read by the services, owned by profile management)
//! - Providers (clinic directory)
//! - Symptom checks
//! - Pet health summaries (current record + history)
//!
//! Queries filter on a single field and sort in memory, so no composite
//! indexes are needed.

use crate::db::{collections, newest_checks, newest_history, DocumentStore};
use crate::error::AppError;
use crate::models::{
    Pet, PetHealthSummary, PetHealthSummaryHistoryEntry, Provider, SymptomCheck, User,
};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All documents of `collection` whose `field` equals `value`.
    async fn query_eq<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        let value = value.to_string();
        self.client
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User & Pet Operations ───────────────────────────────────

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    async fn get_pet(&self, pet_id: &str) -> Result<Option<Pet>, AppError> {
        self.get_doc(collections::PETS, pet_id).await
    }

    async fn upsert_pet(&self, pet: &Pet) -> Result<(), AppError> {
        self.set_doc(collections::PETS, &pet.id, pet).await
    }

    // ─── Provider Operations ─────────────────────────────────────

    async fn list_providers(&self, only_24x7: bool) -> Result<Vec<Provider>, AppError> {
        let query = self
            .client
            .fluent()
            .select()
            .from(collections::PROVIDERS);

        let query = if only_24x7 {
            query.filter(|q| q.for_all([q.field("is24x7").eq(true)]))
        } else {
            query
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_provider(&self, provider_id: &str) -> Result<Option<Provider>, AppError> {
        self.get_doc(collections::PROVIDERS, provider_id).await
    }

    async fn upsert_provider(&self, provider: &Provider) -> Result<(), AppError> {
        self.set_doc(collections::PROVIDERS, &provider.id, provider)
            .await
    }

    // ─── Symptom Check Operations ────────────────────────────────

    async fn get_symptom_check(&self, check_id: &str) -> Result<Option<SymptomCheck>, AppError> {
        self.get_doc(collections::SYMPTOM_CHECKS, check_id).await
    }

    async fn save_symptom_check(&self, check: &SymptomCheck) -> Result<(), AppError> {
        self.set_doc(collections::SYMPTOM_CHECKS, &check.id, check)
            .await
    }

    async fn delete_symptom_check(&self, check_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::SYMPTOM_CHECKS, check_id).await
    }

    async fn list_symptom_checks_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<SymptomCheck>, AppError> {
        let checks = self
            .query_eq(collections::SYMPTOM_CHECKS, "userId", user_id)
            .await?;
        Ok(newest_checks(checks, usize::MAX))
    }

    async fn list_symptom_checks_for_pet(
        &self,
        pet_id: &str,
        limit: usize,
    ) -> Result<Vec<SymptomCheck>, AppError> {
        let checks = self
            .query_eq(collections::SYMPTOM_CHECKS, "petId", pet_id)
            .await?;
        Ok(newest_checks(checks, limit))
    }

    // ─── Pet Health Summary Operations ───────────────────────────

    async fn get_pet_summary(&self, pet_id: &str) -> Result<Option<PetHealthSummary>, AppError> {
        self.get_doc(collections::PET_HEALTH_SUMMARIES, pet_id).await
    }

    async fn upsert_pet_summary(&self, summary: &PetHealthSummary) -> Result<(), AppError> {
        self.set_doc(collections::PET_HEALTH_SUMMARIES, &summary.pet_id, summary)
            .await
    }

    async fn delete_pet_summary(&self, pet_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::PET_HEALTH_SUMMARIES, pet_id)
            .await
    }

    async fn insert_summary_history(
        &self,
        entry: &PetHealthSummaryHistoryEntry,
    ) -> Result<(), AppError> {
        self.set_doc(collections::PET_HEALTH_SUMMARY_HISTORY, &entry.id, entry)
            .await
    }

    async fn get_summary_history(
        &self,
        entry_id: &str,
    ) -> Result<Option<PetHealthSummaryHistoryEntry>, AppError> {
        self.get_doc(collections::PET_HEALTH_SUMMARY_HISTORY, entry_id)
            .await
    }

    async fn list_summary_history(
        &self,
        pet_id: &str,
        limit: usize,
    ) -> Result<Vec<PetHealthSummaryHistoryEntry>, AppError> {
        let entries = self
            .query_eq(collections::PET_HEALTH_SUMMARY_HISTORY, "petId", pet_id)
            .await?;
        Ok(newest_history(entries, limit))
    }

    async fn delete_summary_history(&self, entry_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::PET_HEALTH_SUMMARY_HISTORY, entry_id)
            .await
    }
}
