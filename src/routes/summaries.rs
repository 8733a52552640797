// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI pet health summary routes (authenticated).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Pet, PetHealthSummaryHistoryEntry};
use crate::services::PetSummaryResponse;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/recommendations/pet-summary/{pet_id}",
            post(generate_pet_summary),
        )
        // GET takes a pet ID, DELETE a history entry ID.
        .route(
            "/api/v1/recommendations/pet-summary-history/{id}",
            get(get_summary_history).delete(delete_summary),
        )
}

#[derive(Debug, Deserialize)]
struct SummaryParams {
    #[serde(default)]
    force_refresh: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SummaryHistoryResponse {
    pub pet_id: String,
    pub pet_name: String,
    pub count: usize,
    pub summaries: Vec<PetHealthSummaryHistoryEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteSummaryResponse {
    pub message: String,
    pub summary_id: String,
    pub pet_id: String,
}

/// Load a pet the caller owns.
async fn owned_pet(state: &AppState, pet_id: &str, user: &AuthUser, action: &str) -> Result<Pet> {
    let pet = state
        .db
        .get_pet(pet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;

    if pet.user_id != user.user_id {
        return Err(AppError::Forbidden(format!("Not authorized to {action}")));
    }
    Ok(pet)
}

/// Return the cached summary, regenerating it when stale.
async fn generate_pet_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pet_id): Path<String>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<PetSummaryResponse>> {
    let pet = owned_pet(&state, &pet_id, &user, "access this pet").await?;
    let owner = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let response = state
        .summary_service
        .get_or_generate(&pet, &owner, params.force_refresh)
        .await?;
    Ok(Json(response))
}

async fn get_summary_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pet_id): Path<String>,
) -> Result<Json<SummaryHistoryResponse>> {
    let pet = owned_pet(&state, &pet_id, &user, "access this pet").await?;
    let summaries = state.summary_service.history(&pet.id).await?;

    Ok(Json(SummaryHistoryResponse {
        pet_id: pet.id,
        pet_name: pet.name,
        count: summaries.len(),
        summaries,
    }))
}

async fn delete_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(summary_id): Path<String>,
) -> Result<Json<DeleteSummaryResponse>> {
    let entry = state
        .db
        .get_summary_history(&summary_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Summary not found".to_string()))?;
    owned_pet(&state, &entry.pet_id, &user, "delete this summary").await?;

    state.summary_service.delete_history_entry(&entry).await?;
    tracing::info!(summary_id = %entry.id, pet_id = %entry.pet_id, "Summary history entry deleted");

    Ok(Json(DeleteSummaryResponse {
        message: "Summary deleted successfully".to_string(),
        summary_id: entry.id,
        pet_id: entry.pet_id,
    }))
}
