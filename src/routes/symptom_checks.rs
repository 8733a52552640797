// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Symptom checker routes.
//!
//! Submission, feedback and chat-log updates accept anonymous callers;
//! everything that reads or changes saved history requires a session.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, CurrentUser};
use crate::models::{
    ChatMessage, DetailedSection, FeedbackType, HealthCategory, RiskLevel, Season, SymptomCheck,
};
use crate::services::{PetContext, SymptomSubmission};
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DISCLAIMER: &str = "This AI assessment is for informational purposes only and does not replace professional veterinary advice. Always consult a licensed veterinarian for medical concerns.";

/// Minimum trimmed symptom text accepted without media.
const MIN_SYMPTOM_CHARS: usize = 10;
/// Earlier checks used as context for a new submission.
const CONTEXT_HISTORY_CHECKS: usize = 5;
/// Request body cap for submissions carrying base64 photos and video.
const MAX_SUBMISSION_BYTES: usize = 32 * 1024 * 1024;

/// Routes that work with or without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/symptom-checks", post(submit_symptom_check))
        .route("/api/v1/symptom-checks/{id}/feedback", post(submit_feedback))
        .route("/api/v1/symptom-checks/{id}/messages", patch(update_messages))
        .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES))
}

/// Routes that require a session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/symptom-checks", get(list_symptom_checks))
        .route(
            "/api/v1/symptom-checks/{id}",
            get(get_symptom_check).delete(delete_symptom_check),
        )
        .route("/api/v1/symptom-checks/{id}/resolve", patch(resolve_symptom_check))
        .route("/api/v1/symptom-checks/pet/{pet_id}", get(list_pet_symptom_checks))
}

// ─── Payloads ────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SymptomCheckRequest {
    #[serde(default, alias = "pet_id")]
    pub pet_id: Option<String>,
    pub category: HealthCategory,
    #[serde(default, alias = "health_subcategory")]
    pub health_subcategory: Option<String>,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Symptom description must be at most 5000 characters"))]
    pub symptoms: Option<String>,
    /// Base64 images, optionally as data URLs
    #[serde(default)]
    #[validate(length(max = 3, message = "Maximum 3 images allowed"))]
    pub images: Vec<String>,
    #[serde(default)]
    pub video: Option<String>,
}

impl SymptomCheckRequest {
    fn has_symptom_text(&self) -> bool {
        self.symptoms
            .as_deref()
            .is_some_and(|s| s.trim().chars().count() >= MIN_SYMPTOM_CHARS)
    }

    fn has_media(&self) -> bool {
        !self.images.is_empty() || self.video.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SymptomCheckResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub pet_id: Option<String>,
    pub category: HealthCategory,
    pub health_subcategory: Option<String>,
    pub symptoms: String,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub detailed_sections: Vec<DetailedSection>,
    pub immediate_actions: Vec<String>,
    pub reasoning: String,
    pub messages: Vec<ChatMessage>,
    pub feedback: Option<FeedbackType>,
    pub feedback_reason: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
    pub disclaimer: String,
}

impl From<SymptomCheck> for SymptomCheckResponse {
    fn from(check: SymptomCheck) -> Self {
        Self {
            id: check.id,
            user_id: check.user_id,
            pet_id: check.pet_id,
            category: check.category,
            health_subcategory: check.health_subcategory,
            symptoms: check.symptoms,
            risk_level: check.risk_level,
            summary: check.summary,
            detailed_sections: check.detailed_sections,
            immediate_actions: check.immediate_actions,
            reasoning: check.reasoning,
            messages: check.messages,
            feedback: check.feedback,
            feedback_reason: check.feedback_reason,
            resolved: check.resolved,
            resolved_at: check.resolved_at,
            timestamp: check.timestamp,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: FeedbackType,
    #[serde(default, alias = "feedback_reason")]
    pub feedback_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub resolved: bool,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// ─── Helpers ─────────────────────────────────────────────────

async fn load_check(state: &AppState, check_id: &str) -> Result<SymptomCheck> {
    state
        .db
        .get_symptom_check(check_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Symptom check not found".to_string()))
}

fn ensure_owner(check: &SymptomCheck, user_id: &str, action: &str) -> Result<()> {
    if check.is_owned_by(user_id) {
        Ok(())
    } else {
        tracing::warn!(check_id = %check.id, user_id, action, "Symptom check ownership mismatch");
        Err(AppError::Forbidden(format!(
            "Not authorized to {action} this symptom check"
        )))
    }
}

/// Pet context for a submission. A pet ID that matches nothing simply
/// yields no context.
async fn pet_context(
    state: &AppState,
    pet_id: &str,
    caller: &CurrentUser,
) -> Result<Option<PetContext>> {
    let Some(pet) = state.db.get_pet(pet_id).await? else {
        tracing::debug!(pet_id, "Pet not found, analyzing without profile");
        return Ok(None);
    };

    if let Some(user_id) = caller.user_id() {
        if pet.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to access this pet".to_string(),
            ));
        }
    }

    let history = match state
        .db
        .list_symptom_checks_for_pet(pet_id, CONTEXT_HISTORY_CHECKS)
        .await
    {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(pet_id, error = %e, "Failed to load pet history");
            Vec::new()
        }
    };

    let mut context = PetContext::from_pet(&pet, &history);

    if let Some(user_id) = caller.user_id() {
        context.season = Some(Season::at(Utc::now()));
        context.location = state
            .db
            .get_user(user_id)
            .await?
            .and_then(|user| user.owner_location());
    }

    Ok(Some(context))
}

// ─── Handlers ────────────────────────────────────────────────

/// Analyze submitted symptoms. Results are saved only for signed-in callers.
async fn submit_symptom_check(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Json(request): Json<SymptomCheckRequest>,
) -> Result<(StatusCode, Json<SymptomCheckResponse>)> {
    if !request.has_symptom_text() && !request.has_media() {
        return Err(AppError::BadRequest(
            "Please provide at least 10 characters of symptom description or upload media"
                .to_string(),
        ));
    }
    request.validate()?;

    let pet_context = match request.pet_id.as_deref() {
        Some(pet_id) => pet_context(&state, pet_id, &caller).await?,
        None => None,
    };

    let submission = SymptomSubmission {
        symptoms: request.symptoms.clone().unwrap_or_default(),
        category: request.category,
        subcategory: request.health_subcategory.clone(),
        pet_context,
        images: request.images.clone(),
        video: request.video.clone(),
    };
    let assessment = state.symptom_analyzer.analyze(&submission).await;

    let check = SymptomCheck {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: caller.user_id().map(str::to_string),
        pet_id: request.pet_id,
        category: request.category,
        health_subcategory: request.health_subcategory,
        symptoms: submission.symptoms,
        images: request.images,
        video: request.video,
        risk_level: assessment.risk_level,
        summary: assessment.summary,
        detailed_sections: assessment.detailed_sections,
        immediate_actions: assessment.immediate_actions,
        reasoning: assessment.reasoning,
        messages: Vec::new(),
        feedback: None,
        feedback_reason: None,
        resolved: false,
        resolved_at: None,
        timestamp: Utc::now(),
    };

    if caller.0.is_some() {
        state.db.save_symptom_check(&check).await?;
        tracing::info!(
            check_id = %check.id,
            risk_level = %check.risk_level,
            "Symptom check saved"
        );
    }

    Ok((StatusCode::CREATED, Json(check.into())))
}

/// All of the caller's checks, newest first.
async fn list_symptom_checks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SymptomCheckResponse>>> {
    let checks = state.db.list_symptom_checks_for_user(&user.user_id).await?;
    Ok(Json(checks.into_iter().map(Into::into).collect()))
}

async fn get_symptom_check(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(check_id): Path<String>,
) -> Result<Json<SymptomCheckResponse>> {
    let check = load_check(&state, &check_id).await?;
    ensure_owner(&check, &user.user_id, "access")?;
    Ok(Json(check.into()))
}

/// Checks for one of the caller's pets, newest first.
async fn list_pet_symptom_checks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pet_id): Path<String>,
) -> Result<Json<Vec<SymptomCheckResponse>>> {
    let pet = state
        .db
        .get_pet(&pet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pet not found".to_string()))?;
    if pet.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Not authorized to access this pet".to_string(),
        ));
    }

    let checks = state.db.list_symptom_checks_for_user(&user.user_id).await?;
    Ok(Json(
        checks
            .into_iter()
            .filter(|c| c.pet_id.as_deref() == Some(pet_id.as_str()))
            .map(Into::into)
            .collect(),
    ))
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(check_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<MessageResponse>> {
    let mut check = load_check(&state, &check_id).await?;
    if let Some(user_id) = caller.user_id() {
        ensure_owner(&check, user_id, "provide feedback on")?;
    }

    check.feedback = Some(request.feedback);
    check.feedback_reason = request.feedback_reason;
    state.db.save_symptom_check(&check).await?;

    Ok(MessageResponse::new("Thank you for your feedback"))
}

/// Replace the chat log recorded by the client.
async fn update_messages(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CurrentUser>,
    Path(check_id): Path<String>,
    Json(messages): Json<Vec<ChatMessage>>,
) -> Result<Json<MessageResponse>> {
    let mut check = load_check(&state, &check_id).await?;
    if let Some(user_id) = caller.user_id() {
        ensure_owner(&check, user_id, "update")?;
    }

    tracing::debug!(check_id = %check.id, count = messages.len(), "Updating chat messages");
    check.messages = messages;
    state.db.save_symptom_check(&check).await?;

    Ok(MessageResponse::new("Chat messages updated successfully"))
}

async fn resolve_symptom_check(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(check_id): Path<String>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<MessageResponse>> {
    let mut check = load_check(&state, &check_id).await?;
    ensure_owner(&check, &user.user_id, "update")?;

    check.set_resolved(query.resolved, Utc::now());
    state.db.save_symptom_check(&check).await?;

    Ok(MessageResponse::new(if query.resolved {
        "Concern marked as resolved"
    } else {
        "Concern marked as unresolved"
    }))
}

async fn delete_symptom_check(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(check_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let check = load_check(&state, &check_id).await?;
    ensure_owner(&check, &user.user_id, "delete")?;

    state.db.delete_symptom_check(&check.id).await?;
    tracing::info!(check_id = %check.id, "Symptom check deleted");

    Ok(MessageResponse::new("Symptom check deleted successfully"))
}
