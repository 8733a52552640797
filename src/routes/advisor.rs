// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversational model routes (public): symptom chat follow-ups and
//! model-suggested vet clinics.

use crate::error::{AppError, Result};
use crate::services::vet_advisor::{
    is_valid_pincode, ClinicRecommendation, CLINIC_DISCLAIMER, DEFAULT_CLINIC_LIMIT,
    SOURCE_RECOMMENDATIONS, SOURCE_RESPONSE,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

const INVALID_PINCODE: &str = "Invalid PIN code format. Must be a 6-digit Indian PIN code.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v1/recommendations/symptom-followup",
            post(symptom_followup),
        )
        .route("/api/v1/recommendations/vets/by-city", get(vets_by_city))
        .route(
            "/api/v1/recommendations/vets/by-pincode",
            get(vets_by_pincode),
        )
        .route("/api/v1/recommendations/vets/ask", post(ask_about_vets))
}

fn default_limit() -> u32 {
    DEFAULT_CLINIC_LIMIT
}

fn validate_pincode(pincode: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_pincode(pincode) {
        Ok(())
    } else {
        Err(ValidationError::new("pincode").with_message(Cow::Borrowed(INVALID_PINCODE)))
    }
}

#[derive(Debug, Deserialize)]
struct FollowupParams {
    question: String,
    conversation_context: String,
}

#[derive(Debug, Deserialize, Validate)]
struct CityParams {
    #[validate(length(min = 1, message = "city is required"))]
    city: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    limit: u32,
}

#[derive(Debug, Deserialize, Validate)]
struct PincodeParams {
    #[validate(custom(function = "validate_pincode"))]
    pincode: String,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct AskParams {
    question: String,
    #[serde(default)]
    pincode: Option<String>,
    clinics_context: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowupResponse {
    pub question: String,
    pub answer: String,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClinicListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    pub limit: u32,
    pub count: usize,
    pub clinics: Vec<ClinicRecommendation>,
    pub source: String,
    pub disclaimer: String,
}

impl ClinicListResponse {
    fn new(
        city: Option<String>,
        pincode: Option<String>,
        limit: u32,
        clinics: Vec<ClinicRecommendation>,
    ) -> Self {
        Self {
            city,
            pincode,
            limit,
            count: clinics.len(),
            clinics,
            source: SOURCE_RECOMMENDATIONS.to_string(),
            disclaimer: CLINIC_DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct VetAnswerResponse {
    pub question: String,
    pub answer: String,
    pub pincode: Option<String>,
    pub source: String,
}

/// Continue the symptom-checker conversation.
async fn symptom_followup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FollowupParams>,
) -> Result<Json<FollowupResponse>> {
    let answer = state
        .symptom_analyzer
        .follow_up(&params.question, &params.conversation_context)
        .await?;

    Ok(Json(FollowupResponse {
        question: params.question,
        answer,
        source: SOURCE_RESPONSE.to_string(),
    }))
}

async fn vets_by_city(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CityParams>,
) -> Result<Json<ClinicListResponse>> {
    params.validate()?;
    let city = params.city.trim().to_string();
    if city.is_empty() {
        return Err(AppError::BadRequest("city is required".to_string()));
    }

    let clinics = state
        .vet_advisor
        .clinics_by_city(&city, params.limit)
        .await?;
    Ok(Json(ClinicListResponse::new(
        Some(city),
        None,
        params.limit,
        clinics,
    )))
}

async fn vets_by_pincode(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PincodeParams>,
) -> Result<Json<ClinicListResponse>> {
    params.validate()?;

    let clinics = state
        .vet_advisor
        .clinics_by_pincode(&params.pincode, params.limit)
        .await;
    Ok(Json(ClinicListResponse::new(
        None,
        Some(params.pincode),
        params.limit,
        clinics,
    )))
}

/// Answer a question about clinics the caller already has listed.
async fn ask_about_vets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AskParams>,
) -> Result<Json<VetAnswerResponse>> {
    // Blank PIN codes are treated as absent
    let pincode = params
        .pincode
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    if let Some(pin) = &pincode {
        if !is_valid_pincode(pin) {
            return Err(AppError::BadRequest(INVALID_PINCODE.to_string()));
        }
    }

    let answer = state
        .vet_advisor
        .answer_question(&params.question, pincode.as_deref(), &params.clinics_context)
        .await?;

    Ok(Json(VetAnswerResponse {
        question: params.question,
        answer,
        pincode,
        source: SOURCE_RESPONSE.to_string(),
    }))
}
