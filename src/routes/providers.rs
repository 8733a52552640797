// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Veterinary provider search routes (public).

use crate::error::{AppError, Result};
use crate::models::{Coordinate, ProviderResponse};
use crate::services::geo;
use crate::services::providers::{
    self, ProviderQuery, SortBy, DEFAULT_RADIUS_KM, MAX_RADIUS_KM, MIN_RADIUS_KM,
};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/providers", get(search_providers))
        .route(
            "/api/v1/providers/emergency/nearest",
            get(nearest_emergency_providers),
        )
        .route("/api/v1/providers/{id}", get(get_provider))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<f64>,
    #[serde(rename = "is24x7")]
    is_24x7: Option<bool>,
    sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationParams {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EmergencyParams {
    latitude: f64,
    longitude: f64,
    radius: Option<f64>,
}

fn parse_radius(radius: Option<f64>) -> Result<f64> {
    let radius = radius.unwrap_or(DEFAULT_RADIUS_KM);
    if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius) {
        return Err(AppError::BadRequest(format!(
            "radius must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM} km"
        )));
    }
    Ok(radius)
}

/// Both coordinates, validated, or neither.
fn parse_origin(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Coordinate>> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
            .map(Some)
            .map_err(|e| AppError::BadRequest(e.to_string())),
        (Some(lat), None) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::BadRequest(format!("Invalid latitude: {lat}")));
            }
            Ok(None)
        }
        (None, Some(lon)) => {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::BadRequest(format!("Invalid longitude: {lon}")));
            }
            Ok(None)
        }
        (None, None) => Ok(None),
    }
}

impl SearchParams {
    fn into_query(self) -> Result<ProviderQuery> {
        let origin = parse_origin(self.latitude, self.longitude)?;
        let city = self.city.filter(|c| !c.trim().is_empty());
        if city.is_none() && origin.is_none() {
            return Err(AppError::BadRequest(
                "Either city or latitude/longitude is required".to_string(),
            ));
        }

        let sort_by = self
            .sort_by
            .as_deref()
            .map(str::parse::<SortBy>)
            .transpose()
            .map_err(AppError::BadRequest)?
            .unwrap_or_default();

        Ok(ProviderQuery {
            city,
            origin,
            radius_km: parse_radius(self.radius)?,
            is_24x7: self.is_24x7,
            sort_by,
        })
    }
}

/// Search providers by city and/or distance from a point.
async fn search_providers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProviderResponse>>> {
    let query = params.into_query()?;
    let candidates = state.db.list_providers(query.is_24x7 == Some(true)).await?;

    let results = providers::search(candidates, &query);
    tracing::debug!(
        city = ?query.city,
        has_origin = query.origin.is_some(),
        radius_km = query.radius_km,
        results = results.len(),
        "Provider search"
    );
    Ok(Json(results))
}

async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    Query(params): Query<LocationParams>,
) -> Result<Json<ProviderResponse>> {
    let origin = parse_origin(params.latitude, params.longitude)?;
    let provider = state
        .db
        .get_provider(&provider_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Provider not found".to_string()))?;

    let distance = match (origin, provider.coordinate()) {
        (Some(origin), Ok(location)) => Some(geo::distance(origin, location)),
        (Some(_), Err(e)) => {
            tracing::warn!(provider_id = %provider.id, error = %e, "Provider has invalid location");
            None
        }
        (None, _) => None,
    };

    Ok(Json(ProviderResponse::from_provider(provider, distance)))
}

/// 24x7 providers nearest to the caller.
async fn nearest_emergency_providers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EmergencyParams>,
) -> Result<Json<Vec<ProviderResponse>>> {
    let origin = Coordinate::new(params.latitude, params.longitude)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let radius_km = parse_radius(params.radius)?;

    let candidates = state.db.list_providers(true).await?;
    Ok(Json(providers::nearest_emergency(
        candidates, origin, radius_km,
    )))
}
