// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Veterinary provider directory model.

use crate::models::{Coordinate, GeoError};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Provider record stored in the `providers` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Document ID
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Free-form opening hours, e.g. "9:00 AM - 9:00 PM"
    #[serde(alias = "operating_hours")]
    pub operating_hours: String,
    /// Rating in [0, 5]
    #[serde(default)]
    pub rating: f64,
    #[serde(rename = "is24x7", alias = "is_24x7", default)]
    pub is_24x7: bool,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Provider {
    /// Location of the clinic.
    pub fn coordinate(&self) -> Result<Coordinate, GeoError> {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Provider projection returned by the API, with an optional computed distance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProviderResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub operating_hours: String,
    pub rating: f64,
    #[serde(rename = "is24x7")]
    pub is_24x7: bool,
    pub services: Vec<String>,
    /// Great-circle distance from the caller in km (never persisted)
    #[serde(rename = "distance")]
    pub distance_km: Option<f64>,
}

impl ProviderResponse {
    pub fn from_provider(provider: Provider, distance_km: Option<f64>) -> Self {
        Self {
            id: provider.id,
            name: provider.name,
            phone: provider.phone,
            address: provider.address,
            city: provider.city,
            state: provider.state,
            latitude: provider.latitude,
            longitude: provider.longitude,
            operating_hours: provider.operating_hours,
            rating: provider.rating,
            is_24x7: provider.is_24x7,
            services: provider.services,
            distance_km,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_legacy_snake_case_fields() {
        let provider: Provider = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Pet Care Clinic",
            "phone": "+919876543210",
            "address": "Linking Road",
            "city": "Mumbai",
            "state": "Maharashtra",
            "latitude": 19.0596,
            "longitude": 72.8295,
            "operating_hours": "9:00 AM - 9:00 PM",
            "rating": 4.5,
            "is_24x7": true
        }))
        .unwrap();

        assert_eq!(provider.operating_hours, "9:00 AM - 9:00 PM");
        assert!(provider.is_24x7);
        assert!(provider.services.is_empty());

        let json = serde_json::to_value(ProviderResponse::from_provider(provider, Some(2.5))).unwrap();
        assert_eq!(json["operatingHours"], "9:00 AM - 9:00 PM");
        assert_eq!(json["is24x7"], true);
        assert_eq!(json["distance"], 2.5);
    }
}
