// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached AI health summaries: the current record and its history.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Climate season derived from the calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Season {
    Summer,
    Monsoon,
    Winter,
}

impl Season {
    /// March-June is summer, July-September monsoon, everything else winter.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=6 => Season::Summer,
            7..=9 => Season::Monsoon,
            _ => Season::Winter,
        }
    }

    pub fn at(date: DateTime<Utc>) -> Self {
        Self::from_month(date.month())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "Summer",
            Season::Monsoon => "Monsoon",
            Season::Winter => "Winter",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Season::Summer => "hot and dry weather",
            Season::Monsoon => "rainy season with high humidity",
            Season::Winter => "cooler temperatures",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current summary for a pet, keyed by pet ID in `pet_health_summaries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PetHealthSummary {
    #[serde(alias = "pet_id")]
    pub pet_id: String,
    #[serde(alias = "pet_name")]
    pub pet_name: String,
    pub summary: String,
    #[serde(alias = "generated_at")]
    pub generated_at: DateTime<Utc>,
    #[serde(alias = "history_period")]
    pub history_period: String,
    #[serde(alias = "checks_analyzed")]
    pub checks_analyzed: usize,
    #[serde(alias = "has_location_data")]
    pub has_location_data: bool,
    pub season: Season,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
    /// History entry written together with this record
    #[serde(default, alias = "history_id")]
    pub history_id: Option<String>,
}

/// Append-only archive entry in `pet_health_summary_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PetHealthSummaryHistoryEntry {
    pub id: String,
    #[serde(alias = "pet_id")]
    pub pet_id: String,
    #[serde(alias = "pet_name")]
    pub pet_name: String,
    pub summary: String,
    #[serde(alias = "generated_at")]
    pub generated_at: DateTime<Utc>,
    #[serde(alias = "history_period")]
    pub history_period: String,
    #[serde(alias = "checks_analyzed")]
    pub checks_analyzed: usize,
    #[serde(alias = "has_location_data")]
    pub has_location_data: bool,
    pub season: Season,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl PetHealthSummaryHistoryEntry {
    /// Current-summary record pointing back at this entry.
    pub fn to_current(&self) -> PetHealthSummary {
        PetHealthSummary {
            pet_id: self.pet_id.clone(),
            pet_name: self.pet_name.clone(),
            summary: self.summary.clone(),
            generated_at: self.generated_at,
            history_period: self.history_period.clone(),
            checks_analyzed: self.checks_analyzed,
            has_location_data: self.has_location_data,
            season: self.season,
            updated_at: self.created_at,
            history_id: Some(self.id.clone()),
        }
    }
}
