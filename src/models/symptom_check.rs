// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Symptom check model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Area of pet care the question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum HealthCategory {
    Nutrition,
    Exercise,
    Grooming,
    Health,
    Seasonal,
}

impl HealthCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthCategory::Nutrition => "Nutrition",
            HealthCategory::Exercise => "Exercise",
            HealthCategory::Grooming => "Grooming",
            HealthCategory::Health => "Health",
            HealthCategory::Seasonal => "Seasonal",
        }
    }
}

impl std::fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier produced by symptom analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RiskLevel {
    Emergency,
    Urgent,
    Monitor,
    #[serde(rename = "Low Risk")]
    LowRisk,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Emergency => "Emergency",
            RiskLevel::Urgent => "Urgent",
            RiskLevel::Monitor => "Monitor",
            RiskLevel::LowRisk => "Low Risk",
        }
    }

    /// Map a `RISK_LEVEL:` token from a model reply. Unknown tokens yield `None`.
    pub fn from_reply_token(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "EMERGENCY" => Some(RiskLevel::Emergency),
            "URGENT" => Some(RiskLevel::Urgent),
            "MONITOR" => Some(RiskLevel::Monitor),
            "LOW RISK" | "LOW_RISK" => Some(RiskLevel::LowRisk),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum FeedbackType {
    Up,
    Down,
}

/// Titled group of points in an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DetailedSection {
    pub title: String,
    pub points: Vec<String>,
}

impl DetailedSection {
    pub fn new(title: &str, points: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            points: points.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// One message of the client-side chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatMessage {
    pub id: String,
    /// "bot" or "user"
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<HashMap<String, String>>>,
}

impl ChatMessage {
    pub fn is_from_user(&self) -> bool {
        self.kind == "user"
    }
}

/// Stored symptom check in the `symptom_checks` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomCheck {
    /// Document ID
    pub id: String,
    /// Owner; `None` for anonymous submissions
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
    #[serde(default, alias = "pet_id")]
    pub pet_id: Option<String>,
    pub category: HealthCategory,
    #[serde(default, alias = "health_subcategory")]
    pub health_subcategory: Option<String>,
    #[serde(default)]
    pub symptoms: String,
    /// Base64 images as submitted
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video: Option<String>,
    pub risk_level: RiskLevel,
    pub summary: String,
    #[serde(default)]
    pub detailed_sections: Vec<DetailedSection>,
    #[serde(default)]
    pub immediate_actions: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub feedback: Option<FeedbackType>,
    #[serde(default)]
    pub feedback_reason: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl SymptomCheck {
    /// Whether `user_id` owns this check.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Messages written by the owner, in chat order.
    pub fn user_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.is_from_user())
    }

    /// Mark resolved/unresolved, stamping or clearing `resolved_at`.
    pub fn set_resolved(&mut self, resolved: bool, now: DateTime<Utc>) {
        self.resolved = resolved;
        self.resolved_at = resolved.then_some(now);
    }
}
