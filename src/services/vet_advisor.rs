// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Model-generated veterinary clinic suggestions and clinic Q&A.
//!
//! Unlike the provider directory these clinics come straight from the
//! generative model, so every listing carries a verify-before-visiting
//! disclaimer.

use crate::error::AppError;
use crate::services::oracle::{GenerateRequest, GenerativeModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_CLINIC_LIMIT: u32 = 10;
pub const MAX_CLINIC_LIMIT: u32 = 50;

pub const SOURCE_RECOMMENDATIONS: &str = "AI-powered recommendations using Google Gemini";
pub const SOURCE_RESPONSE: &str = "AI-powered response using Google Gemini";
pub const CLINIC_DISCLAIMER: &str = "These recommendations are AI-generated. Please verify clinic details before visiting. Always call ahead to confirm availability and services.";

/// One clinic as described by the model. Every field is optional on the
/// wire because the model does not always fill them all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClinicRecommendation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub distance: String,
}

/// Indian PIN code: six digits, not starting with zero.
pub fn is_valid_pincode(pincode: &str) -> bool {
    let bytes = pincode.as_bytes();
    bytes.len() == 6 && (b'1'..=b'9').contains(&bytes[0]) && bytes.iter().all(u8::is_ascii_digit)
}

/// Body of a fenced code block if the reply has one, else the trimmed reply.
pub fn strip_code_fence(reply: &str) -> &str {
    let reply = reply.trim();
    let Some(start) = reply.find("```") else {
        return reply;
    };
    let body = &reply[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse a JSON array of clinics out of a model reply.
pub fn parse_clinics(reply: &str) -> Result<Vec<ClinicRecommendation>, serde_json::Error> {
    serde_json::from_str(strip_code_fence(reply))
}

/// Generic clinics returned when PIN code lookup fails.
pub fn fallback_clinics(pincode: &str, limit: usize) -> Vec<ClinicRecommendation> {
    let clinic = |name: &str, services: &[&str], specialties: &[&str], hours: &str, emergency, rating, notes: &str| {
        ClinicRecommendation {
            name: name.to_string(),
            address: format!("Near Pin Code {pincode}, India"),
            phone: "+91-XXXXXXXXXX".to_string(),
            services: services.iter().map(|s| s.to_string()).collect(),
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            hours: hours.to_string(),
            emergency,
            rating: Some(rating),
            notes: notes.to_string(),
            distance: "Contact for exact location".to_string(),
        }
    };

    let mut clinics = vec![
        clinic(
            "City Veterinary Clinic",
            &["General Checkup", "Vaccination", "Surgery", "Emergency Care"],
            &["Small Animals", "General Practice"],
            "Mon-Sat: 9:00 AM - 8:00 PM, Sun: 10:00 AM - 2:00 PM",
            false,
            4.0,
            "Please verify clinic details before visiting",
        ),
        clinic(
            "Pet Care Hospital",
            &["General Checkup", "Vaccination", "Surgery", "Dental Care", "Emergency Care"],
            &["Dogs", "Cats", "Emergency Services"],
            "Mon-Sun: 24 Hours",
            true,
            4.3,
            "24/7 emergency services available",
        ),
        clinic(
            "Animal Wellness Center",
            &["General Checkup", "Vaccination", "Grooming", "Dental Care"],
            &["Preventive Care", "Wellness Programs"],
            "Mon-Sat: 10:00 AM - 7:00 PM",
            false,
            4.2,
            "Focus on preventive and wellness care",
        ),
    ];
    clinics.truncate(limit);
    clinics
}

// ─── Prompts ─────────────────────────────────────────────────

pub fn build_city_prompt(city: &str, limit: u32) -> String {
    format!(
        r#"You are a veterinary clinic directory assistant for India. Provide a list of {limit} reputable veterinary clinics and animal hospitals in {city}, India.

For each clinic, provide the following information in JSON format:
- name: Full clinic name
- address: Complete street address
- phone: Contact phone number (with +91 country code)
- services: Array of services offered (e.g., ["General Checkup", "Vaccination", "Surgery", "Emergency Care"])
- specialties: Array of specialties (e.g., ["Small Animal Medicine", "Surgery", "Dental Care"])
- hours: Operating hours (e.g., "Mon-Sat: 9:00 AM - 8:00 PM, Sun: Closed")
- emergency: Boolean indicating if 24/7 emergency services available
- rating: Rating out of 5.0 (realistic ratings between 3.8-4.9)
- notes: Brief note about the clinic (1-2 sentences)
- distance: Approximate distance from city center (e.g., "2.5 km from center")

Return ONLY a valid JSON array of clinic objects, nothing else. No markdown, no explanations, just the JSON array.

Example format:
```json
[
  {{
    "name": "Example Vet Clinic",
    "address": "123 Main Street, {city}, State, PIN",
    "phone": "+91-XXXXXXXXXX",
    "services": ["General Checkup", "Vaccination"],
    "specialties": ["Small Animal Medicine"],
    "hours": "Mon-Sat: 9:00 AM - 7:00 PM",
    "emergency": false,
    "rating": 4.5,
    "notes": "Well-established clinic with experienced vets.",
    "distance": "1.5 km from center"
  }}
]
```

Provide {limit} clinics for {city}, India."#
    )
}

pub fn build_pincode_prompt(pincode: &str, limit: u32) -> String {
    format!(
        r#"You are a local veterinary directory assistant for India.

Please provide a list of {limit} well-known, reputable veterinary clinics near pin code {pincode} in India. For each clinic, provide:

1. **Name**: Full clinic name
2. **Address**: Complete street address
3. **Phone**: Contact phone number (with country code +91)
4. **Services**: List of main services offered (e.g., General Checkup, Emergency Care, Surgery, Vaccination, etc.)
5. **Specialties**: Any special areas of expertise
6. **Hours**: Typical operating hours (if known)
7. **Emergency**: Whether they offer 24/7 emergency services (true/false)
8. **Rating**: Approximate rating out of 5 (if known)
9. **Notes**: Any additional helpful information

Format your response as a JSON array of clinic objects. Use this exact structure:

```json
[
  {{
    "name": "Clinic Name",
    "address": "Full address with pin code",
    "phone": "+91-XXXXXXXXXX",
    "services": ["Service 1", "Service 2", "Service 3"],
    "specialties": ["Specialty 1", "Specialty 2"],
    "hours": "Mon-Sat: 9:00 AM - 8:00 PM, Sun: 10:00 AM - 6:00 PM",
    "emergency": true,
    "rating": 4.5,
    "notes": "Additional information",
    "distance": "Approximate distance from pin code {pincode} (e.g., '2.5 km')"
  }}
]
```

IMPORTANT:
- Focus on clinics actually near pin code {pincode}
- Include the approximate distance from the pin code
- Provide {limit} clinics, ordered by proximity/relevance
- Provide ONLY the JSON array, no additional text before or after."#
    )
}

pub fn build_question_prompt(question: &str, pincode: Option<&str>, clinics_context: &str) -> String {
    let location = match pincode {
        Some(pin) => format!("near pin code {pin}"),
        None => "in their area".to_string(),
    };
    format!(
        r#"You are a helpful veterinary clinic advisor for India. A pet owner {location} is asking about veterinary clinics.

Available Veterinary Clinics:
{clinics_context}

User's Question: "{question}"

Please provide a helpful, detailed answer to their question. Consider:
- The specific clinics available and their features
- Services, specialties, and ratings
- Distance and accessibility
- Emergency services availability
- Any specific needs mentioned in the question

Provide a conversational, informative response that directly answers their question. If they're asking for recommendations, explain your reasoning based on the clinic details provided.

Keep your response concise but informative (2-4 paragraphs maximum)."#
    )
}

pub struct VetAdvisor {
    model: Arc<dyn GenerativeModel>,
}

impl VetAdvisor {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    async fn ask_model(&self, prompt: String) -> Result<String, AppError> {
        self.model
            .generate_content(GenerateRequest::text(prompt))
            .await
            .map(|reply| reply.trim().to_string())
            .map_err(|e| AppError::Oracle(e.to_string()))
    }

    /// Clinics in a city. Model and parse failures are errors.
    pub async fn clinics_by_city(
        &self,
        city: &str,
        limit: u32,
    ) -> Result<Vec<ClinicRecommendation>, AppError> {
        let reply = self
            .ask_model(build_city_prompt(city, limit))
            .await
            .map_err(|e| {
                tracing::error!(city, error = %e, "City clinic lookup failed");
                e
            })?;

        parse_clinics(&reply).map_err(|e| {
            tracing::error!(city, error = %e, reply_len = reply.len(), "Unparseable clinic list");
            AppError::Oracle(format!("Failed to parse AI response: {e}"))
        })
    }

    /// Clinics near a PIN code. Falls back to generic listings when the
    /// model fails or its reply does not parse.
    pub async fn clinics_by_pincode(&self, pincode: &str, limit: u32) -> Vec<ClinicRecommendation> {
        let clinics = match self.ask_model(build_pincode_prompt(pincode, limit)).await {
            Ok(reply) => parse_clinics(&reply).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match clinics {
            Ok(clinics) => {
                tracing::debug!(pincode, count = clinics.len(), "Clinic recommendations parsed");
                clinics
            }
            Err(error) => {
                tracing::warn!(pincode, error = %error, "Clinic lookup failed, using fallback list");
                fallback_clinics(pincode, limit as usize)
            }
        }
    }

    /// Answer a question about clinics the caller already has.
    pub async fn answer_question(
        &self,
        question: &str,
        pincode: Option<&str>,
        clinics_context: &str,
    ) -> Result<String, AppError> {
        self.ask_model(build_question_prompt(question, pincode, clinics_context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pincode_format() {
        assert!(is_valid_pincode("411001"));
        assert!(!is_valid_pincode("011001"));
        assert!(!is_valid_pincode("41100"));
        assert!(!is_valid_pincode("4110011"));
        assert!(!is_valid_pincode("41100a"));
        assert!(!is_valid_pincode("४११००१"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("Here you go:\n```\n[2]\n```\nEnjoy"), "[2]");
        assert_eq!(strip_code_fence("  [3]  "), "[3]");
        assert_eq!(strip_code_fence("```json\n[4]"), "[4]");
    }

    #[test]
    fn test_parse_clinics_tolerates_missing_fields() {
        let clinics = parse_clinics(
            "```json\n[{\"name\": \"Paws Clinic\", \"emergency\": true, \"rating\": 4.6}]\n```",
        )
        .unwrap();
        assert_eq!(clinics.len(), 1);
        assert_eq!(clinics[0].name, "Paws Clinic");
        assert!(clinics[0].emergency);
        assert_eq!(clinics[0].rating, Some(4.6));
        assert!(clinics[0].services.is_empty());

        assert!(parse_clinics("I could not find any clinics.").is_err());
    }

    #[test]
    fn test_fallback_respects_limit() {
        assert_eq!(fallback_clinics("411001", 10).len(), 3);
        let one = fallback_clinics("411001", 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].address, "Near Pin Code 411001, India");
    }

    #[test]
    fn test_question_prompt_location() {
        let prompt = build_question_prompt("Which is open on Sunday?", Some("560001"), "[]");
        assert!(prompt.contains("A pet owner near pin code 560001 is asking"));
        assert!(prompt.contains("User's Question: \"Which is open on Sunday?\""));

        let prompt = build_question_prompt("Any cat specialists?", None, "[]");
        assert!(prompt.contains("A pet owner in their area is asking"));
    }
}
