// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generative model client.
//!
//! The model is an opaque text completion service: it receives an ordered
//! list of parts (text and inline binary data) and returns text. Services
//! depend on the [`GenerativeModel`] trait so tests can script replies.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One piece of model input.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// A single generate-content call.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    /// Disable blocking for the four harm categories. Needed for clinical
    /// descriptions of injuries and poisoning.
    pub relaxed_safety: bool,
}

impl GenerateRequest {
    /// Text-only request with default safety settings.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            relaxed_safety: false,
        }
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::InlineData { mime_type, .. } if mime_type.starts_with("image/")))
            .count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Prompt blocked: {0}")]
    Blocked(String),

    #[error("Model returned no text")]
    EmptyReply,

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

/// Text/vision completion capability.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_content(&self, request: GenerateRequest) -> Result<String, OracleError>;
}

// ─── Wire format ─────────────────────────────────────────────

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum WirePart<'a> {
    Text(&'a str),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: &'a str,
        data: String,
    },
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn wire_body(request: &GenerateRequest) -> GenerateContentBody<'_> {
    let parts = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => WirePart::Text(text),
            Part::InlineData { mime_type, data } => WirePart::InlineData {
                mime_type,
                data: STANDARD.encode(data),
            },
        })
        .collect();

    let safety_settings = if request.relaxed_safety {
        HARM_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: "BLOCK_NONE",
            })
            .collect()
    } else {
        Vec::new()
    };

    GenerateContentBody {
        contents: [Content {
            role: "user",
            parts,
        }],
        safety_settings,
    }
}

fn reply_text(response: GenerateContentResponse) -> Result<String, OracleError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(OracleError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(OracleError::EmptyReply)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason.as_deref() {
            Some("SAFETY") => Err(OracleError::Blocked("SAFETY".to_string())),
            _ => Err(OracleError::EmptyReply),
        };
    }

    Ok(text)
}

// ─── Gemini client ───────────────────────────────────────────

/// Google Generative Language API client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            model,
            api_key,
        })
    }

    pub fn from_config(config: &crate::config::Config) -> Result<Self, OracleError> {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
            Duration::from_secs(config.oracle_timeout_secs),
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_content(&self, request: GenerateRequest) -> Result<String, OracleError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(
            model = %self.model,
            parts = request.parts.len(),
            images = request.image_count(),
            "Calling generative model"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&wire_body(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            if status == 429 {
                tracing::warn!("Generative model rate limit hit (429)");
            }
            return Err(OracleError::Status { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        reply_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_body_part_order_and_safety() {
        let request = GenerateRequest {
            parts: vec![
                Part::InlineData {
                    mime_type: "image/png".to_string(),
                    data: vec![1, 2, 3],
                },
                Part::Text("Describe".to_string()),
                Part::InlineData {
                    mime_type: "video/mp4".to_string(),
                    data: vec![4],
                },
            ],
            relaxed_safety: true,
        };
        let json = serde_json::to_value(wire_body(&request)).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "AQID");
        assert_eq!(parts[1]["text"], "Describe");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "video/mp4");
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(request.image_count(), 1);
    }

    #[test]
    fn test_default_safety_omitted() {
        let json = serde_json::to_value(wire_body(&GenerateRequest::text("hi"))).unwrap();
        assert!(json.get("safetySettings").is_none());
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "RISK_LEVEL: URGENT\n"}, {"text": "ASSESSMENT:\nok"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(
            reply_text(response).unwrap(),
            "RISK_LEVEL: URGENT\nASSESSMENT:\nok"
        );
    }

    #[test]
    fn test_reply_text_blocked_and_empty() {
        let blocked: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(matches!(reply_text(blocked), Err(OracleError::Blocked(_))));

        let empty: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(matches!(reply_text(empty), Err(OracleError::EmptyReply)));
    }
}
