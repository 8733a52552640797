// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Symptom analysis: prompt construction, model call and reply parsing.
//!
//! The model is asked to answer in a fixed sectioned format:
//!
//! ```text
//! RISK_LEVEL: URGENT
//!
//! CONTEXT USED:
//! ...
//! ASSESSMENT:
//! ...
//! WHAT THIS MEANS:
//! • ...
//! IMMEDIATE ACTIONS:
//! 1. ...
//! ```
//!
//! [`parse_reply`] turns that text into an [`Assessment`]. When the model
//! cannot be reached, a keyword classifier picks one of four canned
//! assessments instead, so analysis always produces an answer.

use crate::models::{
    DetailedSection, Gender, HealthCategory, Lifestyle, OwnerLocation, Pet, RiskLevel, Season,
    SymptomCheck,
};
use crate::error::AppError;
use crate::services::media;
use crate::services::oracle::{GenerateRequest, GenerativeModel, Part};
use crate::time_utils::format_short_date;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const RISK_LEVEL_MARKER: &str = "RISK_LEVEL:";
pub const CONTEXT_USED: &str = "CONTEXT USED:";
pub const ASSESSMENT: &str = "ASSESSMENT:";
pub const WHAT_THIS_MEANS: &str = "WHAT THIS MEANS:";
pub const IMMEDIATE_ACTIONS: &str = "IMMEDIATE ACTIONS:";

const SECTION_HEADERS: [&str; 4] = [CONTEXT_USED, ASSESSMENT, WHAT_THIS_MEANS, IMMEDIATE_ACTIONS];

const DEFAULT_SUMMARY: &str = "Professional veterinary assessment completed";
const DEFAULT_ACTIONS: [&str; 3] = [
    "Monitor your pet closely",
    "Contact your veterinarian",
    "Document any changes in symptoms",
];
const MAX_ACTIONS: usize = 3;
const MAX_REASONING_CHARS: usize = 500;

/// Number of history entries of each kind shown in the prompt.
const PROMPT_HISTORY_ENTRIES: usize = 3;
const ACTIVE_SUMMARY_CHARS: usize = 150;
const RESOLVED_SUMMARY_CHARS: usize = 100;

/// Structured outcome of one symptom analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub risk_level: RiskLevel,
    pub summary: String,
    pub detailed_sections: Vec<DetailedSection>,
    pub immediate_actions: Vec<String>,
    pub reasoning: String,
}

/// Earlier symptom check as shown to the model.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub date: DateTime<Utc>,
    pub category: HealthCategory,
    pub subcategory: Option<String>,
    pub risk_level: RiskLevel,
    pub summary: String,
}

impl From<&SymptomCheck> for HistoryItem {
    fn from(check: &SymptomCheck) -> Self {
        Self {
            date: check.timestamp,
            category: check.category,
            subcategory: check.health_subcategory.clone(),
            risk_level: check.risk_level,
            summary: check.summary.clone(),
        }
    }
}

/// Everything known about the pet that informs the assessment.
#[derive(Debug, Clone)]
pub struct PetContext {
    pub name: String,
    pub breed: String,
    pub age: f64,
    pub gender: Gender,
    pub weight: Option<f64>,
    pub lifestyle: Option<Lifestyle>,
    pub conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub season: Option<Season>,
    pub location: Option<OwnerLocation>,
    /// Unresolved checks, newest first
    pub active_history: Vec<HistoryItem>,
    /// Resolved checks, newest first
    pub resolved_history: Vec<HistoryItem>,
}

impl PetContext {
    /// Build context from a pet profile and its recent checks (newest first).
    pub fn from_pet(pet: &Pet, recent_checks: &[SymptomCheck]) -> Self {
        let (resolved, active): (Vec<&SymptomCheck>, Vec<&SymptomCheck>) =
            recent_checks.iter().partition(|c| c.resolved);

        Self {
            name: pet.name.clone(),
            breed: pet.breed.clone(),
            age: pet.age,
            gender: pet.gender,
            weight: pet.weight,
            lifestyle: pet.lifestyle,
            conditions: pet.conditions.clone(),
            allergies: pet.allergies.clone(),
            season: None,
            location: None,
            active_history: active.into_iter().map(HistoryItem::from).collect(),
            resolved_history: resolved.into_iter().map(HistoryItem::from).collect(),
        }
    }
}

/// A symptom submission ready for analysis.
#[derive(Debug, Clone)]
pub struct SymptomSubmission {
    pub symptoms: String,
    pub category: HealthCategory,
    pub subcategory: Option<String>,
    pub pet_context: Option<PetContext>,
    /// Base64 images (at most 3, validated by the caller)
    pub images: Vec<String>,
    pub video: Option<String>,
}

/// Runs symptom analysis against the generative model.
#[derive(Clone)]
pub struct SymptomAnalyzer {
    model: Arc<dyn GenerativeModel>,
}

impl SymptomAnalyzer {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Analyze a submission. Never fails: model errors fall back to the
    /// keyword classifier.
    pub async fn analyze(&self, submission: &SymptomSubmission) -> Assessment {
        let symptoms = effective_symptoms(
            &submission.symptoms,
            submission.category,
            !submission.images.is_empty(),
            submission.video.is_some(),
        );
        let prompt = build_prompt(
            &symptoms,
            submission.category,
            submission.subcategory.as_deref(),
            submission.pet_context.as_ref(),
        );

        let mut parts = media::prepare_images(&submission.images);
        parts.push(Part::Text(prompt));
        if let Some(video) = &submission.video {
            match media::prepare_video(video) {
                Ok(part) => parts.push(part),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable video"),
            }
        }

        let request = GenerateRequest {
            parts,
            relaxed_safety: true,
        };

        tracing::info!(
            category = %submission.category,
            images = request.image_count(),
            has_video = submission.video.is_some(),
            has_pet_context = submission.pet_context.is_some(),
            "Analyzing symptoms"
        );

        match self.model.generate_content(request).await {
            Ok(reply) => {
                let assessment = parse_reply(&reply);
                tracing::info!(risk_level = %assessment.risk_level, "Symptom analysis complete");
                assessment
            }
            Err(e) => {
                let risk_level = classify_risk(&symptoms);
                tracing::warn!(
                    error = %e,
                    risk_level = %risk_level,
                    "Generative model failed, using keyword assessment"
                );
                canned_assessment(risk_level)
            }
        }
    }

    /// Answer a follow-up question in the symptom chat. The reply always
    /// ends with [`FOLLOWUP_DISCLAIMER`].
    pub async fn follow_up(&self, question: &str, conversation: &str) -> Result<String, AppError> {
        let prompt = build_followup_prompt(question, conversation);
        let request = GenerateRequest {
            parts: vec![Part::Text(prompt)],
            relaxed_safety: true,
        };

        let answer = self.model.generate_content(request).await.map_err(|e| {
            tracing::error!(error = %e, "Follow-up answer failed");
            AppError::Oracle(format!("Failed to answer follow-up question: {e}"))
        })?;

        Ok(format!("{}\n\n---\n\n{FOLLOWUP_DISCLAIMER}", answer.trim()))
    }
}

/// Symptom text sent to the model; blank text is replaced by a request to
/// look at the attached media.
pub fn effective_symptoms(
    symptoms: &str,
    category: HealthCategory,
    has_images: bool,
    has_video: bool,
) -> String {
    if !symptoms.trim().is_empty() {
        return symptoms.to_string();
    }
    let category = category.as_str().to_lowercase();
    if has_images {
        format!("Please analyze the uploaded image(s) for any visible health concerns in the {category} category.")
    } else if has_video {
        format!("Please analyze the uploaded video for any visible health concerns in the {category} category.")
    } else {
        format!("General {category} assessment requested.")
    }
}

/// Appended to every follow-up answer.
pub const FOLLOWUP_DISCLAIMER: &str = "⚕️ **DISCLAIMER:** This is an AI-generated assessment for informational purposes only. It does not replace professional veterinary advice, diagnosis, or treatment. Always consult with a licensed veterinarian for medical concerns. In case of emergency, seek immediate veterinary care.";

/// Prompt for a follow-up question after the initial assessment.
pub fn build_followup_prompt(question: &str, conversation: &str) -> String {
    format!(
        r#"You are an experienced veterinarian having a conversation with a concerned pet owner. They've already described their pet's symptoms and received an initial assessment. Now they have a follow-up question.

Previous Conversation:
{conversation}

Pet Owner's Follow-up Question: "{question}"

Please provide a helpful, conversational response as if you're continuing the discussion in your clinic. Consider:
- The context of the previous conversation
- Any symptoms or concerns already mentioned
- Provide clear, actionable advice
- Be empathetic and professional
- If the question requires seeing the pet in person, say so clearly
- If it's an emergency, emphasize urgency

Keep your response conversational and informative (2-4 paragraphs). Write as if speaking directly to the pet owner."#
    )
}

// ─── Prompt ──────────────────────────────────────────────────

const PROMPT_INSTRUCTIONS: &str = "INSTRUCTIONS:
Provide a clear, concise response in this EXACT format. Be empathetic but direct. Avoid repetition.

1. First, determine the RISK LEVEL (choose ONE):
   - EMERGENCY: Life-threatening, needs immediate vet care NOW
   - URGENT: Needs vet within 12-24 hours
   - MONITOR: Can monitor at home for 24-48 hours, see vet if worsens
   - LOW RISK: Minor concern, routine vet visit sufficient

2. Provide your response in this EXACT format:

RISK_LEVEL: [EMERGENCY/URGENT/MONITOR/LOW RISK]

CONTEXT USED:
[In 1-2 sentences, briefly mention what context you considered: pet's profile (breed, age, medical conditions), location/climate, season, previous health history if available, and any photos/videos provided. Be specific about what information helped your assessment.]

ASSESSMENT:
[2-3 concise sentences explaining what you observe and why it matters. Be empathetic but direct. If EMERGENCY, start with \"⚠️ TAKE YOUR PET TO THE EMERGENCY VET NOW.\"]

WHAT THIS MEANS:
• [Key medical concern #1 - one line]
• [Key medical concern #2 - one line]
• [Key medical concern #3 - one line if needed]

IMMEDIATE ACTIONS:
1. [First action with specific timeframe]
2. [Second action]
3. [Third action]

Remember:
- Be concise and to the point
- Show empathy through tone, not length
- No repetition between sections
- Use specific timeframes
- If emergency, emphasize urgency clearly once
- Do NOT include a separate SUMMARY line
- Do NOT include \"WHAT TO EXPECT AT THE VET\" section
- ALWAYS include the CONTEXT USED section to show what information informed your assessment
";

/// Render numbers the way people write them: `3` rather than `3.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// First `max` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn history_line(index: usize, item: &HistoryItem) -> String {
    let mut line = format!(
        "\n{}. {} - {}",
        index + 1,
        format_short_date(item.date),
        item.category
    );
    if let Some(sub) = item.subcategory.as_deref().filter(|s| !s.is_empty()) {
        line.push_str(&format!(" ({sub})"));
    }
    line
}

fn render_pet_context(ctx: &PetContext) -> String {
    let mut text = String::from("\n\nPET PROFILE:");
    text.push_str(&format!("\n- Name: {}", ctx.name));
    text.push_str(&format!("\n- Breed: {}", ctx.breed));
    text.push_str(&format!("\n- Age: {} years old", format_number(ctx.age)));
    text.push_str(&format!("\n- Gender: {}", ctx.gender));
    if let Some(weight) = ctx.weight.filter(|w| *w > 0.0) {
        text.push_str(&format!("\n- Weight: {} kg", format_number(weight)));
    }
    if let Some(lifestyle) = ctx.lifestyle {
        text.push_str(&format!("\n- Lifestyle: {lifestyle}"));
    }
    text.push_str(&format!(
        "\n- Known Medical Conditions: {}",
        join_or_none(&ctx.conditions)
    ));
    text.push_str(&format!("\n- Known Allergies: {}", join_or_none(&ctx.allergies)));

    if let Some(season) = ctx.season {
        text.push_str(&format!("\n- Current Season: {season}"));
    }
    if let Some(loc) = &ctx.location {
        if !loc.city.is_empty() && !loc.state.is_empty() {
            text.push_str(&format!("\n- Location: {}, {}", loc.city, loc.state));
            if let Some(pin) = &loc.pincode {
                text.push_str(&format!(" (PIN: {pin})"));
            }
        }
    }

    if !ctx.active_history.is_empty() {
        text.push_str(&format!(
            "\n\nACTIVE HEALTH CONCERNS ({} ongoing):",
            ctx.active_history.len()
        ));
        for (i, item) in ctx
            .active_history
            .iter()
            .take(PROMPT_HISTORY_ENTRIES)
            .enumerate()
        {
            text.push_str(&history_line(i, item));
            text.push_str(&format!(" - Risk: {}", item.risk_level));
            if !item.summary.is_empty() {
                text.push_str(&format!(
                    "\n   Summary: {}...",
                    truncate_chars(&item.summary, ACTIVE_SUMMARY_CHARS)
                ));
            }
        }
    }

    if !ctx.resolved_history.is_empty() {
        text.push_str(&format!(
            "\n\nRESOLVED PAST ISSUES ({} addressed):",
            ctx.resolved_history.len()
        ));
        for (i, item) in ctx
            .resolved_history
            .iter()
            .take(PROMPT_HISTORY_ENTRIES)
            .enumerate()
        {
            text.push_str(&history_line(i, item));
            text.push_str(&format!(" - Was: {} (Now Resolved)", item.risk_level));
            if !item.summary.is_empty() {
                text.push_str(&format!(
                    "\n   Note: {}... [Issue has been addressed]",
                    truncate_chars(&item.summary, RESOLVED_SUMMARY_CHARS)
                ));
            }
        }
    }

    text
}

/// Render the veterinary assessment prompt.
pub fn build_prompt(
    symptoms: &str,
    category: HealthCategory,
    subcategory: Option<&str>,
    pet_context: Option<&PetContext>,
) -> String {
    let subcategory = subcategory.filter(|s| !s.is_empty()).unwrap_or("General");
    let context = pet_context.map(render_pet_context).unwrap_or_default();

    format!(
        "You are an experienced veterinarian providing a professional assessment. Analyze the following case and provide a concise, empathetic response.

CASE INFORMATION:
- Category: {category}
- Subcategory: {subcategory}{context}

SYMPTOMS DESCRIBED:
{symptoms}

{PROMPT_INSTRUCTIONS}"
    )
}

// ─── Reply parsing ───────────────────────────────────────────

fn parse_risk_level(lines: &[&str]) -> RiskLevel {
    lines
        .iter()
        .map(|line| line.trim_start())
        .find_map(|line| line.strip_prefix(RISK_LEVEL_MARKER))
        .and_then(RiskLevel::from_reply_token)
        .unwrap_or(RiskLevel::Monitor)
}

fn strip_list_number(line: &str) -> &str {
    if line.starts_with(|c: char| c.is_ascii_digit()) {
        line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
            .trim()
    } else {
        line
    }
}

fn parse_sections(lines: &[&str]) -> Vec<DetailedSection> {
    let mut sections = Vec::new();
    let mut current: Option<DetailedSection> = None;

    for raw in lines {
        let line = raw.trim();
        if line.starts_with(RISK_LEVEL_MARKER) {
            continue;
        }

        if SECTION_HEADERS.iter().any(|header| *header == line) {
            if let Some(section) = current.take().filter(|s| !s.points.is_empty()) {
                sections.push(section);
            }
            current = Some(DetailedSection {
                title: line.trim_end_matches(':').to_string(),
                points: Vec::new(),
            });
            continue;
        }

        if let Some(section) = current.as_mut() {
            if line.is_empty() {
                continue;
            }
            let point = if section.title == IMMEDIATE_ACTIONS.trim_end_matches(':') {
                strip_list_number(line)
            } else {
                line
            };
            section.points.push(point.to_string());
        }
    }

    if let Some(section) = current.filter(|s| !s.points.is_empty()) {
        sections.push(section);
    }
    sections
}

fn section_points<'a>(sections: &'a [DetailedSection], header: &str) -> Option<&'a [String]> {
    let title = header.trim_end_matches(':');
    sections
        .iter()
        .find(|s| s.title == title)
        .map(|s| s.points.as_slice())
}

/// Parse a sectioned model reply into an assessment.
pub fn parse_reply(reply: &str) -> Assessment {
    let lines: Vec<&str> = reply.trim().lines().collect();

    let risk_level = parse_risk_level(&lines);
    let detailed_sections = parse_sections(&lines);

    let summary = section_points(&detailed_sections, ASSESSMENT)
        .map(|points| points.join(" "))
        .unwrap_or_else(|| DEFAULT_SUMMARY.to_string());

    let immediate_actions = match section_points(&detailed_sections, IMMEDIATE_ACTIONS) {
        Some(points) => points.iter().take(MAX_ACTIONS).cloned().collect(),
        None => DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect(),
    };

    let reasoning = truncate_chars(&summary, MAX_REASONING_CHARS).to_string();

    Assessment {
        risk_level,
        summary,
        detailed_sections,
        immediate_actions,
        reasoning,
    }
}

// ─── Keyword fallback ────────────────────────────────────────

const EMERGENCY_KEYWORDS: &[&str] = &[
    "bleeding",
    "blood",
    "seizure",
    "unconscious",
    "collapse",
    "difficulty breathing",
    "choking",
    "poisoning",
    "toxic",
    "severe pain",
    "trauma",
    "accident",
    "hit by",
    "broken bone",
    "not breathing",
    "unresponsive",
    "convulsion",
    "bloat",
    "pale gums",
    "blue gums",
    "distended abdomen",
];

const URGENT_KEYWORDS: &[&str] = &[
    "vomiting",
    "diarrhea",
    "not eating",
    "lethargic",
    "fever",
    "limping",
    "swelling",
    "discharge",
    "coughing",
    "sneezing",
    "scratching excessively",
    "loss of appetite",
    "dehydrated",
    "painful",
    "whining",
    "restless",
    "rapid breathing",
];

const DURATION_KEYWORDS: &[&str] = &["days", "week", "weeks", "persistent", "continuous"];

const MINOR_KEYWORDS: &[&str] = &[
    "mild",
    "slight",
    "occasional",
    "sometimes",
    "minor",
    "small",
    "little",
    "bit",
];

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Keyword risk classification used when the model is unavailable.
pub fn classify_risk(symptoms: &str) -> RiskLevel {
    let text = symptoms.to_lowercase();

    if mentions_any(&text, EMERGENCY_KEYWORDS) {
        RiskLevel::Emergency
    } else if mentions_any(&text, URGENT_KEYWORDS) {
        if mentions_any(&text, DURATION_KEYWORDS) {
            RiskLevel::Urgent
        } else {
            RiskLevel::Monitor
        }
    } else if mentions_any(&text, MINOR_KEYWORDS) {
        RiskLevel::LowRisk
    } else {
        RiskLevel::Monitor
    }
}

const ASSISTANT_TITLE: &str = "Your Intelligent Pet Health Assistant";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fixed assessment for each risk tier.
pub fn canned_assessment(risk_level: RiskLevel) -> Assessment {
    let (summary, assistant, (title, points), actions, reasoning): (
        &str,
        [&str; 3],
        (&str, [&str; 4]),
        [&str; 3],
        &str,
    ) = match risk_level {
        RiskLevel::Emergency => (
            "EMERGENCY: Your pet needs immediate veterinary attention.",
            [
                "I need to be direct with you - based on what you've described, this is an emergency situation that requires immediate veterinary care.",
                "The symptoms you're seeing indicate a potentially life-threatening condition. We cannot wait to see if this improves on its own.",
                "Time is critical here. The sooner your pet receives professional medical care, the better the outcome will be.",
            ],
            (
                "Why This Can't Wait",
                [
                    "These symptoms can progress rapidly in pets",
                    "Delaying care could lead to serious complications",
                    "Emergency vets have the equipment and expertise needed right now",
                    "Early intervention significantly improves outcomes",
                ],
            ),
            [
                "Call emergency vet NOW - let them know you're coming",
                "Transport pet carefully and calmly",
                "Bring all medical records and recent medications",
            ],
            "Based on the symptoms described, this requires immediate professional medical attention. The symptoms indicate a potentially life-threatening condition that cannot wait.",
        ),
        RiskLevel::Urgent => (
            "Your pet needs veterinary care within 12-24 hours.",
            [
                "From what you've described, I'm concerned enough that I want you to see a veterinarian within the next 12-24 hours.",
                "While this isn't immediately life-threatening, the symptoms suggest something that needs professional evaluation and treatment soon.",
                "These symptoms can worsen quickly, and early treatment often leads to better outcomes and less complicated care.",
            ],
            (
                "What to Monitor",
                [
                    "Watch for any worsening of current symptoms",
                    "Note if new symptoms develop",
                    "Monitor eating, drinking, and bathroom habits",
                    "If symptoms worsen significantly, seek emergency care",
                ],
            ),
            [
                "Schedule vet appointment for tomorrow or within 24 hours",
                "Monitor symptoms closely and document changes",
                "Keep pet comfortable and limit strenuous activity",
            ],
            "The symptoms described suggest a condition that requires professional evaluation. While not immediately life-threatening, prompt veterinary care is important to prevent complications.",
        ),
        RiskLevel::Monitor => (
            "Monitor your pet for 24-48 hours. Seek vet care if symptoms persist or worsen.",
            [
                "Based on what you've told me, this appears to be something we can monitor at home for now.",
                "That said, I want you to keep a close eye on things. Sometimes what seems minor can develop into something more significant.",
                "If symptoms persist beyond 48 hours or get worse, that's when we need to have a vet take a look. Trust your instincts - you know your pet best.",
            ],
            (
                "Home Care Guidelines",
                [
                    "Maintain normal feeding and water schedule",
                    "Provide a comfortable, quiet resting area",
                    "Avoid strenuous exercise or stressful situations",
                    "Keep a symptom diary noting any changes",
                ],
            ),
            [
                "Monitor closely for next 24-48 hours",
                "Keep a log of symptoms and any changes",
                "Contact vet if symptoms worsen or new ones appear",
            ],
            "The symptoms described are concerning but may resolve with monitoring and supportive care. Professional evaluation is recommended if symptoms persist or worsen.",
        ),
        RiskLevel::LowRisk => (
            "Minor concern. Continue normal care and mention at next vet visit.",
            [
                "Good news - what you're describing doesn't raise any immediate red flags for me.",
                "This appears to be a minor issue that typically resolves on its own with normal care.",
                "That said, it's always worth mentioning to your vet at your next regular checkup, just to keep them in the loop about your pet's health history.",
            ],
            (
                "General Care Tips",
                [
                    "Continue your normal feeding and exercise routine",
                    "Keep up with regular grooming and hygiene",
                    "Maintain scheduled vaccinations and preventive care",
                    "Stay observant for any changes in behavior or symptoms",
                ],
            ),
            [
                "Continue normal care routine",
                "Monitor casually - no need for intensive watching",
                "Mention to vet at next regular checkup",
            ],
            "The symptoms described appear to be minor and likely not cause for immediate concern. However, it's always good to monitor your pet's health and consult with a veterinarian if you have any concerns.",
        ),
    };

    Assessment {
        risk_level,
        summary: summary.to_string(),
        detailed_sections: vec![
            DetailedSection::new(ASSISTANT_TITLE, &assistant),
            DetailedSection::new(title, &points),
        ],
        immediate_actions: strings(&actions),
        reasoning: reasoning.to_string(),
    }
}
