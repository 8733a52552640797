// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cached AI health summaries per pet.
//!
//! A summary is regenerated only when something it was built from has
//! changed: the season, whether the owner's location is known, or the pet's
//! symptom-check history. Every regeneration appends a history entry and
//! replaces the current record, which points back at that entry.

use crate::db::DocumentStore;
use crate::error::AppError;
use crate::models::{
    OwnerLocation, Pet, PetHealthSummary, PetHealthSummaryHistoryEntry, Season, SymptomCheck,
    User,
};
use crate::services::oracle::{GenerateRequest, GenerativeModel};
use crate::services::symptom_analysis::{format_number, truncate_chars};
use crate::time_utils::{format_long_date, format_month_year};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Symptom checks considered per summary.
pub const MAX_CHECKS_ANALYZED: usize = 100;
/// History entries returned by the listing.
pub const MAX_HISTORY_ENTRIES: usize = 100;

pub const HISTORY_PERIOD: &str = "All available history";
pub const SOURCE_GENERATED: &str = "AI-powered analysis using Google Gemini";
pub const SOURCE_CACHED: &str = "Cached summary (no new chat history)";

const PROMPT_ENTRIES: usize = 5;
const ACTIVE_EXCERPTS: usize = 5;
const ACTIVE_EXCERPT_CHARS: usize = 300;
const RESOLVED_EXCERPTS: usize = 3;
const RESOLVED_EXCERPT_CHARS: usize = 200;
const MIN_EXCERPT_CHARS: usize = 10;

/// Why a summary has to be generated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationReason {
    Forced,
    NoSummary,
    SeasonChanged,
    LocationChanged,
    CheckCountChanged,
    NewerChecks,
}

impl RegenerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationReason::Forced => "forced",
            RegenerationReason::NoSummary => "no_summary",
            RegenerationReason::SeasonChanged => "season_changed",
            RegenerationReason::LocationChanged => "location_changed",
            RegenerationReason::CheckCountChanged => "check_count_changed",
            RegenerationReason::NewerChecks => "newer_checks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Fresh,
    Regenerate(RegenerationReason),
}

/// Decide whether `cached` still describes the pet's current situation.
///
/// Checks are applied in a fixed order and the first mismatch wins.
pub fn evaluate_cache(
    cached: Option<&PetHealthSummary>,
    force: bool,
    season: Season,
    has_location_data: bool,
    checks: &[SymptomCheck],
) -> CacheDecision {
    use RegenerationReason::*;

    if force {
        return CacheDecision::Regenerate(Forced);
    }
    let Some(cached) = cached else {
        return CacheDecision::Regenerate(NoSummary);
    };
    if cached.season != season {
        return CacheDecision::Regenerate(SeasonChanged);
    }
    if cached.has_location_data != has_location_data {
        return CacheDecision::Regenerate(LocationChanged);
    }
    if cached.checks_analyzed != checks.len() {
        return CacheDecision::Regenerate(CheckCountChanged);
    }
    if checks.iter().any(|c| c.timestamp > cached.generated_at) {
        return CacheDecision::Regenerate(NewerChecks);
    }
    CacheDecision::Fresh
}

/// Summary as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PetSummaryResponse {
    pub pet_id: String,
    pub pet_name: String,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
    pub history_period: String,
    pub checks_analyzed: usize,
    pub source: String,
    pub cached: bool,
}

impl PetSummaryResponse {
    /// `pet_name` is the pet's current name, which may differ from the
    /// one recorded when the summary was generated.
    fn from_record(record: &PetHealthSummary, pet_name: &str, source: &str, cached: bool) -> Self {
        Self {
            pet_id: record.pet_id.clone(),
            pet_name: pet_name.to_string(),
            summary: record.summary.clone(),
            generated_at: record.generated_at,
            history_period: record.history_period.clone(),
            checks_analyzed: record.checks_analyzed,
            source: source.to_string(),
            cached,
        }
    }
}

/// Per-pet regeneration guards.
type RegenerationLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Inputs that do not depend on the cache state.
struct SummaryContext {
    now: DateTime<Utc>,
    season: Season,
    location: Option<OwnerLocation>,
    has_location_data: bool,
}

impl SummaryContext {
    fn new(owner: &User, now: DateTime<Utc>) -> Self {
        Self {
            now,
            season: Season::at(now),
            location: owner.owner_location(),
            has_location_data: owner.has_location_data(),
        }
    }
}

pub struct PetSummaryService {
    db: Arc<dyn DocumentStore>,
    model: Arc<dyn GenerativeModel>,
    locks: RegenerationLocks,
}

impl PetSummaryService {
    pub fn new(db: Arc<dyn DocumentStore>, model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            db,
            model,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Serve the cached summary for `pet`, regenerating it when stale or
    /// when `force` is set.
    pub async fn get_or_generate(
        &self,
        pet: &Pet,
        owner: &User,
        force: bool,
    ) -> Result<PetSummaryResponse, AppError> {
        let context = SummaryContext::new(owner, Utc::now());

        if !force {
            let (cached, checks) = self.load(&pet.id).await?;
            let decision = evaluate_cache(
                cached.as_ref(),
                false,
                context.season,
                context.has_location_data,
                &checks,
            );
            if let (CacheDecision::Fresh, Some(cached)) = (decision, cached.as_ref()) {
                tracing::debug!(pet_id = %pet.id, "Serving cached pet summary");
                return Ok(PetSummaryResponse::from_record(cached, &pet.name, SOURCE_CACHED, true));
            }
        }

        let lock = self
            .locks
            .entry(pet.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another request may have regenerated while we waited.
        let (cached, checks) = self.load(&pet.id).await?;
        let reason = match evaluate_cache(
            cached.as_ref(),
            force,
            context.season,
            context.has_location_data,
            &checks,
        ) {
            CacheDecision::Regenerate(reason) => reason,
            CacheDecision::Fresh => {
                if let Some(cached) = cached.as_ref() {
                    return Ok(PetSummaryResponse::from_record(cached, &pet.name, SOURCE_CACHED, true));
                }
                RegenerationReason::NoSummary
            }
        };

        tracing::info!(
            pet_id = %pet.id,
            reason = reason.as_str(),
            checks = checks.len(),
            season = %context.season,
            has_location = context.has_location_data,
            "Regenerating pet summary"
        );

        let record = self.regenerate(pet, &checks, &context).await?;
        Ok(PetSummaryResponse::from_record(
            &record,
            &pet.name,
            SOURCE_GENERATED,
            false,
        ))
    }

    /// Newest history entries for a pet.
    pub async fn history(
        &self,
        pet_id: &str,
    ) -> Result<Vec<PetHealthSummaryHistoryEntry>, AppError> {
        self.db.list_summary_history(pet_id, MAX_HISTORY_ENTRIES).await
    }

    /// Delete one history entry, dropping the current record too when it
    /// was built from that entry.
    pub async fn delete_history_entry(
        &self,
        entry: &PetHealthSummaryHistoryEntry,
    ) -> Result<(), AppError> {
        self.db.delete_summary_history(&entry.id).await?;

        let current = self.db.get_pet_summary(&entry.pet_id).await?;
        if current.is_some_and(|c| c.history_id.as_deref() == Some(entry.id.as_str())) {
            tracing::info!(
                pet_id = %entry.pet_id,
                summary_id = %entry.id,
                "Deleted history entry backing the current summary"
            );
            self.db.delete_pet_summary(&entry.pet_id).await?;
        }
        Ok(())
    }

    async fn load(
        &self,
        pet_id: &str,
    ) -> Result<(Option<PetHealthSummary>, Vec<SymptomCheck>), AppError> {
        let cached = self.db.get_pet_summary(pet_id).await?;
        let checks = self
            .db
            .list_symptom_checks_for_pet(pet_id, MAX_CHECKS_ANALYZED)
            .await?;
        Ok((cached, checks))
    }

    async fn regenerate(
        &self,
        pet: &Pet,
        checks: &[SymptomCheck],
        context: &SummaryContext,
    ) -> Result<PetHealthSummary, AppError> {
        let climate = match context.location.as_ref().filter(|_| context.has_location_data) {
            Some(location) => self.climate_blurb(pet, location, context).await,
            None => None,
        };

        let prompt = build_summary_prompt(pet, checks, context, climate.as_deref());
        let reply = self
            .model
            .generate_content(GenerateRequest::text(prompt))
            .await
            .map_err(|e| {
                tracing::error!(pet_id = %pet.id, error = %e, "Pet summary generation failed");
                AppError::Oracle(format!("Failed to generate summary: {e}"))
            })?;

        let entry = PetHealthSummaryHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id: pet.id.clone(),
            pet_name: pet.name.clone(),
            summary: reply.trim().to_string(),
            generated_at: context.now,
            history_period: HISTORY_PERIOD.to_string(),
            checks_analyzed: checks.len(),
            has_location_data: context.has_location_data,
            season: context.season,
            created_at: context.now,
        };

        self.db.insert_summary_history(&entry).await?;
        let record = entry.to_current();
        self.db.upsert_pet_summary(&record).await?;

        tracing::info!(pet_id = %pet.id, summary_id = %entry.id, "Stored pet summary");
        Ok(record)
    }

    /// Short climate description for the owner's area; failures are
    /// logged and the blurb is left out.
    async fn climate_blurb(
        &self,
        pet: &Pet,
        location: &OwnerLocation,
        context: &SummaryContext,
    ) -> Option<String> {
        let place = location.display_name();
        let prompt = build_climate_prompt(&place, context.season, context.now);
        match self.model.generate_content(GenerateRequest::text(prompt)).await {
            Ok(text) => Some(format!(
                "\n\nLocal Climate Context ({place}, {}):\n{}",
                context.season,
                text.trim()
            )),
            Err(e) => {
                tracing::warn!(pet_id = %pet.id, error = %e, "Climate lookup failed, continuing without it");
                None
            }
        }
    }
}

// ─── Prompts ─────────────────────────────────────────────────

pub fn build_climate_prompt(place: &str, season: Season, now: DateTime<Utc>) -> String {
    format!(
        "Provide a brief climate analysis for {place}, India during {season} season ({month}). Include:\n\
         1. Typical weather conditions for this season in this location\n\
         2. Temperature range (in Celsius)\n\
         3. Humidity levels\n\
         4. Specific weather-related pet health concerns for this location and season\n\
         \n\
         Keep the response concise (3-4 sentences maximum). Focus on information relevant to pet health.",
        month = format_month_year(now),
    )
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

fn pet_profile(pet: &Pet) -> String {
    let weight = pet
        .weight
        .map(|w| format!("{} kg", format_number(w)))
        .unwrap_or_else(|| "Not specified".to_string());
    let lifestyle = pet
        .lifestyle
        .map(|l| l.to_string())
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        "Pet Profile:\n\
         - Name: {}\n\
         - Breed: {}\n\
         - Age: {} years\n\
         - Gender: {}\n\
         - Weight: {weight}\n\
         - Lifestyle: {lifestyle}\n\
         - Medical Conditions: {}\n\
         - Allergies: {}",
        pet.name,
        pet.breed,
        format_number(pet.age),
        pet.gender,
        join_or_none(&pet.conditions),
        join_or_none(&pet.allergies),
    )
}

fn location_block(context: &SummaryContext) -> String {
    let mut out = String::new();
    if let Some(location) = &context.location {
        let _ = write!(
            out,
            "\n\nOwner's Location:\n- City: {}, {}",
            location.city, location.state
        );
        if let Some(pin) = &location.pincode {
            let _ = write!(out, "\n- PIN Code: {pin}");
        }
    }
    let _ = write!(
        out,
        "\n- Current Season: {} ({})\n- Date: {}",
        context.season,
        context.season.description(),
        format_long_date(context.now)
    );
    out
}

fn category_line(check: &SymptomCheck) -> String {
    match &check.health_subcategory {
        Some(sub) => format!("\nCategory: {} - {sub}", check.category),
        None => format!("\nCategory: {}", check.category),
    }
}

/// Owner-written chat lines worth quoting: the first `take` user messages,
/// keeping those with real content, cut to `max_chars`.
fn excerpts(check: &SymptomCheck, take: usize, max_chars: usize) -> Vec<&str> {
    check
        .user_messages()
        .take(take)
        .filter(|m| m.content.chars().count() > MIN_EXCERPT_CHARS)
        .map(|m| truncate_chars(&m.content, max_chars))
        .collect()
}

fn history_block(active: &[&SymptomCheck], resolved: &[&SymptomCheck]) -> String {
    if active.is_empty() && resolved.is_empty() {
        return "\n\nHealth History: No health check conversations recorded yet.".to_string();
    }

    let mut out = String::new();

    if !active.is_empty() {
        let _ = write!(
            out,
            "\n\nACTIVE HEALTH CONCERNS ({} ongoing):\n",
            active.len()
        );
        for (i, check) in active.iter().take(PROMPT_ENTRIES).enumerate() {
            let _ = write!(
                out,
                "\n--- Active Concern #{} ({}) ---",
                i + 1,
                format_long_date(check.timestamp)
            );
            out.push_str(&category_line(check));
            let _ = write!(out, "\nRisk Level: {}", check.risk_level);
            let _ = write!(out, "\nAssessment: {}", check.summary);

            if !check.messages.is_empty() {
                out.push_str("\n\nChat Details:");
                if check.user_messages().next().is_some() {
                    out.push_str("\nOwner's Concerns:");
                    for excerpt in excerpts(check, ACTIVE_EXCERPTS, ACTIVE_EXCERPT_CHARS) {
                        let _ = write!(out, "\n  • {excerpt}");
                    }
                }
            }
            out.push('\n');
        }
    }

    if !resolved.is_empty() {
        let _ = write!(
            out,
            "\n\nRESOLVED PAST ISSUES ({} addressed):\n\
             **Note:** These issues have been resolved but are included for historical context.\n",
            resolved.len()
        );
        for (i, check) in resolved.iter().take(PROMPT_ENTRIES).enumerate() {
            let resolved_on = check
                .resolved_at
                .map(|at| format!(" - Resolved: {}", format_long_date(at)))
                .unwrap_or_default();
            let _ = write!(
                out,
                "\n--- Past Issue #{} ({}{resolved_on}) (Now Resolved) ---",
                i + 1,
                format_long_date(check.timestamp)
            );
            out.push_str(&category_line(check));
            let _ = write!(out, "\nWas: {} (Now Resolved)", check.risk_level);
            let _ = write!(out, "\nPast Assessment: {}", check.summary);

            if check.user_messages().next().is_some() {
                out.push_str("\nPast Concerns (Now Addressed):");
                for excerpt in excerpts(check, RESOLVED_EXCERPTS, RESOLVED_EXCERPT_CHARS) {
                    let _ = write!(out, "\n  • {excerpt}");
                }
            }
            out.push('\n');
        }
    }

    out
}

fn location_instruction(context: &SummaryContext) -> String {
    let season = context.season;
    let description = season.description();
    match context.location.as_ref().filter(|_| context.has_location_data) {
        Some(location) => format!(
            "\n\n**IMPORTANT:** The pet owner is located in {}. It is currently {season} season ({description}). \
             Consider the local climate, current seasonal conditions, and region-specific health concerns when making recommendations. \
             Tailor your advice to be relevant for this specific location and season in India.",
            location.display_name()
        ),
        None => format!(
            "\n\n**IMPORTANT:** It is currently {season} season in India ({description}). \
             Consider seasonal health concerns and provide season-appropriate recommendations."
        ),
    }
}

fn checks_description(active: usize, resolved: usize) -> String {
    match (active, resolved) {
        (0, 0) => "no health conversations".to_string(),
        (a, 0) => format!("{a} active concern(s)"),
        (0, r) => format!("{r} resolved issue(s)"),
        (a, r) => format!("{a} active concern(s) and {r} resolved issue(s)"),
    }
}

fn build_summary_prompt(
    pet: &Pet,
    checks: &[SymptomCheck],
    context: &SummaryContext,
    climate: Option<&str>,
) -> String {
    let (resolved, active): (Vec<&SymptomCheck>, Vec<&SymptomCheck>) =
        checks.iter().partition(|c| c.resolved);

    let mut pet_info = pet_profile(pet);
    pet_info.push_str(&location_block(context));
    if let Some(climate) = climate {
        pet_info.push_str(climate);
    }

    let history = history_block(&active, &resolved);
    let location = location_instruction(context);
    let season = context.season;
    let name = &pet.name;

    let checks_text = checks_description(active.len(), resolved.len());
    let based_on = if climate.is_some() {
        format!("Pet profile, {checks_text}, local climate, and {season} season analysis")
    } else {
        format!("Pet profile, {checks_text}, and {season} season context")
    };

    format!(
        r#"You are an experienced veterinarian creating a personalized health summary for a beloved pet. Analyze the following information and generate a clear, concise, and personal summary.

{pet_info}
{history}
{location}

**IMPORTANT CONTEXT INTERPRETATION:**
- "ACTIVE HEALTH CONCERNS" are ongoing issues that need attention
- "RESOLVED PAST ISSUES" are problems that have been addressed but provide historical context
- When making recommendations, focus on active concerns and prevention
- Acknowledge resolved issues briefly to show awareness of the pet's health journey
- Do not treat resolved issues as current problems requiring immediate action

Create a health summary with this EXACT structure and formatting:

# 🐾 Health Summary for {name}

**Based on:** {based_on}

## Current Health Overview
[Write 2-3 sentences about {name}'s current health status. Be personal and direct - use "your" when referring to the owner. Mention key facts like age, breed, and any notable conditions. MUST mention how the current {season} season might affect the pet's health. Don't repeat information unnecessarily.]

## Key Observations
[Write 2-3 sentences highlighting the most important patterns or findings from the health history. If there are recurring issues, mention them. If the pet is healthy, acknowledge that. MUST consider current {season} season factors and how they relate to the pet's health. Be specific and avoid generic statements.]

## Recommendations

CRITICAL: Format recommendations as a NUMBERED list with each on a new line. MUST include at least 1-2 season-specific recommendations for {season} season:

1. First specific actionable recommendation here (consider local climate if applicable)
2. Second specific actionable recommendation here
3. Third specific actionable recommendation here
4. Fourth specific actionable recommendation here
5. Fifth specific actionable recommendation here

Each recommendation must:
- Start with a number followed by period and space (e.g., "1. ")
- Be on its own line
- Be specific and actionable (what to DO, not just monitor)
- Be concise (one sentence)
- MUST consider current {season} season and provide season-appropriate advice
- If location data available, also consider local climate

Example format for {season} season:
1. Schedule a dental cleaning within the next month
2. During {season} season, [specific seasonal recommendation based on weather]
3. Switch to senior dog food formulated for joint health
4. [Another season-specific recommendation]

---

**Important:** Keep the ENTIRE summary under 300 words. Be direct, personal, and actionable. Avoid:
- Repeating the same information multiple times
- Generic advice that applies to all pets
- Verbose explanations - get straight to the point
- Medical jargon - use simple language

Write as if you're speaking directly to {name}'s owner in a caring but efficient manner, with awareness of their local environment."#
    )
}
