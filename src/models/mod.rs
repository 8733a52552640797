// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod coordinate;
pub mod pet;
pub mod provider;
pub mod summary;
pub mod symptom_check;
pub mod user;

pub use coordinate::{Coordinate, GeoError};
pub use pet::{Gender, Lifestyle, Pet};
pub use provider::{Provider, ProviderResponse};
pub use summary::{PetHealthSummary, PetHealthSummaryHistoryEntry, Season};
pub use symptom_check::{
    ChatMessage, DetailedSection, FeedbackType, HealthCategory, RiskLevel, SymptomCheck,
};
pub use user::{Address, OwnerLocation, User};
