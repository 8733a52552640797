//! Pet profile model (owned by the pet CRUD layer, read here for context).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifestyle {
    Indoor,
    Outdoor,
    Mixed,
}

impl std::fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifestyle::Indoor => write!(f, "indoor"),
            Lifestyle::Outdoor => write!(f, "outdoor"),
            Lifestyle::Mixed => write!(f, "mixed"),
        }
    }
}

/// Pet profile stored in the `pets` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Document ID
    pub id: String,
    /// Owning user
    #[serde(alias = "user_id")]
    pub user_id: String,
    pub name: String,
    pub breed: String,
    /// Age in years
    pub age: f64,
    pub gender: Gender,
    /// Weight in kg
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub lifestyle: Option<Lifestyle>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}
