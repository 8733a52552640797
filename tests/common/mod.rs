// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use chrono::{DateTime, Duration, Utc};
use pet_health_companion::config::Config;
use pet_health_companion::db::{DocumentStore, FirestoreDb, MemoryDb};
use pet_health_companion::middleware::auth::Claims;
use pet_health_companion::models::{
    Address, Gender, HealthCategory, Pet, Provider, RiskLevel, SymptomCheck, User,
};
use pet_health_companion::routes::create_router;
use pet_health_companion::services::{GenerateRequest, GenerativeModel, OracleError};
use pet_health_companion::AppState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Sign a week-long session token for `user_id`, as the auth service does.
#[allow(dead_code)]
pub fn create_jwt(user_id: &str, signing_key: &[u8]) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(7)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Generative model returning scripted replies in order.
///
/// Once the script runs out every call fails, which exercises the
/// fallback paths.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        let model = Self::default();
        model
            .replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| Ok(r.to_string())));
        Arc::new(model)
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, error: &str) {
        self.replies.lock().unwrap().push_back(Err(error.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate_content(&self, request: GenerateRequest) -> Result<String, OracleError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("connection refused".to_string()))
            .map_err(OracleError::Unavailable)
    }
}

/// Test harness: router plus handles on its collaborators.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
    pub model: Arc<ScriptedModel>,
}

/// Create a test app over an in-memory store.
#[allow(dead_code)]
pub fn create_test_app(model: Arc<ScriptedModel>) -> TestApp {
    let config = Config::default();
    let db = Arc::new(MemoryDb::new());
    let state = Arc::new(AppState::new(config, db.clone(), model.clone()));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        model,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub fn token(&self, user_id: &str) -> String {
        create_jwt(user_id, &self.state.config.jwt_signing_key)
    }

    /// Send a request, optionally as `user_id`, with an optional JSON body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        user_id: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        use tower::ServiceExt;

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token(user_id)),
            );
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ─── Fixtures ────────────────────────────────────────────────

#[allow(dead_code)]
pub fn test_user(id: &str, city: Option<&str>) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: "Test Owner".to_string(),
        contact_number: Some("+919876543210".to_string()),
        emergency_contact: None,
        address: city.map(|city| Address {
            street: None,
            city: city.to_string(),
            state: "Maharashtra".to_string(),
            zip_code: "411001".to_string(),
            country: "India".to_string(),
        }),
        location: None,
    }
}

#[allow(dead_code)]
pub fn test_pet(id: &str, owner_id: &str) -> Pet {
    let now = Utc::now();
    Pet {
        id: id.to_string(),
        user_id: owner_id.to_string(),
        name: "Bruno".to_string(),
        breed: "Labrador Retriever".to_string(),
        age: 4.0,
        gender: Gender::Male,
        weight: Some(30.0),
        photo: None,
        lifestyle: None,
        conditions: vec!["Hip dysplasia".to_string()],
        allergies: vec![],
        created_at: now,
        updated_at: now,
    }
}

#[allow(dead_code)]
pub fn test_check(id: &str, user_id: &str, pet_id: &str, at: DateTime<Utc>) -> SymptomCheck {
    SymptomCheck {
        id: id.to_string(),
        user_id: Some(user_id.to_string()),
        pet_id: Some(pet_id.to_string()),
        category: HealthCategory::Health,
        health_subcategory: None,
        symptoms: "Limping on the left hind leg".to_string(),
        images: vec![],
        video: None,
        risk_level: RiskLevel::Monitor,
        summary: "Mild lameness".to_string(),
        detailed_sections: vec![],
        immediate_actions: vec![],
        reasoning: String::new(),
        messages: vec![],
        feedback: None,
        feedback_reason: None,
        resolved: false,
        resolved_at: None,
        timestamp: at,
    }
}

#[allow(dead_code)]
pub fn test_provider(id: &str, city: &str, lat: f64, lon: f64, rating: f64, is_24x7: bool) -> Provider {
    Provider {
        id: id.to_string(),
        name: format!("{city} Pet Clinic {id}"),
        phone: "+912200000000".to_string(),
        address: "Station Road".to_string(),
        city: city.to_string(),
        state: "Maharashtra".to_string(),
        latitude: lat,
        longitude: lon,
        operating_hours: if is_24x7 { "24 Hours" } else { "9 AM - 8 PM" }.to_string(),
        rating,
        is_24x7,
        services: vec!["Vaccination".to_string()],
    }
}

/// Seed an owner and one of their pets.
#[allow(dead_code)]
pub async fn seed_owner_with_pet(db: &MemoryDb, user_id: &str, pet_id: &str, city: Option<&str>) {
    db.upsert_user(&test_user(user_id, city)).await.unwrap();
    db.upsert_pet(&test_pet(pet_id, user_id)).await.unwrap();
}
