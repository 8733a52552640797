// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Protected routes accept bearer and cookie sessions
//! 3. Optional-auth routes treat bad tokens as anonymous
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use pet_health_companion::db::DocumentStore;
use serde::Serialize;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod common;
use common::{create_test_app, json_body, test_check, ScriptedModel};

/// Create a JWT with an arbitrary expiry offset in seconds.
fn create_test_jwt(user_id: &str, signing_key: &[u8], expires_in: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
        iat: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + expires_in,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = create_test_app(ScriptedModel::failing());

    let response = app.send("GET", "/api/v1/symptom-checks", None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = create_test_app(ScriptedModel::failing());

    let response = app
        .router
        .clone()
        .oneshot(
            get("/api/v1/symptom-checks")
                .header(header::AUTHORIZATION, "Bearer invalid.token.here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_expired_token() {
    let app = create_test_app(ScriptedModel::failing());
    let token = create_test_jwt("owner-1", &app.state.config.jwt_signing_key, -3600);

    let response = app
        .router
        .clone()
        .oneshot(
            get("/api/v1/symptom-checks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let app = create_test_app(ScriptedModel::failing());
    let token = create_test_jwt("owner-1", &app.state.config.jwt_signing_key, 3600);

    let response = app
        .router
        .clone()
        .oneshot(
            get("/api/v1/symptom-checks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = create_test_app(ScriptedModel::failing());
    app.db
        .save_symptom_check(&test_check("c1", "owner-1", "pet-1", chrono::Utc::now()))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            get("/api/v1/symptom-checks/c1")
                .header(header::COOKIE, format!("session_token={}", app.token("owner-1")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["id"], "c1");
}

#[tokio::test]
async fn test_optional_auth_route_ignores_bad_token() {
    let app = create_test_app(ScriptedModel::failing());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/symptom-checks")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"category": "Exercise", "symptoms": "Tires quickly on walks"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert!(body["userId"].is_null());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app(ScriptedModel::failing());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/symptom-checks/c1/resolve")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("PATCH"));
}

#[tokio::test]
async fn test_public_route_no_auth_required() {
    let app = create_test_app(ScriptedModel::failing());

    let response = app.send("GET", "/api/v1/healthz", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::X_CONTENT_TYPE_OPTIONS],
        "nosniff"
    );
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}
