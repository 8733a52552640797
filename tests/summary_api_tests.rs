// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pet health summary API tests: caching, regeneration and history.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pet_health_companion::db::DocumentStore;
use pet_health_companion::models::{PetHealthSummary, Season};
use serde_json::Value;

mod common;
use common::{
    create_test_app, json_body, seed_owner_with_pet, test_check, test_pet, ScriptedModel,
};

const SUMMARY_URI: &str = "/api/v1/recommendations/pet-summary/pet-1";
const HISTORY_URI: &str = "/api/v1/recommendations/pet-summary-history/pet-1";

async fn history(app: &common::TestApp) -> Value {
    let response = app.send("GET", HISTORY_URI, Some("owner-1"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

#[tokio::test]
async fn test_generate_then_serve_from_cache() {
    let app = create_test_app(ScriptedModel::replying(&["\n# 🐾 Health Summary for Bruno\nAll good.\n"]));
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;
    app.db
        .save_symptom_check(&test_check("c1", "owner-1", "pet-1", Utc::now() - Duration::days(2)))
        .await
        .unwrap();

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = json_body(response).await;
    assert_eq!(first["cached"], false);
    assert_eq!(first["petName"], "Bruno");
    assert_eq!(first["checksAnalyzed"], 1);
    assert_eq!(first["historyPeriod"], "All available history");
    assert_eq!(first["source"], "AI-powered analysis using Google Gemini");
    assert_eq!(first["summary"], "# 🐾 Health Summary for Bruno\nAll good.");

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    let second = json_body(response).await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["source"], "Cached summary (no new chat history)");
    assert_eq!(second["summary"], first["summary"]);
    assert_eq!(second["generatedAt"], first["generatedAt"]);

    assert_eq!(app.model.call_count(), 1);
    let history = history(&app).await;
    assert_eq!(history["count"], 1);
    assert_eq!(history["petName"], "Bruno");
}

#[tokio::test]
async fn test_cached_summary_reports_current_pet_name() {
    let app = create_test_app(ScriptedModel::replying(&["All good."]));
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    assert_eq!(json_body(response).await["petName"], "Bruno");

    let mut renamed = test_pet("pet-1", "owner-1");
    renamed.name = "Max".to_string();
    app.db.upsert_pet(&renamed).await.unwrap();

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    let body = json_body(response).await;
    assert_eq!(body["cached"], true);
    assert_eq!(body["petName"], "Max");
    assert_eq!(body["summary"], "All good.");
    assert_eq!(app.model.call_count(), 1);
}

#[tokio::test]
async fn test_new_check_invalidates_cache() {
    let app = create_test_app(ScriptedModel::replying(&["first", "second"]));
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    assert_eq!(json_body(response).await["checksAnalyzed"], 0);

    app.db
        .save_symptom_check(&test_check("c1", "owner-1", "pet-1", Utc::now()))
        .await
        .unwrap();

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    let body = json_body(response).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["summary"], "second");
    assert_eq!(body["checksAnalyzed"], 1);

    let history = history(&app).await;
    assert_eq!(history["count"], 2);
    let ids: Vec<&str> = history["summaries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_season_change_triggers_regeneration() {
    let app = create_test_app(ScriptedModel::replying(&["fresh"]));
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;

    let now = Utc::now();
    let stale_season = match Season::at(now) {
        Season::Winter => Season::Summer,
        _ => Season::Winter,
    };
    app.db
        .upsert_pet_summary(&PetHealthSummary {
            pet_id: "pet-1".to_string(),
            pet_name: "Bruno".to_string(),
            summary: "stale".to_string(),
            generated_at: now,
            history_period: "All available history".to_string(),
            checks_analyzed: 0,
            has_location_data: false,
            season: stale_season,
            updated_at: now,
            history_id: None,
        })
        .await
        .unwrap();

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    let body = json_body(response).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["summary"], "fresh");

    let current = app.db.get_pet_summary("pet-1").await.unwrap().unwrap();
    assert_eq!(current.season, Season::at(Utc::now()));
    assert!(current.history_id.is_some());
}

#[tokio::test]
async fn test_force_refresh_and_location_climate() {
    let app = create_test_app(ScriptedModel::replying(&[
        "Pune is hot in summer.",
        "first",
        "Pune is hot in summer.",
        "forced",
    ]));
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", Some("Pune")).await;

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    assert_eq!(json_body(response).await["summary"], "first");

    let response = app
        .send(
            "POST",
            &format!("{SUMMARY_URI}?force_refresh=true"),
            Some("owner-1"),
            None,
        )
        .await;
    let body = json_body(response).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["summary"], "forced");

    // Climate and summary prompt per generation
    assert_eq!(app.model.call_count(), 4);
    let current = app.db.get_pet_summary("pet-1").await.unwrap().unwrap();
    assert!(current.has_location_data);
}

#[tokio::test]
async fn test_model_failure_stores_nothing() {
    let app = create_test_app(ScriptedModel::failing());
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;

    let response = app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    assert!(app.db.get_pet_summary("pet-1").await.unwrap().is_none());
    assert_eq!(history(&app).await["count"], 0);
}

#[tokio::test]
async fn test_delete_history_entry_clears_current_summary() {
    let app = create_test_app(ScriptedModel::replying(&["only"]));
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;

    app.send("POST", SUMMARY_URI, Some("owner-1"), None).await;
    let current = app.db.get_pet_summary("pet-1").await.unwrap().unwrap();
    let entry_id = current.history_id.unwrap();
    let delete_uri = format!("/api/v1/recommendations/pet-summary-history/{entry_id}");

    let response = app.send("DELETE", &delete_uri, Some("intruder"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send("DELETE", &delete_uri, Some("owner-1"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Summary deleted successfully");
    assert_eq!(body["summaryId"], entry_id.as_str());
    assert_eq!(body["petId"], "pet-1");

    assert!(app.db.get_pet_summary("pet-1").await.unwrap().is_none());
    assert_eq!(history(&app).await["count"], 0);

    let response = app.send("DELETE", &delete_uri, Some("owner-1"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_summary_access_control() {
    let app = create_test_app(ScriptedModel::failing());
    seed_owner_with_pet(&app.db, "owner-1", "pet-1", None).await;

    let response = app.send("POST", SUMMARY_URI, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send("POST", SUMMARY_URI, Some("intruder"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send("GET", HISTORY_URI, Some("intruder"), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(
            "POST",
            "/api/v1/recommendations/pet-summary/missing",
            Some("owner-1"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(app.model.call_count(), 0);
}
