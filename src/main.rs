// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pet Health Companion API Server
//!
//! Veterinary provider search, AI symptom checks and cached per-pet
//! health summaries.

use pet_health_companion::{
    config::{Config, DatabaseBackend},
    db::{DocumentStore, FirestoreDb, MemoryDb},
    services::{GeminiClient, GenerativeModel},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Pet Health Companion API");

    let db: Arc<dyn DocumentStore> = match config.database_backend {
        DatabaseBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            tracing::info!(project = %config.gcp_project_id, "Firestore connected");
            Arc::new(db)
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory store; data will not survive a restart");
            Arc::new(MemoryDb::new())
        }
    };

    // One model client shared by symptom analysis and summaries
    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::from_config(&config)?);
    tracing::info!(model = %config.gemini_model, "Generative model client initialized");

    let state = Arc::new(AppState::new(config.clone(), db, model));

    // Build router
    let app = pet_health_companion::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pet_health_companion=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
