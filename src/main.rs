// SPDX-License-Identifier: MIT

//! FitFlow API Server
//!
//! Personal fitness tracking: exercise templates, daily workout logs,
//! AI-generated workout plans (via an external webhook), and dashboard
//! statistics.

use fitflow::{config::Config, db::FirestoreDb, services::WebhookClient, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FitFlow API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize the workout-generation webhook client
    if config.webhook_url.is_none() {
        tracing::warn!("WEBHOOK_URL not set; plan send/regenerate flows are disabled");
    }
    let webhook = WebhookClient::new(config.webhook_url.clone(), config.jwt_signing_key.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        webhook,
    });

    // Build router
    let app = fitflow::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitflow=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
