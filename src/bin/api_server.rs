// API Server Binary Entry Point
//
// Usage: cargo run --features api --bin api_server

use ect_engine_rust::engine::EctEngine;
use ect_engine_rust::seed::seed_sample_data;
use ect_engine_rust::sms::SmsClient;
use ect_engine_rust::store::AssessmentStore;
use ect_engine_rust::{create_router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // Default log level: info for our crate, warn for others
                "ect_engine_rust=info,tower_http=debug,axum=debug,warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables
    let model_path: PathBuf = std::env::var("MODEL_PATH")
        .unwrap_or_else(|_| "artifacts/ect_model.json".to_string())
        .into();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let seed = std::env::var("SEED").map(|v| v == "1").unwrap_or(false);

    tracing::info!("Configuration:");
    tracing::info!("  MODEL_PATH: {:?}", model_path);
    tracing::info!("  PORT: {}", port);
    tracing::info!("  SEED: {}", seed);

    // Model load is best-effort; a missing artifact means rule-only mode
    let engine = EctEngine::from_artifact(&model_path);

    let mut store = AssessmentStore::new();
    if seed {
        let summary = seed_sample_data(&mut store, &engine)?;
        tracing::info!(
            "Seeded {} households / {} assessments for disaster {}",
            summary.households,
            summary.assessments,
            summary.disaster_id
        );
    }

    let state = AppState::new(store, engine, SmsClient::from_env());

    // Create router with all endpoints and middleware
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
