//! Claim fraud scoring service entry point
//!
//! Loads the model artifacts once, then serves `/predict` and `/health`.
//! The process refuses to start without a complete artifact set.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sinistre_fraud_service::{create_router, inference::ModelArtifacts, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sinistre_fraud_service=info,tower_http=info".into());
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        "Starting {} v{}",
        config.service_name,
        config.model_version
    );

    let artifacts = match ModelArtifacts::load(&config) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            tracing::error!("Unable to load model artifacts: {}", e);
            tracing::error!("Shutting down");
            std::process::exit(1);
        }
    };
    tracing::info!(
        features = artifacts.schema.len(),
        estimators = artifacts.model.n_estimators(),
        model_sha256 = %artifacts.fingerprints.model,
        "Model artifacts ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    let app = create_router(AppState::ready(config, artifacts));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Ready to accept requests on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
