//! Claim Fraud Scoring Service
//!
//! Serves a pre-fitted Isolation Forest over HTTP.
//!
//! # Architecture
//!
//! ```text
//! POST /predict
//!     │
//!     ▼
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌─────────┐   ┌──────────┐
//! │ Validate │──▶│ Features  │──▶│ Scaler  │──▶│ Forest  │──▶│ Response │
//! └──────────┘   └───────────┘   └─────────┘   └─────────┘   └──────────┘
//!                      ▲               ▲             ▲
//!                      └───── ModelArtifacts (loaded once) ─────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};
use inference::ModelArtifacts;

/// Readiness of the prediction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Artifacts not loaded, every prediction is refused
    NotReady,
    /// Artifacts loaded for the rest of the process lifetime
    Ready,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub artifacts: Option<Arc<ModelArtifacts>>,
}

impl AppState {
    pub fn ready(config: Config, artifacts: ModelArtifacts) -> Self {
        Self {
            config: Arc::new(config),
            artifacts: Some(Arc::new(artifacts)),
        }
    }

    pub fn not_ready(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            artifacts: None,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        match self.artifacts {
            Some(_) => ServiceStatus::Ready,
            None => ServiceStatus::NotReady,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        // No body size limit on predictions
        .route(
            "/predict",
            post(handlers::predict::predict).layer(DefaultBodyLimit::disable()),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
