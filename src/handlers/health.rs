//! Health check handler

use axum::{extract::State, http::StatusCode, Json};

use crate::models::HealthResponse;
use crate::{AppState, ServiceStatus};

pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let artifacts = state.artifacts.as_deref();

    let (status_code, status) = match state.status() {
        ServiceStatus::Ready => (StatusCode::OK, "healthy"),
        ServiceStatus::NotReady => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    let body = HealthResponse {
        status,
        service: state.config.service_name.clone(),
        version: state.config.model_version.clone(),
        model_loaded: artifacts.is_some(),
        algorithm: artifacts.map(|a| a.model.algorithm().to_string()),
        features: artifacts.map_or(0, |a| a.schema.len()),
        artifacts: artifacts.map(|a| a.fingerprints.clone()),
        timestamp: chrono::Utc::now().timestamp(),
    };

    (status_code, Json(body))
}
