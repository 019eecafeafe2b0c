//! Prediction handler

use std::time::{Duration, Instant};

use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Local};

use crate::inference::scorer::{round_to, SCORE_DECIMALS};
use crate::inference::{FeatureExtractor, ModelArtifacts, Scorer, ScoreOutcome};
use crate::models::{ModelInfo, PredictRequest, PredictResponse, PredictionBody, ResponseMetadata};
use crate::{AppError, AppResult, AppState, Config};

/// Score one claim
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PredictResponse>> {
    let started = Instant::now();

    let artifacts = state
        .artifacts
        .as_deref()
        .ok_or(AppError::ModelUnavailable)?;

    let request = PredictRequest::from_body(&body)?;
    let outcome = run_pipeline(artifacts, &request)?;

    let request_id = request
        .request_id()
        .unwrap_or_else(|| format!("req-v1-{}", chrono::Utc::now().timestamp()));

    let response = build_response(
        &state.config,
        artifacts,
        &outcome,
        request_id,
        started.elapsed(),
        Local::now(),
    );

    tracing::info!(
        request_id = %response.metadata.request_id,
        verdict = outcome.verdict.label(),
        is_fraud = outcome.is_fraud(),
        anomaly_score = outcome.anomaly_score,
        elapsed_ms = response.metadata.processing_time_ms,
        "Prediction served"
    );

    Ok(Json(response))
}

/// Extraction, scaling and scoring for a validated request
pub fn run_pipeline(artifacts: &ModelArtifacts, request: &PredictRequest) -> AppResult<ScoreOutcome> {
    let (Some(contract), Some(sinistre)) = (&request.contract_data, &request.sinistre_data) else {
        return Err(AppError::ValidationError(
            "Both 'contractData' and 'sinistreData' are required".to_string(),
        ));
    };

    let row = FeatureExtractor::new().extract(contract, sinistre, &artifacts.schema);
    tracing::debug!(features = row.len(), "Feature row extracted");

    Ok(Scorer::new(artifacts).score(row.view())?)
}

/// Wrap a score into the response envelope
pub fn build_response(
    config: &Config,
    artifacts: &ModelArtifacts,
    outcome: &ScoreOutcome,
    request_id: String,
    elapsed: Duration,
    now: DateTime<Local>,
) -> PredictResponse {
    PredictResponse {
        prediction: PredictionBody {
            is_fraud: outcome.is_fraud(),
            confidence: round_to(outcome.confidence, SCORE_DECIMALS),
            anomaly_score: round_to(outcome.anomaly_score, SCORE_DECIMALS),
        },
        model: ModelInfo {
            version: config.model_version.clone(),
            algorithm: artifacts.model.algorithm().to_string(),
            kind: "real".to_string(),
        },
        metadata: ResponseMetadata {
            request_id,
            processing_time_ms: elapsed.as_millis() as u64,
            timestamp: now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            service: config.service_name.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::forest::tests::stump_forest;
    use crate::inference::{ArtifactFingerprints, FeatureSchema, IsolationForest, Scaler, Verdict};
    use chrono::TimeZone;

    fn artifacts() -> ModelArtifacts {
        ModelArtifacts::assemble(
            IsolationForest::from_artifact(stump_forest()).unwrap(),
            Scaler::Standard { mean: None, scale: vec![1.0, 1.0] },
            FeatureSchema::new(["rc", "montant_total_regle"]).unwrap(),
            ArtifactFingerprints::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_flags_large_settlement() {
        let artifacts = artifacts();
        let request = PredictRequest::from_body(
            br#"{"contractData": {"rc": 50}, "sinistreData": {"REGLEMENT_1": 2, "REGLEMENT_2": 1.5}}"#,
        )
        .unwrap();

        let outcome = run_pipeline(&artifacts, &request).unwrap();
        assert_eq!(outcome.verdict, Verdict::Anomaly);
    }

    #[test]
    fn test_response_rounds_and_stamps() {
        let artifacts = artifacts();
        let outcome = ScoreOutcome {
            verdict: Verdict::Normal,
            anomaly_score: 0.031_649_9,
            confidence: 1.0 - (0.031_649_9 + 0.5) / 2.0,
        };
        let now = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let response = build_response(
            &Config::default(),
            &artifacts,
            &outcome,
            "req-v1-1".to_string(),
            Duration::from_micros(2_900),
            now,
        );

        assert!(!response.prediction.is_fraud);
        assert_eq!(response.prediction.anomaly_score, 0.0316);
        assert_eq!(response.prediction.confidence, 0.7342);
        assert_eq!(response.metadata.processing_time_ms, 2);
        assert_eq!(response.metadata.timestamp, "2024-05-01T12:30:00.000000");
        assert_eq!(response.model.algorithm, "IsolationForest");
        assert_eq!(response.metadata.service, "fraud-detection-v1-sinistre");
    }
}
