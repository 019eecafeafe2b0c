//! Scorer - scale, score and turn the forest output into a fraud decision

use ndarray::ArrayView1;

use super::forest::{IsolationForest, Verdict};
use super::loader::ModelArtifacts;
use super::InferenceError;

/// Decimal places reported for `confidence` and `anomalyScore`
pub const SCORE_DECIMALS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub verdict: Verdict,
    /// Raw `decision_function` value
    pub anomaly_score: f64,
    /// Unrounded `1 - (anomaly_score - offset) / 2`
    pub confidence: f64,
}

impl ScoreOutcome {
    pub fn is_fraud(&self) -> bool {
        self.verdict.is_anomaly()
    }
}

/// Confidence from the decision value and the fitted offset; not clamped
pub fn confidence(anomaly_score: f64, offset: f64) -> f64 {
    1.0 - (anomaly_score - offset) / 2.0
}

/// Round to `decimals` places by correctly rounding the exact binary value
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

pub struct Scorer<'a> {
    artifacts: &'a ModelArtifacts,
}

impl<'a> Scorer<'a> {
    pub fn new(artifacts: &'a ModelArtifacts) -> Self {
        Self { artifacts }
    }

    pub fn score(&self, row: ArrayView1<f64>) -> Result<ScoreOutcome, InferenceError> {
        let scaled = self.artifacts.scaler.transform(row)?.to_vec();

        let model = &self.artifacts.model;
        let anomaly_score = model.decision_function(&scaled)?;

        Ok(ScoreOutcome {
            verdict: IsolationForest::verdict_for(anomaly_score),
            anomaly_score,
            confidence: confidence(anomaly_score, model.offset()),
        })
    }
}
