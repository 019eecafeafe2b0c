//! Inference Module - Claim Fraud Scoring
//!
//! Artifact loading, feature extraction and scoring are kept apart so the
//! HTTP layer only ever sees a ready `ModelArtifacts` and a finished score.

pub mod forest;
pub mod scaler;
pub mod schema;
pub mod loader;
pub mod record;
pub mod features;
pub mod scorer;

use thiserror::Error;

// Re-export common types
pub use forest::{IsolationForest, Verdict};
pub use scaler::Scaler;
pub use schema::FeatureSchema;
pub use loader::{ArtifactError, ArtifactFingerprints, ModelArtifacts};
pub use record::{FieldValue, SparseRecord};
pub use features::FeatureExtractor;
pub use scorer::{Scorer, ScoreOutcome};

/// Failure while turning an extracted row into a score
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("row has {actual} features, {stage} expects {expected}")]
    WidthMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("non-finite value produced by {0}")]
    NonFinite(&'static str),
}
