//! Health model

use serde::Serialize;

use crate::inference::ArtifactFingerprints;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    pub features: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactFingerprints>,
    pub timestamp: i64,
}
