//! Artifact Loader
//!
//! Reads the fitted forest, scaler and feature schema once at startup.
//! Any missing, unreadable or mutually inconsistent artifact fails the load;
//! the caller decides to abort. Nothing here is ever reloaded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::Config;
use super::forest::{ForestArtifact, IsolationForest};
use super::scaler::Scaler;
use super::schema::{FeatureSchema, SchemaArtifact};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{kind} file not found: {path}")]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("failed to read {kind} from {path}: {source}")]
    Io {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {kind} from {path}: {source}")]
    Parse {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },

    #[error("artifacts disagree: {0}")]
    Inconsistent(String),
}

/// SHA-256 of each artifact file, hex encoded
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactFingerprints {
    pub model: String,
    pub scaler: String,
    pub features: String,
}

/// Everything the pipeline needs, immutable once built
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: IsolationForest,
    pub scaler: Scaler,
    pub schema: FeatureSchema,
    pub fingerprints: ArtifactFingerprints,
}

impl ModelArtifacts {
    /// Load the three artifacts from the configured paths
    pub fn load(config: &Config) -> Result<Self, ArtifactError> {
        let (forest, model_sha): (ForestArtifact, _) = read_json("model", &config.model_path)?;
        tracing::info!(
            path = %config.model_path.display(),
            estimators = forest.estimators.len(),
            "Isolation Forest loaded"
        );

        let (scaler, scaler_sha): (Scaler, _) = read_json("scaler", &config.scaler_path)?;
        tracing::info!(path = %config.scaler_path.display(), "Scaler loaded");

        let (schema, features_sha): (SchemaArtifact, _) =
            read_json("feature schema", &config.features_path)?;
        tracing::info!(
            path = %config.features_path.display(),
            features = schema.features.len(),
            "Feature schema loaded"
        );

        let model = IsolationForest::from_artifact(forest)
            .map_err(|reason| ArtifactError::Invalid { kind: "model", reason })?;
        scaler
            .validate()
            .map_err(|reason| ArtifactError::Invalid { kind: "scaler", reason })?;
        let schema = FeatureSchema::from_artifact(schema)
            .map_err(|reason| ArtifactError::Invalid { kind: "feature schema", reason })?;

        Self::assemble(
            model,
            scaler,
            schema,
            ArtifactFingerprints {
                model: model_sha,
                scaler: scaler_sha,
                features: features_sha,
            },
        )
    }

    /// Bundle already-built artifacts after checking their widths agree
    pub fn assemble(
        model: IsolationForest,
        scaler: Scaler,
        schema: FeatureSchema,
        fingerprints: ArtifactFingerprints,
    ) -> Result<Self, ArtifactError> {
        if scaler.n_features() != schema.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "scaler expects {} features, schema lists {}",
                scaler.n_features(),
                schema.len()
            )));
        }
        if model.n_features() != schema.len() {
            return Err(ArtifactError::Inconsistent(format!(
                "model expects {} features, schema lists {}",
                model.n_features(),
                schema.len()
            )));
        }

        Ok(Self {
            model,
            scaler,
            schema,
            fingerprints,
        })
    }
}

fn read_json<T: DeserializeOwned>(
    kind: &'static str,
    path: &Path,
) -> Result<(T, String), ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound {
            kind,
            path: path.to_path_buf(),
        });
    }

    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    Ok((value, hex::encode(Sha256::digest(&bytes))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::forest::tests::stump_forest;

    fn write_artifacts(dir: &Path, features: &[&str], scale_len: usize) -> Config {
        let config = Config {
            model_path: dir.join("model.json"),
            scaler_path: dir.join("scaler.json"),
            features_path: dir.join("features.json"),
            ..Config::default()
        };

        fs::write(&config.model_path, serde_json::to_vec(&stump_forest()).unwrap()).unwrap();
        let scaler = Scaler::Standard {
            mean: Some(vec![0.0; scale_len]),
            scale: vec![1.0; scale_len],
        };
        fs::write(&config.scaler_path, serde_json::to_vec(&scaler).unwrap()).unwrap();
        fs::write(
            &config.features_path,
            serde_json::json!({ "features": features }).to_string(),
        )
        .unwrap();

        config
    }

    #[test]
    fn test_load_valid_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), &["a", "b"], 2);

        let artifacts = ModelArtifacts::load(&config).unwrap();
        assert_eq!(artifacts.schema.len(), 2);
        assert_eq!(artifacts.model.n_estimators(), 2);
        assert_eq!(artifacts.fingerprints.model.len(), 64);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), &["a", "b"], 2);
        fs::remove_file(&config.scaler_path).unwrap();

        let err = ModelArtifacts::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound { kind: "scaler", .. }));
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), &["a", "b"], 2);
        fs::write(&config.model_path, b"\x80\x04\x95 not json").unwrap();

        let err = ModelArtifacts::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { kind: "model", .. }));
    }

    #[test]
    fn test_width_disagreement_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_artifacts(dir.path(), &["a", "b", "c"], 3);

        let err = ModelArtifacts::load(&config).unwrap_err();
        assert!(matches!(err, ArtifactError::Inconsistent(_)));
    }
}
