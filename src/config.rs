//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Serialized Isolation Forest
    pub model_path: PathBuf,

    /// Serialized feature scaler
    pub scaler_path: PathBuf,

    /// Ordered feature names the model was fitted on
    pub features_path: PathBuf,

    /// Version reported in every prediction
    pub model_version: String,

    /// Service name reported in prediction metadata
    pub service_name: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: PathBuf::from("models/isolation_forest_sinistre_model.json"),
            scaler_path: PathBuf::from("models/scaler_sinistre.json"),
            features_path: PathBuf::from("models/features_sinistre.json"),
            model_version: "1.1.0".to_string(),
            service_name: "fraud-detection-v1-sinistre".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            scaler_path: env::var("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.scaler_path),

            features_path: env::var("FEATURES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.features_path),

            model_version: env::var("MODEL_VERSION").unwrap_or(defaults.model_version),

            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_artifact_layout() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(
            config.model_path,
            PathBuf::from("models/isolation_forest_sinistre_model.json")
        );
        assert_eq!(config.service_name, "fraud-detection-v1-sinistre");
        assert!(!config.is_production());
    }
}
