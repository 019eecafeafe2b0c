//! Feature Schema - ordered column names the model was fitted on
//!
//! Plays the role of a fixed feature layout: the extractor reindexes every
//! record to exactly this order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Serialized descriptor; extra keys written by training are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaArtifact {
    pub features: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err("feature schema is empty".to_string());
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(format!("feature '{}' appears twice in the schema", name));
            }
        }

        Ok(Self { names })
    }

    pub fn from_artifact(artifact: SchemaArtifact) -> Result<Self, String> {
        Self::new(artifact.features)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_follow_declared_order() {
        let schema = FeatureSchema::new(["rc", "totalPrimeNette", "montant_total_regle"]).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.names()[1], "totalPrimeNette");
    }

    #[test]
    fn test_ignores_extra_descriptor_keys() {
        let artifact: SchemaArtifact = serde_json::from_str(
            r#"{"features": ["a", "b"], "categorical_features": ["usage"]}"#,
        )
        .unwrap();
        let schema = FeatureSchema::from_artifact(artifact).unwrap();
        assert_eq!(schema.names(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(FeatureSchema::new(["a", "a"]).is_err());
        assert!(FeatureSchema::new(Vec::<String>::new()).is_err());
    }
}
