//! Feature Scaler - pre-fitted column transformation
//!
//! Applied to the extracted row before scoring; must be the same transform
//! the forest was fitted behind.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::InferenceError;

/// Serialized scaler, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`; no centering when `mean` is absent
    Standard {
        #[serde(default)]
        mean: Option<Vec<f64>>,
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    /// Number of columns the scaler was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            Scaler::Standard { scale, .. } => scale.len(),
            Scaler::MinMax { scale, .. } => scale.len(),
        }
    }

    /// Structural checks run once at load
    pub fn validate(&self) -> Result<(), String> {
        let (name, other) = match self {
            Scaler::Standard { mean, scale } => {
                if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                    return Err("standard scaler has a zero or non-finite scale".to_string());
                }
                ("mean", mean.as_ref().map(Vec::len))
            }
            Scaler::MinMax { min, .. } => ("min", Some(min.len())),
        };

        if self.n_features() == 0 {
            return Err("scaler has no columns".to_string());
        }
        match other {
            Some(len) if len != self.n_features() => Err(format!(
                "scaler {} has {} entries but scale has {}",
                name,
                len,
                self.n_features()
            )),
            _ => Ok(()),
        }
    }

    pub fn transform(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, InferenceError> {
        if row.len() != self.n_features() {
            return Err(InferenceError::WidthMismatch {
                stage: "scaler",
                expected: self.n_features(),
                actual: row.len(),
            });
        }

        let scaled = match self {
            Scaler::Standard { mean, scale } => {
                let scale = ArrayView1::from(scale.as_slice());
                match mean {
                    Some(mean) => (&row - &ArrayView1::from(mean.as_slice())) / &scale,
                    None => &row / &scale,
                }
            }
            Scaler::MinMax { min, scale } => {
                &row * &ArrayView1::from(scale.as_slice()) + &ArrayView1::from(min.as_slice())
            }
        };

        if scaled.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite("scaler"));
        }

        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let scaler = Scaler::Standard {
            mean: Some(vec![1.0, 10.0]),
            scale: vec![2.0, 5.0],
        };
        let out = scaler.transform(array![3.0, 0.0].view()).unwrap();
        assert_eq!(out, array![1.0, -2.0]);
    }

    #[test]
    fn test_standard_scaler_without_mean() {
        let scaler: Scaler =
            serde_json::from_str(r#"{"kind": "standard", "scale": [2.0, 4.0]}"#).unwrap();
        let out = scaler.transform(array![3.0, 2.0].view()).unwrap();
        assert_eq!(out, array![1.5, 0.5]);
    }

    #[test]
    fn test_min_max_scaler() {
        let scaler: Scaler =
            serde_json::from_str(r#"{"kind": "min_max", "min": [-1.0], "scale": [0.5]}"#).unwrap();
        let out = scaler.transform(array![4.0].view()).unwrap();
        assert_eq!(out, array![1.0]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = Scaler::MinMax { min: vec![0.0; 3], scale: vec![1.0; 3] };
        assert!(scaler.transform(array![1.0].view()).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_scale_and_length_mismatch() {
        let zero = Scaler::Standard { mean: None, scale: vec![1.0, 0.0] };
        assert!(zero.validate().is_err());

        let uneven = Scaler::MinMax { min: vec![0.0], scale: vec![1.0, 1.0] };
        assert!(uneven.validate().is_err());
    }
}
