//! Isolation Forest - pre-fitted anomaly scorer
//!
//! The forest is fitted elsewhere and exported as flat tree arrays: one
//! entry per node, `-1` in `children_left`/`children_right` marks a leaf.
//! Scoring reproduces the usual Isolation Forest conventions:
//!
//! - a node goes left when `f32(x[feature]) <= threshold`
//! - the root has depth 1, a leaf contributes `depth + c(n_node_samples) - 1`
//! - `score_samples = -2^(-mean_path / c(max_samples))`
//! - `decision_function = score_samples - offset`, anomaly when `< 0`

use serde::{Deserialize, Serialize};

use super::InferenceError;

/// Marker for "no child" in the tree arrays
pub const TREE_LEAF: i64 = -1;

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Native binary output of the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Normal,
    Anomaly,
}

impl Verdict {
    /// Label in the `{1, -1}` convention of the fitted model
    pub fn label(self) -> i8 {
        match self {
            Verdict::Normal => 1,
            Verdict::Anomaly => -1,
        }
    }

    pub fn is_anomaly(self) -> bool {
        self == Verdict::Anomaly
    }
}

/// One fitted isolation tree, exactly as exported
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArrays {
    /// Column subset the tree was grown on (all columns when absent)
    #[serde(default)]
    pub features: Option<Vec<usize>>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub n_node_samples: Vec<u64>,
}

/// Serialized forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    pub offset: f64,
    pub max_samples: u64,
    pub n_features: usize,
    pub estimators: Vec<TreeArrays>,
}

fn default_algorithm() -> String {
    "IsolationForest".to_string()
}

/// Tree with per-node path contributions resolved at load
#[derive(Debug, Clone)]
struct IsolationTree {
    columns: Option<Vec<usize>>,
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<usize>,
    threshold: Vec<f64>,
    /// `depth(node) + c(n_node_samples(node)) - 1`, only read at leaves
    leaf_path: Vec<f64>,
}

impl IsolationTree {
    fn from_arrays(index: usize, arrays: TreeArrays, n_features: usize) -> Result<Self, String> {
        let n_nodes = arrays.children_left.len();
        if n_nodes == 0 {
            return Err(format!("tree {} has no nodes", index));
        }
        if arrays.children_right.len() != n_nodes
            || arrays.feature.len() != n_nodes
            || arrays.threshold.len() != n_nodes
            || arrays.n_node_samples.len() != n_nodes
        {
            return Err(format!("tree {} has node arrays of different lengths", index));
        }

        let width = match &arrays.features {
            Some(cols) => {
                if let Some(bad) = cols.iter().find(|&&c| c >= n_features) {
                    return Err(format!(
                        "tree {} uses column {} but the forest has {} features",
                        index, bad, n_features
                    ));
                }
                cols.len()
            }
            None => n_features,
        };

        let mut feature = vec![0usize; n_nodes];
        let mut depth = vec![0u32; n_nodes];
        let mut seen = vec![false; n_nodes];
        let mut stack = vec![(0usize, 1u32)];

        while let Some((node, node_depth)) = stack.pop() {
            if seen[node] {
                return Err(format!("tree {} revisits node {}", index, node));
            }
            seen[node] = true;
            depth[node] = node_depth;

            let left = arrays.children_left[node];
            let right = arrays.children_right[node];
            if left == TREE_LEAF && right == TREE_LEAF {
                continue;
            }

            let child = |c: i64| -> Result<usize, String> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c < n_nodes)
                    .ok_or_else(|| format!("tree {} node {} has invalid child {}", index, node, c))
            };
            let (left, right) = (child(left)?, child(right)?);

            feature[node] = usize::try_from(arrays.feature[node])
                .ok()
                .filter(|&f| f < width)
                .ok_or_else(|| {
                    format!(
                        "tree {} node {} splits on feature {} outside 0..{}",
                        index, node, arrays.feature[node], width
                    )
                })?;

            stack.push((right, node_depth + 1));
            stack.push((left, node_depth + 1));
        }

        let leaf_path = depth
            .iter()
            .zip(&arrays.n_node_samples)
            .map(|(&d, &n)| d as f64 + average_path_length(n) - 1.0)
            .collect();

        Ok(Self {
            columns: arrays.features,
            children_left: arrays.children_left,
            children_right: arrays.children_right,
            feature,
            threshold: arrays.threshold,
            leaf_path,
        })
    }

    fn path_length(&self, sample: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != TREE_LEAF {
            let column = match &self.columns {
                Some(cols) => cols[self.feature[node]],
                None => self.feature[node],
            };
            // Trees are grown on single precision inputs
            let value = sample[column] as f32 as f64;
            let next = if value <= self.threshold[node] {
                self.children_left[node]
            } else {
                self.children_right[node]
            };
            node = next as usize;
        }
        self.leaf_path[node]
    }
}

/// Average path length of an unsuccessful BST search over `n` points
pub fn average_path_length(n: u64) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Fitted Isolation Forest, immutable after load
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    offset: f64,
    max_samples: u64,
    n_features: usize,
    algorithm: String,
}

impl IsolationForest {
    /// Validate the exported arrays and resolve per-node path lengths
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, String> {
        if artifact.estimators.is_empty() {
            return Err("forest has no estimators".to_string());
        }
        if artifact.n_features == 0 {
            return Err("forest declares zero features".to_string());
        }
        if !artifact.offset.is_finite() {
            return Err("forest offset is not finite".to_string());
        }

        let n_features = artifact.n_features;
        let trees = artifact
            .estimators
            .into_iter()
            .enumerate()
            .map(|(i, arrays)| IsolationTree::from_arrays(i, arrays, n_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            offset: artifact.offset,
            max_samples: artifact.max_samples,
            n_features,
            algorithm: artifact.algorithm,
        })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Opposite of the anomaly score: the lower, the more abnormal
    pub fn score_samples(&self, sample: &[f64]) -> Result<f64, InferenceError> {
        if sample.len() != self.n_features {
            return Err(InferenceError::WidthMismatch {
                stage: "model",
                expected: self.n_features,
                actual: sample.len(),
            });
        }

        let depths: f64 = self
            .trees
            .iter()
            .fold(0.0, |acc, tree| acc + tree.path_length(sample));

        let denominator = self.trees.len() as f64 * average_path_length(self.max_samples);
        let ratio = if denominator != 0.0 { depths / denominator } else { 1.0 };

        Ok(-(2.0_f64.powf(-ratio)))
    }

    /// Shifted score: negative for outliers, positive for inliers
    pub fn decision_function(&self, sample: &[f64]) -> Result<f64, InferenceError> {
        Ok(self.score_samples(sample)? - self.offset)
    }

    pub fn predict(&self, sample: &[f64]) -> Result<Verdict, InferenceError> {
        Ok(Self::verdict_for(self.decision_function(sample)?))
    }

    /// Label a decision value without rescoring
    pub fn verdict_for(decision: f64) -> Verdict {
        if decision < 0.0 {
            Verdict::Anomaly
        } else {
            Verdict::Normal
        }
    }
}
