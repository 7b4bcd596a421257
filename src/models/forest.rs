/// Decision-forest evaluator for the serialized model artifacts.
///
/// Artifacts are exported from the training pipeline as JSON: a `kind`
/// tag plus a list of trees, each tree a flat node array. Internal nodes
/// route on `feature <= threshold`; a NaN feature follows the node's
/// recorded missing-value direction, so the forests accept the gap rows
/// the hourly head of a merged table legitimately contains.
///
/// ```json
/// {
///   "kind": "classifier",
///   "trees": [
///     { "nodes": [
///       { "feature": 0, "threshold": 1.5, "left": 1, "right": 2 },
///       { "value": [8.0, 2.0] },
///       { "value": [1.0, 9.0] }
///     ] }
///   ]
/// }
/// ```
///
/// Classifier leaves hold per-class weights (normalized per tree, then
/// averaged across trees); regressor leaves hold a single value.

use serde::{Deserialize, Serialize};

use crate::model::{TwinError, TwinResult};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Classifier,
    Regressor,
}

/// One node of a tree: either a leaf (`value` present) or an internal
/// split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: usize,
    #[serde(default)]
    pub right: usize,
    /// Which child a missing (NaN) feature follows.
    #[serde(default = "default_missing_left")]
    pub missing_left: bool,
    /// Leaf payload; absent on internal nodes.
    #[serde(default)]
    pub value: Option<Vec<f64>>,
}

fn default_missing_left() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    pub kind: ModelKind,
    pub trees: Vec<Tree>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

impl Tree {
    /// Walks from the root to a leaf. The step bound makes malformed
    /// trees terminate; `Forest::validate` rejects them at load time.
    fn leaf(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            let Some(node) = self.nodes.get(idx) else {
                break;
            };
            match &node.value {
                Some(v) => return v,
                None => {
                    let x = features.get(node.feature).copied().unwrap_or(f64::NAN);
                    idx = if x.is_nan() {
                        if node.missing_left { node.left } else { node.right }
                    } else if x <= node.threshold {
                        node.left
                    } else {
                        node.right
                    };
                }
            }
        }
        &[]
    }
}

impl Forest {
    /// Point prediction: the mean leaf value for a regressor, the
    /// highest-probability class (0 or 1) for a classifier. Ties resolve
    /// to class 0.
    pub fn predict(&self, features: &[f64]) -> f64 {
        match self.kind {
            ModelKind::Regressor => {
                let mut sum = 0.0;
                let mut n = 0u32;
                for tree in &self.trees {
                    if let Some(&v) = tree.leaf(features).first() {
                        sum += v;
                        n += 1;
                    }
                }
                if n > 0 { sum / f64::from(n) } else { f64::NAN }
            }
            ModelKind::Classifier => {
                let [p0, p1] = self.predict_proba(features);
                if p1 > p0 { 1.0 } else { 0.0 }
            }
        }
    }

    /// Class probabilities `[p0, p1]`: each tree's leaf weights are
    /// normalized, then averaged across trees. Only meaningful for
    /// classifiers.
    pub fn predict_proba(&self, features: &[f64]) -> [f64; 2] {
        let mut acc = [0.0_f64; 2];
        let mut n = 0u32;
        for tree in &self.trees {
            let leaf = tree.leaf(features);
            let total: f64 = leaf.iter().sum();
            if leaf.len() < 2 || total <= 0.0 {
                continue;
            }
            acc[0] += leaf[0] / total;
            acc[1] += leaf[1] / total;
            n += 1;
        }
        if n > 0 {
            [acc[0] / f64::from(n), acc[1] / f64::from(n)]
        } else {
            [f64::NAN, f64::NAN]
        }
    }

    /// Structural checks run once at load time so evaluation can stay
    /// infallible: non-empty, child indices in range, leaves carrying the
    /// payload their kind requires.
    pub fn validate(&self) -> TwinResult<()> {
        if self.trees.is_empty() {
            return Err(TwinError::Parse("forest has no trees".to_string()));
        }
        for (ti, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(TwinError::Parse(format!("tree {} has no nodes", ti)));
            }
            for (ni, node) in tree.nodes.iter().enumerate() {
                match &node.value {
                    Some(v) => {
                        let needed = match self.kind {
                            ModelKind::Classifier => 2,
                            ModelKind::Regressor => 1,
                        };
                        if v.len() < needed {
                            return Err(TwinError::Parse(format!(
                                "tree {} node {}: leaf value too short",
                                ti, ni
                            )));
                        }
                    }
                    None => {
                        if node.left >= tree.nodes.len() || node.right >= tree.nodes.len() {
                            return Err(TwinError::Parse(format!(
                                "tree {} node {}: child index out of range",
                                ti, ni
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

impl Forest {
    /// A forest whose single leaf always yields `value` — handy for
    /// regression-style stubs in tests and calibration tooling.
    pub fn constant_regressor(value: f64) -> Forest {
        Forest {
            kind: ModelKind::Regressor,
            trees: vec![Tree {
                nodes: vec![Node {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                    missing_left: true,
                    value: Some(vec![value]),
                }],
            }],
        }
    }

    /// A classifier whose positive-class probability is always
    /// `positive`; the verdict follows from whether it exceeds 0.5.
    pub fn constant_classifier(positive: f64) -> Forest {
        let (p0, p1) = (1.0 - positive, positive);
        Forest {
            kind: ModelKind::Classifier,
            trees: vec![Tree {
                nodes: vec![Node {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 0,
                    missing_left: true,
                    value: Some(vec![p0, p1]),
                }],
            }],
        }
    }
}
