//! The portable JSON model document.
//!
//! ```text
//! { "model_type": "random_forest", "n_trees": 30,
//!   "trees": [ {"type": "split", ...}, ... ],
//!   "feature_importances": { "asset_age_months": 0.31, ... },
//!   "metadata": { "trained_on", "tested_on", "accuracy", "features",
//!                 "categorical_features", "target_classes" } }
//! ```
//!
//! Any document written here parses back and re-serializes to identical
//! bytes. Loading checks the structure before handing out a forest.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::RfError;
use crate::feature::{CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use crate::forest::RandomForest;
use crate::node::TreeNode;
use crate::sample::RiskLevel;

/// Tag identifying the kind of model in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// An ensemble of risk decision trees.
    RandomForest,
}

/// Descriptive fields stored alongside the trees.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForestMetadata {
    /// Number of training samples.
    pub trained_on: usize,
    /// Number of held-out samples evaluated, 0 if none.
    pub tested_on: usize,
    /// Held-out accuracy in percent, rounded to two decimals.
    pub accuracy: Option<f64>,
    /// Numeric feature names the trees may split on.
    pub features: Vec<String>,
    /// Categorical attributes present in the data but never split on.
    pub categorical_features: Vec<String>,
    /// Risk levels the forest can predict.
    pub target_classes: Vec<RiskLevel>,
}

impl ForestMetadata {
    /// Metadata for a freshly trained forest with no held-out evaluation.
    #[must_use]
    pub fn for_training(trained_on: usize) -> Self {
        Self {
            trained_on,
            tested_on: 0,
            accuracy: None,
            features: NUMERIC_FEATURES.iter().map(|s| (*s).to_string()).collect(),
            categorical_features: CATEGORICAL_FEATURES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            target_classes: RiskLevel::ALL.to_vec(),
        }
    }
}

#[derive(serde::Serialize)]
struct DocumentRef<'a> {
    model_type: ModelType,
    n_trees: usize,
    trees: &'a [TreeNode],
    feature_importances: &'a BTreeMap<String, f64>,
    metadata: &'a ForestMetadata,
}

#[derive(serde::Deserialize)]
struct Document {
    #[allow(dead_code)]
    model_type: ModelType,
    n_trees: usize,
    trees: Vec<TreeNode>,
    feature_importances: BTreeMap<String, f64>,
    metadata: ForestMetadata,
}

/// Largest leaf days a prediction can report without truncation.
const MAX_LEAF_DAYS: f64 = u32::MAX as f64;

fn invalid(reason: impl Into<String>) -> RfError {
    RfError::InvalidFormat {
        reason: reason.into(),
    }
}

/// Check every tree against the structural rules of the format.
pub(crate) fn validate_trees(trees: &[TreeNode], metadata: &ForestMetadata) -> Result<(), RfError> {
    if trees.is_empty() {
        return Err(invalid("forest contains no trees"));
    }

    for (tree_index, root) in trees.iter().enumerate() {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node {
                TreeNode::Leaf(leaf) => {
                    if !(0.0..=1.0).contains(&leaf.probability) {
                        return Err(invalid(format!(
                            "tree {tree_index}: leaf probability {} is outside [0, 1]",
                            leaf.probability
                        )));
                    }
                    if !(0.0..=MAX_LEAF_DAYS).contains(&leaf.days) {
                        return Err(invalid(format!(
                            "tree {tree_index}: leaf days {} must be in [0, {MAX_LEAF_DAYS}]",
                            leaf.days
                        )));
                    }
                }
                TreeNode::Split(split) => {
                    if !metadata.features.iter().any(|f| f == &split.feature) {
                        return Err(invalid(format!(
                            "tree {tree_index}: split on unknown feature \"{}\"",
                            split.feature
                        )));
                    }
                    if !split.threshold.is_finite() {
                        return Err(invalid(format!(
                            "tree {tree_index}: non-finite threshold on \"{}\"",
                            split.feature
                        )));
                    }
                    stack.push(&*split.right);
                    stack.push(&*split.left);
                }
            }
        }
    }
    Ok(())
}

fn validate_importances(importances: &BTreeMap<String, f64>) -> Result<(), RfError> {
    match importances
        .iter()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        Some((name, value)) => Err(invalid(format!(
            "importance of \"{name}\" is {value}, expected a finite non-negative number"
        ))),
        None => Ok(()),
    }
}

impl RandomForest {
    /// Render the model document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::SerializeModel`] if encoding fails.
    pub fn to_json_string(&self) -> Result<String, RfError> {
        let doc = DocumentRef {
            model_type: ModelType::RandomForest,
            n_trees: self.trees.len(),
            trees: &self.trees,
            feature_importances: &self.feature_importances,
            metadata: &self.metadata,
        };
        serde_json::to_string_pretty(&doc).map_err(|e| RfError::SerializeModel { source: e })
    }

    /// Parse and validate a model document.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ParseModel`] | not JSON, unknown `model_type` or node tag, missing field |
    /// | [`RfError::InvalidFormat`] | tree count mismatch, unknown split feature, out-of-range value |
    pub fn from_json_str(json: &str) -> Result<Self, RfError> {
        let doc: Document =
            serde_json::from_str(json).map_err(|e| RfError::ParseModel { source: e })?;

        if doc.n_trees != doc.trees.len() {
            return Err(invalid(format!(
                "n_trees is {} but the document holds {} trees",
                doc.n_trees,
                doc.trees.len()
            )));
        }
        validate_importances(&doc.feature_importances)?;

        Self::from_parts(doc.trees, doc.feature_importances, doc.metadata)
    }

    /// Save the model document to a file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::SerializeModel`] | JSON encoding failed |
    /// | [`RfError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RfError> {
        let path = path.as_ref();
        let json = self.to_json_string()?;

        std::fs::write(path, json.as_bytes()).map_err(|e| RfError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = json.len(),
            n_trees = self.trees.len(),
            "model saved"
        );

        Ok(())
    }

    /// Load and validate a model document from a file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ReadModel`] | file read failed |
    /// | [`RfError::LoadModel`] | the contents failed to parse or validate |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RfError> {
        let path = path.as_ref();

        let json = std::fs::read_to_string(path).map_err(|e| RfError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let forest = Self::from_json_str(&json).map_err(|e| RfError::LoadModel {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        debug!(
            n_trees = forest.n_trees(),
            trained_on = forest.metadata.trained_on,
            "model loaded"
        );

        Ok(forest)
    }
}
