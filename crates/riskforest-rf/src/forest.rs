//! Risk forest training with parallel tree construction.

use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::dataset::TrainingSet;
use crate::error::RfError;
use crate::format::{self, ForestMetadata};
use crate::importance::{FeatureGains, RankedFeature, rank_importances};
use crate::node::TreeNode;
use crate::precision::round_to;
use crate::sample::Sample;

/// A fitted risk forest.
///
/// Holds the ordered trees, the normalized split-gain importances and the
/// metadata recorded in the model document. Immutable once built: recording
/// held-out results yields a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    pub(crate) trees: Vec<TreeNode>,
    pub(crate) feature_importances: BTreeMap<String, f64>,
    pub(crate) metadata: ForestMetadata,
}

impl RandomForest {
    /// Assemble a forest from already-built parts, checking them the same
    /// way a loaded model document is checked.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidFormat`] if the trees are empty, a split
    /// names a feature missing from `metadata.features`, or a threshold or
    /// leaf value is out of range.
    pub fn from_parts(
        trees: Vec<TreeNode>,
        feature_importances: BTreeMap<String, f64>,
        metadata: ForestMetadata,
    ) -> Result<Self, RfError> {
        format::validate_trees(&trees, &metadata)?;
        Ok(Self {
            trees,
            feature_importances,
            metadata,
        })
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the trees in ensemble order.
    #[must_use]
    pub fn trees(&self) -> &[TreeNode] {
        &self.trees
    }

    /// Return the normalized feature importances, keyed by feature name.
    #[must_use]
    pub fn feature_importances(&self) -> &BTreeMap<String, f64> {
        &self.feature_importances
    }

    /// Return the importances sorted descending with 1-based ranks.
    #[must_use]
    pub fn ranked_importances(&self) -> Vec<RankedFeature> {
        rank_importances(&self.feature_importances)
    }

    /// Return the document metadata.
    #[must_use]
    pub fn metadata(&self) -> &ForestMetadata {
        &self.metadata
    }

    /// Record a held-out evaluation in the metadata.
    ///
    /// `accuracy` is a fraction in `[0, 1]`; it is stored as a percentage
    /// rounded to two decimals. `None` means nothing could be scored.
    #[must_use]
    pub fn with_test_report(mut self, tested_on: usize, accuracy: Option<f64>) -> Self {
        self.metadata.tested_on = tested_on;
        self.metadata.accuracy = accuracy.map(|a| round_to(a * 100.0, 2));
        self
    }
}

/// Draw `n_samples` indices uniformly with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the risk forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = samples.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    samples: &[Sample],
) -> Result<RandomForest, RfError> {
    // --- Validate config and data ---
    if config.n_trees == 0 {
        return Err(RfError::InvalidTreeCount { n_trees: 0 });
    }
    config.tree_config(config.seed).validate()?;
    let data = TrainingSet::from_samples(samples)?;
    let n_samples = data.len();

    info!(
        n_trees = config.n_trees,
        n_samples,
        max_depth = config.max_depth,
        max_features = config.max_features,
        "training risk forest"
    );

    // Generate per-tree seeds from master RNG.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    // Parallel tree training; collect keeps tree order.
    let grown: Vec<(TreeNode, FeatureGains)> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bootstrap = bootstrap_sample(n_samples, &mut rng);
            let tree_config = config.tree_config(rng.r#gen());
            let mut builder_rng = ChaCha8Rng::seed_from_u64(tree_config.seed());
            tree_config.grow(&data, &bootstrap, &mut builder_rng)
        })
        .collect();

    let mut trees = Vec::with_capacity(config.n_trees);
    let mut gains = FeatureGains::new();
    for (tree, tree_gains) in grown {
        debug!(
            n_leaves = tree.n_leaves(),
            depth = tree.depth(),
            "tree grown"
        );
        gains.merge(&tree_gains);
        trees.push(tree);
    }

    let feature_importances = gains.normalized();

    info!(
        n_trees = trees.len(),
        n_features_used = feature_importances.len(),
        "training complete"
    );

    Ok(RandomForest {
        trees,
        feature_importances,
        metadata: ForestMetadata::for_training(n_samples),
    })
}
