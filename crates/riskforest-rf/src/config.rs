//! Configuration builder for risk forest training.

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::sample::Sample;
use crate::tree::DecisionTreeConfig;

/// Configuration for risk forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
/// Growth parameters are checked when [`RandomForestConfig::fit`] runs.
///
/// # Defaults
///
/// | Parameter           | Default |
/// |---------------------|---------|
/// | `max_depth`         | 5       |
/// | `min_samples_split` | 10      |
/// | `min_gain`          | 0.001   |
/// | `max_features`      | 5       |
/// | `seed`              | 42      |
///
/// The conventional tree count is [`RandomForestConfig::DEFAULT_N_TREES`].
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_depth: usize,
    pub(crate) min_samples_split: usize,
    pub(crate) min_gain: f64,
    pub(crate) max_features: usize,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Tree count used by the command-line trainer when none is given.
    pub const DEFAULT_N_TREES: usize = 30;

    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        let tree = DecisionTreeConfig::new();
        Ok(Self {
            n_trees,
            max_depth: tree.max_depth(),
            min_samples_split: tree.min_samples_split(),
            min_gain: tree.min_gain(),
            max_features: tree.max_features(),
            seed: tree.seed(),
        })
    }

    // --- Setters ---

    /// Set the maximum tree depth. The root is depth 0.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum information gain a split must reach.
    #[must_use]
    pub fn with_min_gain(mut self, min_gain: f64) -> Self {
        self.min_gain = min_gain;
        self
    }

    /// Set the number of features sampled at each split.
    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum gain required to split a node.
    #[must_use]
    pub fn min_gain(&self) -> f64 {
        self.min_gain
    }

    /// Return the number of features sampled per split.
    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Tree parameters shared by every tree, seeded with `seed`.
    pub(crate) fn tree_config(&self, seed: u64) -> DecisionTreeConfig {
        DecisionTreeConfig::new()
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_gain(self.min_gain)
            .with_max_features(self.max_features)
            .with_seed(seed)
    }

    /// Train a risk forest on `samples`.
    ///
    /// Degenerate data (a single class, or no samples at all) is not an
    /// error: the trees simply collapse to leaves.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                 |
    /// |--------------------------------------|--------------------------------------|
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is 0                     |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2              |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` is 0                  |
    /// | [`RfError::InvalidMinGain`]          | `min_gain` is negative or not finite |
    /// | [`RfError::NonFiniteValue`]          | a numeric feature is NaN or infinite |
    /// | [`RfError::InvalidTarget`]           | a failure probability is outside [0, 1] |
    pub fn fit(&self, samples: &[Sample]) -> Result<RandomForest, RfError> {
        crate::forest::train(self, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = RandomForestConfig::new(30).unwrap();
        assert_eq!(config.n_trees(), 30);
        assert_eq!(config.max_depth(), 5);
        assert_eq!(config.min_samples_split(), 10);
        assert!((config.min_gain() - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.max_features(), 5);
        assert_eq!(config.seed(), 42);
    }

    #[test]
    fn zero_trees_rejected() {
        let err = RandomForestConfig::new(0).unwrap_err();
        assert!(matches!(err, RfError::InvalidTreeCount { n_trees: 0 }));
    }

    #[test]
    fn builder_chain() {
        let config = RandomForestConfig::new(7)
            .unwrap()
            .with_max_depth(3)
            .with_min_samples_split(4)
            .with_min_gain(0.01)
            .with_max_features(2)
            .with_seed(9);
        let tree = config.tree_config(123);
        assert_eq!(tree.max_depth(), 3);
        assert_eq!(tree.min_samples_split(), 4);
        assert!((tree.min_gain() - 0.01).abs() < f64::EPSILON);
        assert_eq!(tree.max_features(), 2);
        assert_eq!(tree.seed(), 123);
        assert_eq!(config.seed(), 9);
    }

    #[test]
    fn invalid_growth_parameters_fail_at_fit() {
        let config = RandomForestConfig::new(3).unwrap().with_max_depth(0);
        assert!(matches!(
            config.fit(&[]),
            Err(RfError::InvalidMaxDepth { max_depth: 0 })
        ));
        let config = RandomForestConfig::new(3).unwrap().with_min_gain(-1.0);
        assert!(matches!(config.fit(&[]), Err(RfError::InvalidMinGain { .. })));
    }
}
