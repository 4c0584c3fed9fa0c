use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    dataset::TrainingSet,
    importance::FeatureGains,
    node::{Leaf, Split, TreeNode},
    precision::round_to,
    sample::{FeatureVector, RiskLevel, Sample},
    split::find_best_split,
};

/// Decimal places kept on a leaf's mean failure probability.
const PROBABILITY_DECIMALS: i32 = 4;

/// Configuration for a single risk decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
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
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: usize,
    pub(crate) min_samples_split: usize,
    pub(crate) min_gain: f64,
    pub(crate) max_features: usize,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    ///
    /// All parameters use the defaults shown in the struct-level documentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 10,
            min_gain: 0.001,
            max_features: 5,
            seed: 42,
        }
    }

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
    ///
    /// Values above the number of numeric features consider all of them.
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

    /// Check the growth parameters.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                              |
    /// |--------------------------------------|-----------------------------------|
    /// | [`RfError::InvalidMaxDepth`]         | `max_depth` is 0                  |
    /// | [`RfError::InvalidMinSamplesSplit`]  | `min_samples_split` < 2           |
    /// | [`RfError::InvalidMaxFeatures`]      | `max_features` is 0               |
    /// | [`RfError::InvalidMinGain`]          | `min_gain` is negative or not finite |
    pub fn validate(&self) -> Result<(), RfError> {
        if self.max_depth == 0 {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(RfError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.max_features == 0 {
            return Err(RfError::InvalidMaxFeatures { max_features: 0 });
        }
        if !self.min_gain.is_finite() || self.min_gain < 0.0 {
            return Err(RfError::InvalidMinGain {
                min_gain: self.min_gain,
            });
        }
        Ok(())
    }

    /// Train a single tree on every sample in `samples`, without bootstrapping.
    ///
    /// # Errors
    ///
    /// Any error from [`DecisionTreeConfig::validate`], plus
    /// [`RfError::NonFiniteValue`] and [`RfError::InvalidTarget`] for bad samples.
    #[instrument(skip(self, samples), fields(n_samples = samples.len()))]
    pub fn fit(&self, samples: &[Sample]) -> Result<DecisionTree, RfError> {
        self.validate()?;
        let data = TrainingSet::from_samples(samples)?;
        let indices: Vec<usize> = (0..data.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let (root, gains) = self.grow(&data, &indices, &mut rng);

        debug!(
            n_leaves = root.n_leaves(),
            depth = root.depth(),
            "decision tree built"
        );

        Ok(DecisionTree { root, gains })
    }

    /// Grow a tree over `indices` of `data`. The config must already be valid.
    ///
    /// Returns the root together with the gain tally of this tree alone.
    pub(crate) fn grow(
        &self,
        data: &TrainingSet,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> (TreeNode, FeatureGains) {
        let mut gains = FeatureGains::new();
        let root = self.build_node(data, indices, 0, rng, &mut gains);
        (root, gains)
    }

    fn build_node(
        &self,
        data: &TrainingSet,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        gains: &mut FeatureGains,
    ) -> TreeNode {
        if depth >= self.max_depth || indices.len() < self.min_samples_split {
            return TreeNode::Leaf(summarize(data, indices));
        }

        let split = match find_best_split(data, indices, self.max_features, rng) {
            Some(s) if s.gain >= self.min_gain => s,
            _ => return TreeNode::Leaf(summarize(data, indices)),
        };

        gains.add(split.feature, split.gain);

        let left = self.build_node(data, &split.left_indices, depth + 1, rng, gains);
        let right = self.build_node(data, &split.right_indices, depth + 1, rng, gains);

        TreeNode::Split(Split {
            feature: split.feature.name().to_string(),
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarize the samples that reached a leaf.
///
/// The majority risk level wins; on equal counts the level seen first in
/// `indices` is kept.
fn summarize(data: &TrainingSet, indices: &[usize]) -> Leaf {
    if indices.is_empty() {
        return Leaf::empty();
    }

    let mut counts = [0usize; RiskLevel::COUNT];
    let mut first_seen: Vec<RiskLevel> = Vec::with_capacity(RiskLevel::COUNT);
    let mut probability_sum = 0.0;
    let mut days_sum = 0.0;

    for &i in indices {
        let level = data.label(i);
        if counts[level.index()] == 0 {
            first_seen.push(level);
        }
        counts[level.index()] += 1;
        probability_sum += data.probability(i);
        days_sum += data.days(i);
    }

    let mut prediction = first_seen[0];
    for &level in &first_seen[1..] {
        if counts[level.index()] > counts[prediction.index()] {
            prediction = level;
        }
    }

    let n = indices.len() as f64;
    Leaf {
        prediction,
        probability: round_to(probability_sum / n, PROBABILITY_DECIMALS),
        days: round_to(days_sum / n, 0),
        sample_count: indices.len(),
    }
}

/// A fitted decision tree with its own gain tally.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: TreeNode,
    gains: FeatureGains,
}

impl DecisionTree {
    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Return the split gains accumulated while growing this tree.
    #[must_use]
    pub fn gains(&self) -> &FeatureGains {
        &self.gains
    }

    /// Return the leaf reached by `features`.
    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> &Leaf {
        self.root.route(features)
    }

    /// Consume the tree, returning its root.
    #[must_use]
    pub fn into_root(self) -> TreeNode {
        self.root
    }
}
