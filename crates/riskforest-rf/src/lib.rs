//! Asset failure-risk forest: train, serialize, predict, evaluate.
//!
//! Trains a bootstrap-sampled ensemble of shallow decision trees on asset
//! maintenance records, writes it as a self-contained JSON document, and
//! predicts from that document with results identical to the trained model.

mod config;
mod confusion;
mod dataset;
mod error;
mod eval;
mod feature;
mod forest;
mod format;
mod importance;
mod node;
mod precision;
mod predict;
mod sample;
mod split;
mod tree;

pub use config::RandomForestConfig;
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::RfError;
pub use eval::Evaluation;
pub use feature::{CATEGORICAL_FEATURES, FeatureIndex, N_FEATURES, NUMERIC_FEATURES};
pub use forest::RandomForest;
pub use format::{ForestMetadata, ModelType};
pub use importance::{FeatureGains, RankedFeature, rank_importances};
pub use node::{Leaf, Split, TreeNode};
pub use predict::{Prediction, VoteDistribution};
pub use sample::{CategoricalAttributes, FeatureVector, RiskLevel, Sample, Target};
pub use split::impurity;
pub use tree::{DecisionTree, DecisionTreeConfig};
