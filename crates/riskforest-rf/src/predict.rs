//! Inference over a fitted or loaded forest.
//!
//! Only the document types are needed here, so a forest read from JSON
//! predicts exactly like the one that was trained.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::forest::RandomForest;
use crate::precision::round_to;
use crate::sample::{FeatureVector, RiskLevel};

/// Decimal places kept on the aggregated failure probability.
const PROBABILITY_DECIMALS: i32 = 4;

/// Leaf votes per risk level across all trees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoteDistribution {
    /// Trees voting `low`.
    pub low: usize,
    /// Trees voting `medium`.
    pub medium: usize,
    /// Trees voting `high`.
    pub high: usize,
}

impl VoteDistribution {
    /// Add one vote for `level`.
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }

    /// Return the votes for `level`.
    #[must_use]
    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }

    /// Return the total number of votes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    /// Return the level with the most votes.
    ///
    /// Equal counts resolve in the fixed order low, medium, high.
    #[must_use]
    pub fn winner(&self) -> RiskLevel {
        let mut best = RiskLevel::Low;
        for level in [RiskLevel::Medium, RiskLevel::High] {
            if self.get(level) > self.get(best) {
                best = level;
            }
        }
        best
    }
}

/// Aggregated forest output for one feature vector.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prediction {
    /// Majority-vote risk level.
    pub risk_level: RiskLevel,
    /// Mean leaf failure probability, rounded to four decimals.
    pub failure_probability: f64,
    /// Mean leaf days to failure, rounded to an integer.
    pub estimated_days_to_failure: u32,
    /// How the trees voted.
    pub votes: VoteDistribution,
}

impl RandomForest {
    /// Predict the risk for one feature vector.
    ///
    /// Features absent from `features` read as 0.
    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        let mut votes = VoteDistribution::default();
        let mut probability_sum = 0.0;
        let mut days_sum = 0.0;

        for tree in &self.trees {
            let leaf = tree.route(features);
            votes.record(leaf.prediction);
            probability_sum += leaf.probability;
            days_sum += leaf.days;
        }

        // A forest always holds at least one tree.
        let n = self.trees.len() as f64;
        Prediction {
            risk_level: votes.winner(),
            failure_probability: round_to(probability_sum / n, PROBABILITY_DECIMALS),
            estimated_days_to_failure: round_to(days_sum / n, 0) as u32,
            votes,
        }
    }

    /// Predict many feature vectors in parallel. Output order matches input.
    #[must_use]
    pub fn predict_batch(&self, rows: &[FeatureVector]) -> Vec<Prediction> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }
}
