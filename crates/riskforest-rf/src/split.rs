use rand::Rng;

use crate::dataset::TrainingSet;
use crate::feature::{FeatureIndex, N_FEATURES};
use crate::precision::round_to;
use crate::sample::RiskLevel;

/// Percentiles of the distinct feature values tried as thresholds.
const PERCENTILES: [f64; 3] = [0.25, 0.5, 0.75];

/// Decimal places kept on a split threshold.
const THRESHOLD_DECIMALS: i32 = 2;

/// Impurity of a node from its risk-level counts: `-Σ(p_c²)`.
///
/// This is a Gini-style index (shifted by the constant 1), not Shannon
/// entropy. Terms are summed in class order low, medium, high, skipping
/// absent classes. An empty node has impurity 0.
#[must_use]
pub fn impurity(class_counts: &[usize; RiskLevel::COUNT], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    -class_counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Count risk levels over the given samples.
pub(crate) fn class_counts(data: &TrainingSet, indices: &[usize]) -> [usize; RiskLevel::COUNT] {
    let mut counts = [0usize; RiskLevel::COUNT];
    for &i in indices {
        counts[data.label(i).index()] += 1;
    }
    counts
}

/// Information gain of splitting `indices` on `feature < threshold`.
///
/// Returns `None` when either side of the split would be empty.
pub(crate) fn split_gain(
    data: &TrainingSet,
    indices: &[usize],
    feature: FeatureIndex,
    threshold: f64,
) -> Option<f64> {
    let column = data.column(feature);
    let mut left = [0usize; RiskLevel::COUNT];
    let mut right = [0usize; RiskLevel::COUNT];
    let mut n_left = 0usize;

    for &i in indices {
        let class = data.label(i).index();
        if column[i] < threshold {
            left[class] += 1;
            n_left += 1;
        } else {
            right[class] += 1;
        }
    }

    let n = indices.len();
    let n_right = n - n_left;
    if n_left == 0 || n_right == 0 {
        return None;
    }

    let parent: [usize; RiskLevel::COUNT] = std::array::from_fn(|c| left[c] + right[c]);

    let total = n as f64;
    let weighted_child = (n_left as f64 / total) * impurity(&left, n_left)
        + (n_right as f64 / total) * impurity(&right, n_right);
    Some(impurity(&parent, n) - weighted_child)
}

/// Candidate thresholds for one feature over the given samples.
///
/// Distinct values are sorted ascending and the 25th/50th/75th percentile
/// entries (index `floor(len * p)`, clamped) are rounded to two decimals.
/// A feature with fewer than two distinct values yields no candidates.
pub(crate) fn candidate_thresholds(column: &[f64], indices: &[usize]) -> Vec<f64> {
    let mut values: Vec<f64> = indices.iter().map(|&i| column[i]).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();

    if values.len() < 2 {
        return Vec::new();
    }

    let last = values.len() - 1;
    PERCENTILES
        .iter()
        .map(|&p| {
            let idx = ((values.len() as f64) * p).floor() as usize;
            round_to(values[idx.min(last)], THRESHOLD_DECIMALS)
        })
        .collect()
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value; `value < threshold` goes left.
    pub(crate) threshold: f64,
    /// Information gain of the split.
    pub(crate) gain: f64,
    /// Sample indices going to the left child, in input order.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child, in input order.
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best split among a random subset of features.
///
/// Draws `min(max_features, N_FEATURES)` distinct features, evaluates the
/// percentile thresholds of each in draw order, and keeps the candidate with
/// the highest gain. Ties keep the first candidate evaluated.
///
/// Returns `None` when no candidate produces two non-empty children.
pub(crate) fn find_best_split(
    data: &TrainingSet,
    indices: &[usize],
    max_features: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    if indices.is_empty() {
        return None;
    }

    // Partial Fisher-Yates: shuffle only the first `take` positions.
    let mut feature_order: Vec<usize> = (0..N_FEATURES).collect();
    let take = max_features.min(N_FEATURES);
    for i in 0..take {
        let j = rng.gen_range(i..N_FEATURES);
        feature_order.swap(i, j);
    }

    let mut best: Option<(FeatureIndex, f64, f64)> = None;

    for &feat_idx in &feature_order[..take] {
        let feature = FeatureIndex::new(feat_idx);
        for threshold in candidate_thresholds(data.column(feature), indices) {
            let Some(gain) = split_gain(data, indices, feature, threshold) else {
                continue;
            };
            if best.is_none_or(|(_, _, best_gain)| gain > best_gain) {
                best = Some((feature, threshold, gain));
            }
        }
    }

    let (feature, threshold, gain) = best?;
    let column = data.column(feature);
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| column[i] < threshold);

    Some(SplitResult {
        feature,
        threshold,
        gain,
        left_indices,
        right_indices,
    })
}
