//! Feature importance tallies and their normalized, ranked views.

use std::collections::BTreeMap;

use crate::feature::{FeatureIndex, N_FEATURES};

/// Accumulated split gain per numeric feature.
///
/// Built locally by each tree and merged into the forest total by an
/// ordered reduction once all trees are grown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureGains {
    totals: [f64; N_FEATURES],
    used: [bool; N_FEATURES],
}

impl FeatureGains {
    /// Create an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the gain of one split on `feature`.
    pub fn add(&mut self, feature: FeatureIndex, gain: f64) {
        self.totals[feature.index()] += gain;
        self.used[feature.index()] = true;
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: &FeatureGains) {
        for i in 0..N_FEATURES {
            self.totals[i] += other.totals[i];
            self.used[i] |= other.used[i];
        }
    }

    /// Return the accumulated gain of `feature`, or `None` if it was never split on.
    #[must_use]
    pub fn get(&self, feature: FeatureIndex) -> Option<f64> {
        self.used[feature.index()].then(|| self.totals[feature.index()])
    }

    /// Return `true` if no split has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.used.iter().any(|&u| u)
    }

    /// Normalize the tally so the values of every used feature sum to 1.0.
    ///
    /// Only features that were split on at least once appear in the map. If
    /// the total gain is zero the values are left unnormalized.
    #[must_use]
    pub fn normalized(&self) -> BTreeMap<String, f64> {
        let total: f64 = FeatureIndex::all().filter_map(|f| self.get(f)).sum();
        FeatureIndex::all()
            .filter_map(|f| {
                self.get(f).map(|gain| {
                    let value = if total > 0.0 { gain / total } else { gain };
                    (f.name().to_string(), value)
                })
            })
            .collect()
    }
}

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance score.
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Sort importances descending and assign 1-based ranks.
///
/// Equal scores keep name order.
#[must_use]
pub fn rank_importances(importances: &BTreeMap<String, f64>) -> Vec<RankedFeature> {
    let mut features: Vec<RankedFeature> = importances
        .iter()
        .map(|(name, &importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();

    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    for (i, feat) in features.iter_mut().enumerate() {
        feat.rank = i + 1;
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fi(name: &str) -> FeatureIndex {
        FeatureIndex::from_name(name).unwrap()
    }

    #[test]
    fn normalized_sums_to_one() {
        let mut gains = FeatureGains::new();
        gains.add(fi("asset_age_months"), 0.3);
        gains.add(fi("manufacturer_rating"), 0.1);
        gains.add(fi("asset_age_months"), 0.2);
        let norm = gains.normalized();
        assert_eq!(norm.len(), 2);
        let sum: f64 = norm.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((norm["asset_age_months"] - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn empty_tally_normalizes_to_empty_map() {
        let gains = FeatureGains::new();
        assert!(gains.is_empty());
        assert!(gains.normalized().is_empty());
    }

    #[test]
    fn zero_total_left_unnormalized() {
        let mut gains = FeatureGains::new();
        gains.add(fi("humidity_level_avg"), 0.0);
        let norm = gains.normalized();
        assert_eq!(norm.get("humidity_level_avg"), Some(&0.0));
    }

    #[test]
    fn merge_adds_and_unions() {
        let mut a = FeatureGains::new();
        a.add(fi("asset_age_months"), 0.5);
        let mut b = FeatureGains::new();
        b.add(fi("asset_age_months"), 0.25);
        b.add(fi("building_age_years"), 0.25);
        a.merge(&b);
        assert_eq!(a.get(fi("asset_age_months")), Some(0.75));
        assert_eq!(a.get(fi("building_age_years")), Some(0.25));
        assert_eq!(a.get(fi("seasonal_load_factor")), None);
    }

    #[test]
    fn ranking_descending_with_ranks() {
        let map: BTreeMap<String, f64> = [
            ("a".to_string(), 0.2),
            ("b".to_string(), 0.5),
            ("c".to_string(), 0.3),
        ]
        .into_iter()
        .collect();
        let ranked = rank_importances(&map);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }
}
