//! Column-major view of the training samples used during tree building.

use crate::error::RfError;
use crate::feature::{FeatureIndex, N_FEATURES};
use crate::sample::{RiskLevel, Sample};

/// Training data laid out one column per numeric feature.
///
/// Absent features are materialized as `0.0`, so the builder's view of a
/// sample is exactly what the inference engine will read for it.
#[derive(Debug, Clone)]
pub(crate) struct TrainingSet {
    columns: Vec<Vec<f64>>,
    labels: Vec<RiskLevel>,
    probabilities: Vec<f64>,
    days: Vec<f64>,
}

impl TrainingSet {
    /// Validate and transpose `samples`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::NonFiniteValue`] | a numeric feature is NaN or infinite |
    /// | [`RfError::InvalidTarget`] | failure probability outside `[0, 1]` |
    pub(crate) fn from_samples(samples: &[Sample]) -> Result<Self, RfError> {
        let mut columns = vec![Vec::with_capacity(samples.len()); N_FEATURES];
        let mut labels = Vec::with_capacity(samples.len());
        let mut probabilities = Vec::with_capacity(samples.len());
        let mut days = Vec::with_capacity(samples.len());

        for (sample_index, sample) in samples.iter().enumerate() {
            for feature in FeatureIndex::all() {
                let value = sample.features.value_at(feature);
                if !value.is_finite() {
                    return Err(RfError::NonFiniteValue {
                        sample_index,
                        feature: feature.name(),
                    });
                }
                columns[feature.index()].push(value);
            }

            let p = sample.target.failure_probability;
            if !(0.0..=1.0).contains(&p) {
                return Err(RfError::InvalidTarget {
                    sample_index,
                    reason: format!("failure_probability {p} is outside [0, 1]"),
                });
            }

            labels.push(sample.target.risk_level);
            probabilities.push(p);
            days.push(f64::from(sample.target.estimated_days_to_failure));
        }

        Ok(Self {
            columns,
            labels,
            probabilities,
            days,
        })
    }

    /// Return the number of samples.
    pub(crate) fn len(&self) -> usize {
        self.labels.len()
    }

    /// Return all values of one feature.
    pub(crate) fn column(&self, feature: FeatureIndex) -> &[f64] {
        &self.columns[feature.index()]
    }

    /// Return the risk label of sample `i`.
    pub(crate) fn label(&self, i: usize) -> RiskLevel {
        self.labels[i]
    }

    /// Return the failure probability of sample `i`.
    pub(crate) fn probability(&self, i: usize) -> f64 {
        self.probabilities[i]
    }

    /// Return the days-to-failure of sample `i`.
    pub(crate) fn days(&self, i: usize) -> f64 {
        self.days[i]
    }
}
