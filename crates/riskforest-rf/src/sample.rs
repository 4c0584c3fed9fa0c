//! Labeled training records and inference feature vectors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RfError;
use crate::feature::FeatureIndex;

/// Three-class risk label predicted by the forest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk of failure.
    Low,
    /// Medium risk of failure.
    Medium,
    /// High risk of failure.
    High,
}

impl RiskLevel {
    /// All classes in their fixed priority order.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Number of classes.
    pub const COUNT: usize = 3;

    /// Return the position of this class in [`RiskLevel::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }

    /// Return the lowercase label used in CSV and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = RfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(RfError::UnknownRiskLevel {
                raw: other.to_string(),
            }),
        }
    }
}

/// Mapping from feature name to numeric value.
///
/// Lookups of absent features read as `0.0`. Names outside the numeric
/// schema are kept but never consulted by the forest.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    /// Create an empty feature vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a feature value, returning the vector for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a feature value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Return the value of `name`, or `0.0` when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    /// Return the value of a numeric schema feature, or `0.0` when absent.
    #[must_use]
    pub fn value_at(&self, feature: FeatureIndex) -> f64 {
        self.value(feature.name())
    }

    /// Return the raw value of `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Return the number of stored features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if no feature is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Categorical attributes of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CategoricalAttributes {
    /// Asset type, e.g. `hvac` or `elevator`.
    pub asset_type: String,
    /// Severity of the most recent repair.
    pub last_repair_severity: String,
    /// Documented installation quality.
    pub installation_quality: String,
}

/// Training target of a sample.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Target {
    /// Risk class.
    pub risk_level: RiskLevel,
    /// Failure probability in `[0, 1]`.
    pub failure_probability: f64,
    /// Estimated days until failure.
    pub estimated_days_to_failure: u32,
}

/// One labeled asset-maintenance record.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Numeric features by name.
    pub features: FeatureVector,
    /// Categorical attributes, carried but never split on.
    pub categorical: CategoricalAttributes,
    /// Ground-truth target.
    pub target: Target,
}

impl Sample {
    /// Create a sample with empty categorical attributes.
    #[must_use]
    pub fn new(features: FeatureVector, target: Target) -> Self {
        Self {
            features,
            categorical: CategoricalAttributes::default(),
            target,
        }
    }

    /// Attach categorical attributes.
    #[must_use]
    pub fn with_categorical(mut self, categorical: CategoricalAttributes) -> Self {
        self.categorical = categorical;
        self
    }
}
