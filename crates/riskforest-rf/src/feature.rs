//! The fixed feature schema of an asset-maintenance record.

use std::fmt;

/// Numeric features considered by the split evaluator, in canonical order.
pub const NUMERIC_FEATURES: [&str; 10] = [
    "asset_age_months",
    "days_since_last_maintenance",
    "total_maintenance_count",
    "avg_monthly_usage_hours",
    "ambient_temperature_avg",
    "humidity_level_avg",
    "power_outage_events_last_year",
    "manufacturer_rating",
    "building_age_years",
    "seasonal_load_factor",
];

/// Categorical attributes carried on a sample but never split on.
pub const CATEGORICAL_FEATURES: [&str; 3] =
    ["asset_type", "last_repair_severity", "installation_quality"];

/// Number of numeric features.
pub const N_FEATURES: usize = NUMERIC_FEATURES.len();

/// Position of a feature within [`NUMERIC_FEATURES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a feature index from a position known to be in range.
    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index < N_FEATURES, "feature index out of range");
        Self(index)
    }

    /// Look up a numeric feature by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        NUMERIC_FEATURES.iter().position(|&n| n == name).map(Self)
    }

    /// Iterate over every numeric feature in canonical order.
    pub fn all() -> impl Iterator<Item = FeatureIndex> {
        (0..N_FEATURES).map(Self)
    }

    /// Return the zero-based position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    /// Return the feature name.
    #[must_use]
    pub fn name(self) -> &'static str {
        NUMERIC_FEATURES[self.0]
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
