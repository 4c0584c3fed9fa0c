//! Domain types for riskforest-io.

use riskforest_rf::FeatureVector;

use crate::IoError;

/// An asset identifier from a prediction input file.
///
/// Rows without an `asset_id` cell are named `row-<n>`, `n` counting data
/// rows from 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new asset ID from a non-empty string.
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "asset ID must not be empty");
        Self(id)
    }

    /// Name the asset on zero-based data row `row_index`.
    pub(crate) fn for_row(row_index: usize) -> Self {
        Self(format!("row-{}", row_index + 1))
    }

    /// Return the asset ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unlabeled feature rows to run inference on.
///
/// Produced by [`FeatureReader`](crate::FeatureReader). `asset_ids[i]`
/// corresponds to `rows[i]`.
#[derive(Debug)]
pub struct FeatureTable {
    asset_ids: Vec<AssetId>,
    rows: Vec<FeatureVector>,
}

impl FeatureTable {
    pub(crate) fn new(asset_ids: Vec<AssetId>, rows: Vec<FeatureVector>) -> Self {
        debug_assert_eq!(asset_ids.len(), rows.len());
        Self { asset_ids, rows }
    }

    /// Return the asset IDs in file order.
    #[must_use]
    pub fn asset_ids(&self) -> &[AssetId] {
        &self.asset_ids
    }

    /// Return the feature rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_experiment_names() {
        for name in ["run1", "pump-audit_2024", "A"] {
            assert!(ExperimentName::new(name.to_string()).is_ok(), "{name}");
        }
    }

    #[test]
    fn invalid_experiment_names() {
        for name in ["", "has space", "../escape", "dot.name"] {
            let err = ExperimentName::new(name.to_string()).unwrap_err();
            assert!(matches!(err, IoError::InvalidExperimentName { .. }), "{name}");
        }
    }

    #[test]
    fn generated_asset_ids_count_from_one() {
        assert_eq!(AssetId::for_row(0).as_str(), "row-1");
        assert_eq!(AssetId::for_row(41).to_string(), "row-42");
    }
}
