use std::path::PathBuf;

/// Errors from forest training, serialization, and inference.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when max_features is zero.
    #[error("max_features must be at least 1, got {max_features}")]
    InvalidMaxFeatures {
        /// The invalid max_features value provided.
        max_features: usize,
    },

    /// Returned when min_gain is negative or not finite.
    #[error("min_gain must be a finite, non-negative number, got {min_gain}")]
    InvalidMinGain {
        /// The invalid min_gain value provided.
        min_gain: f64,
    },

    /// Returned when a training sample carries a NaN or infinite numeric feature.
    #[error("non-finite value for feature {feature} in sample {sample_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// Name of the offending feature.
        feature: &'static str,
    },

    /// Returned when a training target is outside its valid range.
    #[error("invalid target in sample {sample_index}: {reason}")]
    InvalidTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// Human-readable description of the violation.
        reason: String,
    },

    /// Returned when a string is not one of `low`, `medium`, `high`.
    #[error("unknown risk level \"{raw}\" (expected low, medium or high)")]
    UnknownRiskLevel {
        /// The raw string that failed to parse.
        raw: String,
    },

    /// Returned when the model document is not valid JSON or does not match the schema.
    #[error("failed to parse model document")]
    ParseModel {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when the model document parses but violates a structural rule.
    #[error("invalid model document: {reason}")]
    InvalidFormat {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a model file cannot be parsed or validated.
    #[error("failed to load model from {path}")]
    LoadModel {
        /// Path to the model file.
        path: PathBuf,
        /// The parse or validation error.
        source: Box<RfError>,
    },
}
