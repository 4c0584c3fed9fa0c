//! File I/O, validation, and report serialization for the riskforest pipeline.

mod domain;
mod error;
mod feature_reader;
mod reader;
mod writer;

pub use domain::{AssetId, ExperimentName, FeatureTable};
pub use error::IoError;
pub use feature_reader::FeatureReader;
pub use reader::SampleReader;
pub use writer::ReportWriter;
