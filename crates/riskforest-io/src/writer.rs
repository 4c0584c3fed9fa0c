//! JSON report writer for prediction and evaluation outputs.

use std::fs;
use std::path::{Path, PathBuf};

use riskforest_rf::{Evaluation, Prediction, RankedFeature, RiskLevel, VoteDistribution};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{AssetId, ExperimentName};

/// Writes prediction and evaluation reports to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_predict.json` and
/// `{experiment}_evaluate.json`.
pub struct ReportWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write batch predictions to `{experiment}_predict.json`.
    ///
    /// `asset_ids[i]` labels `predictions[i]`. Returns the path written.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeReport`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all, fields(n_assets = predictions.len()))]
    pub fn write_predictions(
        &self,
        asset_ids: &[AssetId],
        predictions: &[Prediction],
    ) -> Result<PathBuf, IoError> {
        let mut risk_counts = VoteDistribution::default();
        let entries: Vec<PredictionEntry<'_>> = asset_ids
            .iter()
            .zip(predictions)
            .map(|(id, p)| {
                risk_counts.record(p.risk_level);
                PredictionEntry {
                    asset_id: id.as_str(),
                    risk_level: p.risk_level,
                    failure_probability: p.failure_probability,
                    estimated_days_to_failure: p.estimated_days_to_failure,
                    votes: p.votes,
                }
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_assets: entries.len(),
            risk_counts,
            predictions: entries,
        };

        let path = self.write_json("predict", &artifact)?;
        info!(path = %path.display(), "prediction report written");
        Ok(path)
    }

    /// Write evaluation results to `{experiment}_evaluate.json`.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeReport`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file write failed |
    #[instrument(skip_all, fields(n_samples = evaluation.n_samples()))]
    pub fn write_evaluation(
        &self,
        evaluation: &Evaluation,
        importances: &[RankedFeature],
    ) -> Result<PathBuf, IoError> {
        let classes: Vec<ClassEntry> = evaluation
            .class_metrics
            .iter()
            .map(|m| ClassEntry {
                class: m.class,
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
                accuracy: m.accuracy,
            })
            .collect();

        let features: Vec<FeatureEntry<'_>> = importances
            .iter()
            .map(|f| FeatureEntry {
                name: f.name.as_str(),
                importance: f.importance,
                rank: f.rank,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_samples: evaluation.n_samples(),
            accuracy: evaluation.accuracy(),
            confusion_matrix: ConfusionEntry {
                labels: RiskLevel::ALL,
                rows: evaluation.confusion_matrix.as_rows(),
            },
            class_metrics: classes,
            feature_importances: features,
        };

        let path = self.write_json("evaluate", &artifact)?;
        info!(path = %path.display(), "evaluation report written");
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, kind: &str, artifact: &T) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()));

        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::SerializeReport {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Shadow structs for JSON serialization
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PredictionEntry<'a> {
    asset_id: &'a str,
    risk_level: RiskLevel,
    failure_probability: f64,
    estimated_days_to_failure: u32,
    votes: VoteDistribution,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_assets: usize,
    risk_counts: VoteDistribution,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct ConfusionEntry<'a> {
    labels: [RiskLevel; RiskLevel::COUNT],
    rows: &'a [[usize; RiskLevel::COUNT]; RiskLevel::COUNT],
}

#[derive(Serialize)]
struct ClassEntry {
    class: RiskLevel,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
    accuracy: Option<f64>,
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    importance: f64,
    rank: usize,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    accuracy: Option<f64>,
    confusion_matrix: ConfusionEntry<'a>,
    class_metrics: Vec<ClassEntry>,
    feature_importances: Vec<FeatureEntry<'a>>,
}
