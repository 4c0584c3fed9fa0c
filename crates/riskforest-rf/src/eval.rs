//! Scoring a forest against labeled samples.

use tracing::{info, instrument};

use crate::confusion::{ClassMetrics, ConfusionMatrix};
use crate::forest::RandomForest;
use crate::sample::{FeatureVector, Sample};

/// Outcome of evaluating a forest on labeled samples.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Actual vs. predicted counts.
    pub confusion_matrix: ConfusionMatrix,
    /// Per-class metrics in the order low, medium, high.
    pub class_metrics: Vec<ClassMetrics>,
}

impl Evaluation {
    /// Return the number of samples evaluated.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.confusion_matrix.total()
    }

    /// Overall accuracy, or `None` for an empty sample set.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        self.confusion_matrix.accuracy()
    }
}

impl RandomForest {
    /// Predict every sample and compare with its label.
    ///
    /// An empty `samples` slice yields an empty matrix with undefined accuracy.
    #[instrument(skip_all, fields(n_samples = samples.len()))]
    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let rows: Vec<FeatureVector> = samples.iter().map(|s| s.features.clone()).collect();
        let predictions = self.predict_batch(&rows);

        let confusion_matrix = ConfusionMatrix::from_pairs(
            samples
                .iter()
                .zip(&predictions)
                .map(|(s, p)| (s.target.risk_level, p.risk_level)),
        );
        let class_metrics = confusion_matrix.class_metrics();

        info!(
            n_samples = confusion_matrix.total(),
            correct = confusion_matrix.correct(),
            "evaluation complete"
        );

        Evaluation {
            confusion_matrix,
            class_metrics,
        }
    }
}
