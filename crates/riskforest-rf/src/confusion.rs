//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::sample::RiskLevel;

/// A 3×3 confusion matrix over risk levels.
///
/// Entry `[actual][predicted]` counts samples with true level `actual` that
/// were predicted as `predicted`. Rows and columns follow low, medium, high.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: [[usize; RiskLevel::COUNT]; RiskLevel::COUNT],
}

/// Per-class precision, recall, F1 score and accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// The risk level these metrics describe.
    pub class: RiskLevel,
    /// Precision: TP / (TP + FP). 0.0 if the level was never predicted.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this level.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples with this level.
    pub support: usize,
    /// Share of this level's samples predicted correctly, `None` if it has none.
    pub accuracy: Option<f64>,
}

impl ConfusionMatrix {
    /// Create an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from paired actual and predicted levels.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (RiskLevel, RiskLevel)>) -> Self {
        let mut cm = Self::new();
        for (actual, predicted) in pairs {
            cm.record(actual, predicted);
        }
        cm
    }

    /// Count one prediction.
    pub fn record(&mut self, actual: RiskLevel, predicted: RiskLevel) {
        self.matrix[actual.index()][predicted.index()] += 1;
    }

    /// Return the count for one cell.
    #[must_use]
    pub fn count(&self, actual: RiskLevel, predicted: RiskLevel) -> usize {
        self.matrix[actual.index()][predicted.index()]
    }

    /// Return the total number of recorded predictions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Return the number of correct predictions.
    #[must_use]
    pub fn correct(&self) -> usize {
        (0..RiskLevel::COUNT).map(|i| self.matrix[i][i]).sum()
    }

    /// Overall accuracy, or `None` if nothing was recorded.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.correct() as f64 / total as f64)
    }

    /// Per-class metrics in the order low, medium, high.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        RiskLevel::ALL
            .iter()
            .map(|&class| {
                let c = class.index();
                let tp = self.matrix[c][c];
                let predicted: usize = (0..RiskLevel::COUNT).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted == 0 {
                    0.0
                } else {
                    tp as f64 / predicted as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                    accuracy: (support > 0).then_some(recall),
                }
            })
            .collect()
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[[usize; RiskLevel::COUNT]; RiskLevel::COUNT] {
        &self.matrix
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>14}", "actual \\ pred")?;
        for level in RiskLevel::ALL {
            write!(f, " {:>7}", level.as_str())?;
        }
        writeln!(f)?;

        for (level, row) in RiskLevel::ALL.iter().zip(self.matrix.iter()) {
            write!(f, "{:>14}", level.as_str())?;
            for val in row {
                write!(f, " {val:>7}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::RiskLevel::{High, Low, Medium};

    #[test]
    fn perfect_predictions() {
        let cm = ConfusionMatrix::from_pairs([(Low, Low), (Medium, Medium), (High, High)]);
        assert_eq!(cm.accuracy(), Some(1.0));
        for m in cm.class_metrics() {
            assert!((m.precision - 1.0).abs() < f64::EPSILON);
            assert!((m.recall - 1.0).abs() < f64::EPSILON);
            assert!((m.f1 - 1.0).abs() < f64::EPSILON);
            assert_eq!(m.accuracy, Some(1.0));
        }
    }

    #[test]
    fn known_confusion_matrix() {
        let cm = ConfusionMatrix::from_pairs([
            (Low, Low),
            (Low, Low),
            (Low, Medium),
            (Medium, Medium),
            (Medium, Medium),
            (Medium, High),
            (High, High),
            (High, High),
            (High, Low),
        ]);
        let metrics = cm.class_metrics();

        // Low: TP=2, FP=1 (from high), FN=1 (to medium)
        assert!((metrics[0].precision - 2.0 / 3.0).abs() < 1e-10);
        assert!((metrics[0].recall - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(metrics[0].support, 3);
        assert_eq!(cm.count(High, Low), 1);
        assert!((cm.accuracy().unwrap() - 6.0 / 9.0).abs() < 1e-10);
    }

    #[test]
    fn empty_matrix_has_no_accuracy() {
        let cm = ConfusionMatrix::new();
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.accuracy(), None);
        for m in cm.class_metrics() {
            assert_eq!(m.precision, 0.0);
            assert_eq!(m.recall, 0.0);
            assert_eq!(m.f1, 0.0);
            assert_eq!(m.accuracy, None);
        }
    }

    #[test]
    fn absent_class_accuracy_undefined() {
        let cm = ConfusionMatrix::from_pairs([(Low, Low), (Medium, Low)]);
        let high = &cm.class_metrics()[High.index()];
        assert_eq!(high.support, 0);
        assert_eq!(high.accuracy, None);
        assert_eq!(high.f1, 0.0);
    }

    #[test]
    fn display_formatting() {
        let cm = ConfusionMatrix::from_pairs([(Low, High)]);
        let output = format!("{cm}");
        assert!(output.contains("actual"));
        assert!(output.contains("medium"));
        assert_eq!(output.lines().count(), 4);
    }
}
