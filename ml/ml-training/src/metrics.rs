//! Per-epoch metrics and evaluation artifacts.

use serde::{Deserialize, Serialize};

use ml_types::ClassList;

/// Metrics for a single training epoch.
///
/// Accuracies are fractions in `[0, 1]`.
///
/// # Example
///
/// ```
/// use ml_training::EpochMetrics;
///
/// let metrics = EpochMetrics::new(0, 0.69, 0.55, 0.62, 0.61);
/// assert_eq!(metrics.epoch, 0);
/// assert!((metrics.val_accuracy - 0.61).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (0-indexed).
    pub epoch: usize,

    /// Mean training loss over the epoch's batches.
    pub train_loss: f32,

    /// Training accuracy.
    pub train_accuracy: f32,

    /// Mean validation loss.
    pub val_loss: f32,

    /// Validation accuracy.
    pub val_accuracy: f32,
}

impl EpochMetrics {
    /// Creates epoch metrics.
    #[must_use]
    pub const fn new(
        epoch: usize,
        train_loss: f32,
        train_accuracy: f32,
        val_loss: f32,
        val_accuracy: f32,
    ) -> Self {
        Self {
            epoch,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
        }
    }
}

/// Aggregate metrics for a training run.
///
/// # Example
///
/// ```
/// use ml_training::{EpochMetrics, TrainingMetrics};
///
/// let mut metrics = TrainingMetrics::new();
/// metrics.add_epoch(EpochMetrics::new(0, 0.7, 0.5, 0.68, 0.52));
/// metrics.add_epoch(EpochMetrics::new(1, 0.5, 0.7, 0.55, 0.66));
///
/// assert_eq!(metrics.epochs_completed(), 2);
/// assert_eq!(metrics.best_epoch, Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Metrics for each completed epoch.
    pub epoch_metrics: Vec<EpochMetrics>,

    /// Best validation accuracy seen.
    pub best_val_accuracy: Option<f32>,

    /// Epoch with the best validation accuracy.
    pub best_epoch: Option<usize>,

    /// Loss of the final test evaluation, once it ran.
    pub test_loss: Option<f32>,

    /// Accuracy of the final test evaluation, once it ran.
    pub test_accuracy: Option<f32>,
}

impl TrainingMetrics {
    /// Creates empty run metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed epoch, updating the best-epoch bookkeeping.
    pub fn add_epoch(&mut self, metrics: EpochMetrics) {
        let improved = self
            .best_val_accuracy
            .is_none_or(|best| metrics.val_accuracy > best);
        if improved {
            self.best_val_accuracy = Some(metrics.val_accuracy);
            self.best_epoch = Some(metrics.epoch);
        }
        self.epoch_metrics.push(metrics);
    }

    /// Records the held-out test evaluation.
    pub fn set_test(&mut self, loss: f32, accuracy: f32) {
        self.test_loss = Some(loss);
        self.test_accuracy = Some(accuracy);
    }

    /// Number of completed epochs.
    #[must_use]
    pub fn epochs_completed(&self) -> usize {
        self.epoch_metrics.len()
    }

    /// Renders the loss curves as CSV (`epoch,train_loss,val_loss`).
    #[must_use]
    pub fn loss_curves_csv(&self) -> String {
        let mut out = String::from("epoch,train_loss,val_loss\n");
        for m in &self.epoch_metrics {
            out.push_str(&format!("{},{:.6},{:.6}\n", m.epoch, m.train_loss, m.val_loss));
        }
        out
    }
}

/// A confusion matrix over the test split.
///
/// Rows are true classes, columns are predicted classes, both in class
/// index order.
///
/// # Example
///
/// ```
/// use ml_training::ConfusionMatrix;
/// use ml_types::ClassList;
///
/// let classes = ClassList::cats_dogs();
/// let matrix = ConfusionMatrix::from_pairs(&classes, &[0, 0, 1, 1], &[0, 1, 1, 1]);
///
/// assert_eq!(matrix.count(0, 0), 1);
/// assert_eq!(matrix.count(0, 1), 1);
/// assert!((matrix.accuracy() - 0.75).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Class names in index order.
    pub classes: Vec<String>,

    /// `counts[true][predicted]`.
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tallies `(true, predicted)` label pairs.
    ///
    /// Pairs whose labels fall outside the class list are ignored; the
    /// trainer never produces them.
    #[must_use]
    pub fn from_pairs(classes: &ClassList, truth: &[usize], predicted: &[usize]) -> Self {
        let n = classes.len();
        let mut counts = vec![vec![0usize; n]; n];
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            if t < n && p < n {
                counts[t][p] += 1;
            }
        }
        Self {
            classes: classes.iter().map(ToString::to_string).collect(),
            counts,
        }
    }

    /// Count of samples with true class `truth` predicted as `predicted`.
    #[must_use]
    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        self.counts
            .get(truth)
            .and_then(|row| row.get(predicted))
            .copied()
            .unwrap_or(0)
    }

    /// Total number of tallied samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.counts.len()).map(|i| self.counts[i][i]).sum();
        correct as f32 / total as f32
    }

    /// Renders the matrix as CSV with a `true\predicted` header row.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::from("true\\predicted");
        for name in &self.classes {
            out.push(',');
            out.push_str(name);
        }
        out.push('\n');
        for (name, row) in self.classes.iter().zip(&self.counts) {
            out.push_str(name);
            for count in row {
                out.push_str(&format!(",{count}"));
            }
            out.push('\n');
        }
        out
    }
}
