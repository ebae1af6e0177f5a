//! File-based experiment tracking.
//!
//! Each training run gets its own directory under
//! `<root>/<experiment>/run-NNNN/`:
//!
//! ```text
//! runs/cats-dogs-classification/run-0003/
//!   params.json     - run parameters, written once at the start
//!   metrics.json    - per-epoch series plus summary scalars
//!   artifacts/      - confusion matrix, loss curves, model copies
//! ```
//!
//! `metrics.json` is rewritten after every completed epoch, so a run that
//! aborts mid-epoch keeps everything logged up to its last completed
//! epoch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TrainingError};
use crate::metrics::EpochMetrics;

/// Contents of a run's `metrics.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct MetricsFile {
    /// Per-epoch metric series.
    pub epochs: Vec<EpochMetrics>,

    /// Named summary scalars (for example `test_accuracy`).
    pub summary: BTreeMap<String, f32>,
}

/// Tracks one training run on the local filesystem.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ml_training::RunTracker;
///
/// let mut tracker = RunTracker::create(Path::new("runs"), "cats-dogs-classification")?;
/// tracker.log_artifact_str("note.txt", "hello")?;
/// # Ok::<(), ml_training::TrainingError>(())
/// ```
#[derive(Debug)]
pub struct RunTracker {
    dir: PathBuf,
    metrics: MetricsFile,
}

impl RunTracker {
    /// Creates the next `run-NNNN` directory under the experiment.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directories cannot be created or the
    /// existing runs cannot be listed.
    pub fn create(root: &Path, experiment: &str) -> Result<Self> {
        let experiment_dir = root.join(experiment);
        std::fs::create_dir_all(&experiment_dir)?;

        let next = next_run_index(&experiment_dir)?;
        let dir = experiment_dir.join(format!("run-{next:04}"));
        std::fs::create_dir(&dir)?;
        std::fs::create_dir(dir.join("artifacts"))?;

        info!(run = %dir.display(), "created experiment run");
        Ok(Self {
            dir,
            metrics: MetricsFile::default(),
        })
    }

    /// The run directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the run parameters to `params.json`.
    ///
    /// # Errors
    ///
    /// Returns a tracking error if serialization or the write fails.
    pub fn log_params<P: Serialize>(&self, params: &P) -> Result<()> {
        let json = serde_json::to_string_pretty(params)?;
        std::fs::write(self.dir.join("params.json"), json)?;
        Ok(())
    }

    /// Records a completed epoch and flushes `metrics.json`.
    ///
    /// # Errors
    ///
    /// Returns a tracking error if the flush fails.
    pub fn log_epoch(&mut self, metrics: EpochMetrics) -> Result<()> {
        self.metrics.epochs.push(metrics);
        self.flush()
    }

    /// Records a summary scalar and flushes `metrics.json`.
    ///
    /// # Errors
    ///
    /// Returns a tracking error if the flush fails.
    pub fn log_metric(&mut self, name: impl Into<String>, value: f32) -> Result<()> {
        self.metrics.summary.insert(name.into(), value);
        self.flush()
    }

    /// Stores string contents as an artifact file.
    ///
    /// # Errors
    ///
    /// Returns a tracking error if the write fails.
    pub fn log_artifact_str(&self, name: &str, contents: &str) -> Result<()> {
        std::fs::write(self.artifact_path(name), contents)?;
        Ok(())
    }

    /// Copies an existing file into the artifacts directory.
    ///
    /// # Errors
    ///
    /// Returns a tracking error if the copy fails.
    pub fn log_artifact_file(&self, name: &str, source: &Path) -> Result<()> {
        std::fs::copy(source, self.artifact_path(name)).map_err(|e| {
            TrainingError::tracking(format!("copying artifact {}: {e}", source.display()))
        })?;
        Ok(())
    }

    /// Path of a named artifact inside this run.
    #[must_use]
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join("artifacts").join(name)
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(self.dir.join("metrics.json"), json)?;
        Ok(())
    }
}

/// Finds the next free run index by scanning existing `run-NNNN` names.
fn next_run_index(experiment_dir: &Path) -> Result<u32> {
    let mut max_seen = 0u32;
    for entry in std::fs::read_dir(experiment_dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if let Some(index) = name.strip_prefix("run-").and_then(|n| n.parse::<u32>().ok()) {
                max_seen = max_seen.max(index);
            }
        }
    }
    Ok(max_seen + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_sequential_run_indices() {
        let root = tempfile::tempdir().unwrap();

        let first = RunTracker::create(root.path(), "exp").unwrap();
        let second = RunTracker::create(root.path(), "exp").unwrap();

        assert!(first.dir().ends_with("exp/run-0001"));
        assert!(second.dir().ends_with("exp/run-0002"));
        assert!(first.dir().join("artifacts").is_dir());
    }

    #[test]
    fn log_params_writes_json() {
        let root = tempfile::tempdir().unwrap();
        let tracker = RunTracker::create(root.path(), "exp").unwrap();

        #[derive(Serialize)]
        struct Params {
            epochs: usize,
        }
        tracker.log_params(&Params { epochs: 3 }).unwrap();

        let text = std::fs::read_to_string(tracker.dir().join("params.json")).unwrap();
        assert!(text.contains("\"epochs\": 3"));
    }

    #[test]
    fn log_epoch_flushes_after_each_epoch() {
        let root = tempfile::tempdir().unwrap();
        let mut tracker = RunTracker::create(root.path(), "exp").unwrap();

        tracker
            .log_epoch(EpochMetrics::new(0, 0.7, 0.5, 0.6, 0.55))
            .unwrap();

        let text = std::fs::read_to_string(tracker.dir().join("metrics.json")).unwrap();
        let parsed: MetricsFile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.epochs.len(), 1);

        tracker
            .log_epoch(EpochMetrics::new(1, 0.6, 0.6, 0.55, 0.6))
            .unwrap();
        let text = std::fs::read_to_string(tracker.dir().join("metrics.json")).unwrap();
        let parsed: MetricsFile = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.epochs.len(), 2);
    }

    #[test]
    fn log_metric_records_summary_scalars() {
        let root = tempfile::tempdir().unwrap();
        let mut tracker = RunTracker::create(root.path(), "exp").unwrap();

        tracker.log_metric("test_accuracy", 0.91).unwrap();

        let text = std::fs::read_to_string(tracker.dir().join("metrics.json")).unwrap();
        let parsed: MetricsFile = serde_json::from_str(&text).unwrap();
        assert!((parsed.summary["test_accuracy"] - 0.91).abs() < 1e-6);
    }

    #[test]
    fn artifacts_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let tracker = RunTracker::create(root.path(), "exp").unwrap();

        tracker
            .log_artifact_str("loss_curves.csv", "epoch,train_loss,val_loss\n")
            .unwrap();
        assert!(tracker.artifact_path("loss_curves.csv").is_file());

        let source = root.path().join("model.bin");
        std::fs::write(&source, b"weights").unwrap();
        tracker.log_artifact_file("model.bin", &source).unwrap();
        assert_eq!(
            std::fs::read(tracker.artifact_path("model.bin")).unwrap(),
            b"weights"
        );
    }

    #[test]
    fn log_artifact_file_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let tracker = RunTracker::create(root.path(), "exp").unwrap();

        let err = tracker
            .log_artifact_file("model.bin", Path::new("/nonexistent"))
            .unwrap_err();
        assert!(matches!(err, TrainingError::Tracking(_)));
    }
}
