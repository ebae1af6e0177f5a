//! The epoch/validation/checkpoint training loop.

use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::{Backend, Int, Tensor};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ml_dataset::{DatasetSplits, ImageRecord, SplitSet};
use ml_models::{
    CatDogCnn, CheckpointFormat, DefaultAutodiffBackend, DefaultBackend, checkpoint_path,
    default_backend, default_device, load_checkpoint, save_checkpoint,
};
use ml_preprocess::TransformConfig;
use ml_types::ClassList;

use crate::config::TrainingConfig;
use crate::error::{Result, TrainingError};
use crate::metrics::{ConfusionMatrix, EpochMetrics, TrainingMetrics};
use crate::tracking::RunTracker;

type TrainBackend = DefaultAutodiffBackend;
type EvalBackend = DefaultBackend;
type Device = <DefaultBackend as Backend>::Device;

/// Bookkeeping across epochs.
///
/// Tracks the best validation accuracy seen so far; the trainer persists
/// a checkpoint whenever it improves.
///
/// # Example
///
/// ```
/// use ml_training::TrainingState;
///
/// let mut state = TrainingState::new(10);
/// assert!(state.record_val_accuracy(0.6)); // first value is a best
/// assert!(!state.record_val_accuracy(0.5));
/// assert_eq!(state.best_val_accuracy, Some(0.6));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    /// Current epoch (0-indexed).
    pub epoch: usize,

    /// Total epochs to run.
    pub total_epochs: usize,

    /// Best validation accuracy seen.
    pub best_val_accuracy: Option<f32>,

    /// Epoch that produced the best validation accuracy.
    pub best_epoch: Option<usize>,

    /// Epochs since the last improvement (drives early stopping).
    pub epochs_without_improvement: usize,
}

impl TrainingState {
    /// Creates state for a run of `total_epochs`.
    #[must_use]
    pub const fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            best_val_accuracy: None,
            best_epoch: None,
            epochs_without_improvement: 0,
        }
    }

    /// Records a validation accuracy; returns `true` on a new best.
    pub fn record_val_accuracy(&mut self, accuracy: f32) -> bool {
        let improved = self
            .best_val_accuracy
            .is_none_or(|best| accuracy > best);

        if improved {
            self.best_val_accuracy = Some(accuracy);
            self.best_epoch = Some(self.epoch);
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }
        improved
    }

    /// Returns `true` once `patience` epochs passed without improvement.
    #[must_use]
    pub const fn should_early_stop(&self, patience: usize) -> bool {
        patience > 0 && self.epochs_without_improvement >= patience
    }

    /// Advances to the next epoch.
    pub const fn next_epoch(&mut self) {
        self.epoch += 1;
    }
}

/// Held-out test evaluation of the best checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Mean test loss.
    pub loss: f32,

    /// Test accuracy.
    pub accuracy: f32,

    /// Confusion matrix over the test split.
    pub confusion: ConfusionMatrix,
}

/// What a finished training run produced.
#[derive(Debug)]
pub struct TrainOutcome {
    /// Per-epoch and run-level metrics.
    pub metrics: TrainingMetrics,

    /// Path of the best-validation checkpoint.
    pub best_checkpoint: PathBuf,

    /// Path of the final persisted weights.
    pub final_checkpoint: PathBuf,

    /// Test evaluation of the reloaded best checkpoint.
    pub test: TestReport,
}

struct EvalReport {
    loss: f32,
    accuracy: f32,
    truth: Vec<usize>,
    predicted: Vec<usize>,
}

/// Runs training runs for a fixed configuration.
///
/// # Example
///
/// ```
/// use ml_training::{Trainer, TrainingConfig};
///
/// let trainer = Trainer::new(TrainingConfig::new(5));
/// assert_eq!(trainer.config().epochs, 5);
/// assert_eq!(trainer.num_batches(100), 4); // with the default batch size 32
/// ```
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    /// Creates a trainer with the given config.
    #[must_use]
    pub const fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// The training configuration.
    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Creates the initial training state.
    #[must_use]
    pub const fn initial_state(&self) -> TrainingState {
        TrainingState::new(self.config.epochs)
    }

    /// Number of batches covering `dataset_size` records.
    #[must_use]
    pub const fn num_batches(&self, dataset_size: usize) -> usize {
        if self.config.batch_size == 0 {
            0
        } else {
            dataset_size.div_ceil(self.config.batch_size)
        }
    }

    /// `(start, end)` record range of a batch.
    #[must_use]
    pub fn batch_indices(&self, batch: usize, dataset_size: usize) -> (usize, usize) {
        let start = batch * self.config.batch_size;
        let end = ((batch + 1) * self.config.batch_size).min(dataset_size);
        (start, end)
    }

    /// Trains a model on the given splits.
    ///
    /// Per epoch: a train pass (forward, cross-entropy loss, backward,
    /// Adam step) followed by a validation pass on the non-autodiff model.
    /// Whenever validation accuracy improves, the current weights are
    /// written to `best_model.bin` under `model_dir`. After the last
    /// epoch, the best checkpoint is reloaded and evaluated once on the
    /// test split; the confusion matrix and loss curves become run
    /// artifacts, and the final weights plus `classes.txt` land in
    /// `model_dir` for the inference service.
    ///
    /// # Errors
    ///
    /// Any failure inside a batch (unreadable image, tensor extraction,
    /// checkpoint IO) aborts the run. Empty splits, a class count that
    /// disagrees with the model config, and invalid configurations are
    /// rejected up front.
    #[allow(clippy::too_many_lines)]
    pub fn fit(
        &self,
        splits: &DatasetSplits,
        classes: &ClassList,
        model_dir: &Path,
        tracker: &mut RunTracker,
    ) -> Result<TrainOutcome> {
        if !self.config.is_valid() {
            return Err(TrainingError::invalid_config(
                "epochs, batch_size, and learning_rate must be positive",
            ));
        }
        if self.config.model.num_classes != classes.len() {
            return Err(TrainingError::invalid_config(format!(
                "model expects {} classes but the dataset has {}",
                self.config.model.num_classes,
                classes.len()
            )));
        }
        for (name, set) in [
            ("train", &splits.train),
            ("val", &splits.val),
            ("test", &splits.test),
        ] {
            if set.is_empty() {
                return Err(TrainingError::dataset(format!("{name} split is empty")));
            }
        }

        std::fs::create_dir_all(model_dir)?;
        tracker.log_params(&self.config)?;

        let device = default_device();
        info!(
            backend = %default_backend(),
            epochs = self.config.epochs,
            train = splits.train.len(),
            val = splits.val.len(),
            test = splits.test.len(),
            "starting training run"
        );

        let mut model: CatDogCnn<TrainBackend> = self.config.model.init(&device);
        let mut optim = AdamConfig::new().init();
        let mut state = self.initial_state();
        let mut metrics = TrainingMetrics::new();

        let best_path = checkpoint_path(model_dir, "best_model", CheckpointFormat::Binary);

        for epoch in 0..self.config.epochs {
            let started = Instant::now();
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(epoch as u64));

            // Train pass.
            let mut order: Vec<usize> = (0..splits.train.len()).collect();
            order.shuffle(&mut rng);

            let loss_fn = CrossEntropyLossConfig::new().init(&device);
            let mut loss_sum = 0.0f64;
            let mut correct = 0usize;

            for batch in 0..self.num_batches(splits.train.len()) {
                let (start, end) = self.batch_indices(batch, splits.train.len());
                let records: Vec<&ImageRecord> = order[start..end]
                    .iter()
                    .map(|&i| &splits.train.records[i])
                    .collect();

                let (images, targets, labels) = load_batch::<TrainBackend>(
                    &records,
                    &splits.train.transform,
                    Some(&mut rng),
                    &device,
                )?;

                let logits = model.forward(images);
                let loss = loss_fn.forward(logits.clone(), targets);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(self.config.learning_rate, model, grads);

                loss_sum += f64::from(loss.into_scalar());
                let predicted = batch_predictions(logits)?;
                correct += predicted
                    .iter()
                    .zip(labels.iter())
                    .filter(|(p, l)| p == l)
                    .count();
            }

            let train_batches = self.num_batches(splits.train.len());
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            let train_loss = (loss_sum / train_batches as f64) as f32;
            #[allow(clippy::cast_precision_loss)]
            let train_accuracy = correct as f32 / splits.train.len() as f32;

            // Validation pass, forward only on the inner backend.
            let eval_model = model.valid();
            let val = self.evaluate(&eval_model, &splits.val, &device)?;

            let epoch_metrics = EpochMetrics::new(
                epoch,
                train_loss,
                train_accuracy,
                val.loss,
                val.accuracy,
            );
            metrics.add_epoch(epoch_metrics);
            tracker.log_epoch(epoch_metrics)?;

            info!(
                epoch = epoch + 1,
                total = self.config.epochs,
                train_loss,
                train_accuracy,
                val_loss = val.loss,
                val_accuracy = val.accuracy,
                elapsed_secs = started.elapsed().as_secs_f32(),
                "epoch complete"
            );

            if state.record_val_accuracy(val.accuracy) {
                save_checkpoint(&eval_model, &best_path)?;
                info!(
                    epoch = epoch + 1,
                    val_accuracy = val.accuracy,
                    checkpoint = %best_path.display(),
                    "new best validation accuracy"
                );
            }
            state.next_epoch();

            if state.should_early_stop(self.config.patience) {
                warn!(
                    epoch = epoch + 1,
                    patience = self.config.patience,
                    "early stopping: no validation improvement"
                );
                break;
            }
        }

        // Reload the best checkpoint and evaluate once on the held-out split.
        let best_model: CatDogCnn<EvalBackend> = self.config.model.init(&device);
        let best_model = load_checkpoint(best_model, &best_path, &device)?;

        let test = self.evaluate(&best_model, &splits.test, &device)?;
        metrics.set_test(test.loss, test.accuracy);
        tracker.log_metric("test_loss", test.loss)?;
        tracker.log_metric("test_accuracy", test.accuracy)?;
        info!(test_loss = test.loss, test_accuracy = test.accuracy, "test evaluation");

        let confusion = ConfusionMatrix::from_pairs(classes, &test.truth, &test.predicted);
        tracker.log_artifact_str("confusion_matrix.csv", &confusion.to_csv())?;
        tracker.log_artifact_str("loss_curves.csv", &metrics.loss_curves_csv())?;

        // Persist the deliverables the inference service consumes.
        let final_path = checkpoint_path(model_dir, "model", CheckpointFormat::Binary);
        save_checkpoint(&best_model, &final_path)?;
        classes.save(&model_dir.join("classes.txt"))?;
        tracker.log_artifact_file("model.bin", &final_path)?;

        info!(
            model = %final_path.display(),
            best_val_accuracy = state.best_val_accuracy,
            "training run finished"
        );

        Ok(TrainOutcome {
            metrics,
            best_checkpoint: best_path,
            final_checkpoint: final_path,
            test: TestReport {
                loss: test.loss,
                accuracy: test.accuracy,
                confusion,
            },
        })
    }

    /// Forward-only evaluation over a split.
    fn evaluate(
        &self,
        model: &CatDogCnn<EvalBackend>,
        set: &SplitSet,
        device: &Device,
    ) -> Result<EvalReport> {
        let loss_fn = CrossEntropyLossConfig::new().init(device);
        let mut loss_sum = 0.0f64;
        let mut truth = Vec::with_capacity(set.len());
        let mut predicted = Vec::with_capacity(set.len());

        for batch in 0..self.num_batches(set.len()) {
            let (start, end) = self.batch_indices(batch, set.len());
            let records: Vec<&ImageRecord> = set.records[start..end].iter().collect();

            let (images, targets, labels) =
                load_batch::<EvalBackend>(&records, &set.transform, None, device)?;

            let logits = model.forward(images);
            let loss = loss_fn.forward(logits.clone(), targets);
            loss_sum += f64::from(loss.into_scalar());

            truth.extend_from_slice(&labels);
            predicted.extend(batch_predictions(logits)?);
        }

        let batches = self.num_batches(set.len());
        let correct = truth
            .iter()
            .zip(predicted.iter())
            .filter(|(t, p)| t == p)
            .count();

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let loss = (loss_sum / batches as f64) as f32;
        #[allow(clippy::cast_precision_loss)]
        let accuracy = correct as f32 / set.len() as f32;

        Ok(EvalReport {
            loss,
            accuracy,
            truth,
            predicted,
        })
    }
}

/// Loads a batch of records into device tensors.
///
/// Returns the image tensor `[batch, 3, side, side]`, the integer targets,
/// and the plain label indices for accuracy bookkeeping. With an rng the
/// transform runs augmented; without one it is deterministic.
fn load_batch<B: Backend>(
    records: &[&ImageRecord],
    transform: &TransformConfig,
    mut rng: Option<&mut ChaCha8Rng>,
    device: &B::Device,
) -> Result<(Tensor<B, 4>, Tensor<B, 1, Int>, Vec<usize>)> {
    let side = transform.side() as usize;
    let mut pixels = Vec::with_capacity(records.len() * 3 * side * side);
    let mut labels = Vec::with_capacity(records.len());

    for record in records {
        let img = ml_preprocess::load_image(&record.path)?;
        let tensor = match rng.as_deref_mut() {
            Some(rng) => transform.apply_augmented(&img, rng),
            None => transform.apply(&img),
        };
        pixels.extend_from_slice(tensor.data());
        labels.push(record.label);
    }

    #[allow(clippy::cast_possible_wrap)]
    let targets_raw: Vec<i64> = labels.iter().map(|&l| l as i64).collect();

    let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), device).reshape([
        records.len(),
        3,
        side,
        side,
    ]);
    let targets = Tensor::<B, 1, Int>::from_ints(targets_raw.as_slice(), device);

    Ok((images, targets, labels))
}

/// Per-row argmax over a logits tensor.
fn batch_predictions<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<usize>> {
    let [_, num_classes] = logits.dims();
    let values: Vec<f32> = logits
        .into_data()
        .to_vec()
        .map_err(|e| TrainingError::tensor(format!("{e:?}")))?;

    Ok(values
        .chunks(num_classes)
        .map(|row| ml_types::argmax(row).unwrap_or(0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_first_accuracy_is_best() {
        let mut state = TrainingState::new(5);
        assert!(state.record_val_accuracy(0.4));
        assert_eq!(state.best_val_accuracy, Some(0.4));
        assert_eq!(state.best_epoch, Some(0));
    }

    #[test]
    fn state_tracks_improvement() {
        let mut state = TrainingState::new(5);
        state.record_val_accuracy(0.5);
        state.next_epoch();

        assert!(!state.record_val_accuracy(0.5)); // equal is not better
        assert_eq!(state.epochs_without_improvement, 1);
        state.next_epoch();

        assert!(state.record_val_accuracy(0.8));
        assert_eq!(state.best_epoch, Some(2));
        assert_eq!(state.epochs_without_improvement, 0);
    }

    #[test]
    fn state_early_stop() {
        let mut state = TrainingState::new(10);
        state.epochs_without_improvement = 3;

        assert!(!state.should_early_stop(0)); // disabled
        assert!(!state.should_early_stop(4));
        assert!(state.should_early_stop(3));
        assert!(state.should_early_stop(2));
    }

    #[test]
    fn trainer_num_batches() {
        let trainer = Trainer::new(TrainingConfig::new(1).with_batch_size(32));
        assert_eq!(trainer.num_batches(100), 4);
        assert_eq!(trainer.num_batches(32), 1);
        assert_eq!(trainer.num_batches(33), 2);
        assert_eq!(trainer.num_batches(0), 0);
    }

    #[test]
    fn trainer_batch_indices() {
        let trainer = Trainer::new(TrainingConfig::new(1).with_batch_size(32));
        assert_eq!(trainer.batch_indices(0, 100), (0, 32));
        assert_eq!(trainer.batch_indices(2, 100), (64, 96));
        assert_eq!(trainer.batch_indices(3, 100), (96, 100)); // partial tail
    }

    #[test]
    fn trainer_initial_state() {
        let trainer = Trainer::new(TrainingConfig::new(7));
        let state = trainer.initial_state();
        assert_eq!(state.total_epochs, 7);
        assert_eq!(state.epoch, 0);
        assert!(state.best_val_accuracy.is_none());
    }

    #[test]
    fn state_serialization() {
        let state = TrainingState::new(3);
        let json = serde_json::to_string(&state).unwrap();
        let parsed: TrainingState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
