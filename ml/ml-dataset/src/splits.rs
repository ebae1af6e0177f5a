//! Reproducible train/validation/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use ml_preprocess::TransformConfig;

use crate::error::{DatasetError, Result};
use crate::record::ImageRecord;

/// Fractions for splitting a dataset into train/validation/test sets.
///
/// The test fraction is the remainder, so the three always cover the
/// whole dataset.
///
/// # Example
///
/// ```
/// use ml_dataset::SplitFractions;
///
/// let fractions = SplitFractions::default();
/// assert!((fractions.train() - 0.8).abs() < 1e-6);
/// assert!((fractions.test() - 0.1).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitFractions {
    train: f32,
    val: f32,
}

impl SplitFractions {
    /// The conventional 80/10/10 split.
    pub const EIGHTY_TEN_TEN: Self = Self {
        train: 0.8,
        val: 0.1,
    };

    /// Creates split fractions.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidFractions`] unless both fractions
    /// are positive and their sum is below 1 (the remainder is the test
    /// fraction).
    pub fn new(train: f32, val: f32) -> Result<Self> {
        if train <= 0.0 || val <= 0.0 || train + val >= 1.0 {
            return Err(DatasetError::invalid_fractions(train, val));
        }
        Ok(Self { train, val })
    }

    /// Training fraction.
    #[must_use]
    pub const fn train(&self) -> f32 {
        self.train
    }

    /// Validation fraction.
    #[must_use]
    pub const fn val(&self) -> f32 {
        self.val
    }

    /// Test fraction (the remainder).
    #[must_use]
    pub fn test(&self) -> f32 {
        1.0 - self.train - self.val
    }

    /// Computes partition sizes for `total` records.
    ///
    /// Train and validation sizes round down; the test partition takes
    /// the remainder, so the three always sum to `total`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn counts(&self, total: usize) -> (usize, usize, usize) {
        let n_train = (total as f32 * self.train) as usize;
        let n_val = (total as f32 * self.val) as usize;
        let n_test = total - n_train - n_val;
        (n_train, n_val, n_test)
    }
}

impl Default for SplitFractions {
    fn default() -> Self {
        Self::EIGHTY_TEN_TEN
    }
}

/// Splits records into train/validation/test partitions.
///
/// The records are shuffled with a `ChaCha8Rng` seeded by `seed`, then
/// cut at the sizes computed by [`SplitFractions::counts`]. The same seed
/// over the same records always yields identical partitions; the
/// partitions are disjoint and their sizes sum to the input size.
///
/// # Example
///
/// ```
/// use ml_dataset::{ImageRecord, SplitFractions, split_records};
///
/// let records: Vec<ImageRecord> = (0..100)
///     .map(|i| ImageRecord::new(format!("{i}.jpg"), 0))
///     .collect();
///
/// let (train, val, test) = split_records(&records, SplitFractions::default(), 42);
/// assert_eq!((train.len(), val.len(), test.len()), (80, 10, 10));
/// ```
#[must_use]
pub fn split_records(
    records: &[ImageRecord],
    fractions: SplitFractions,
    seed: u64,
) -> (Vec<ImageRecord>, Vec<ImageRecord>, Vec<ImageRecord>) {
    if records.is_empty() {
        return (Vec::new(), Vec::new(), Vec::new());
    }

    let mut indices: Vec<usize> = (0..records.len()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (n_train, n_val, _) = fractions.counts(records.len());

    let take = |range: &[usize]| -> Vec<ImageRecord> {
        range.iter().map(|&i| records[i].clone()).collect()
    };

    let train = take(&indices[..n_train]);
    let val = take(&indices[n_train..n_train + n_val]);
    let test = take(&indices[n_train + n_val..]);

    (train, val, test)
}

/// One partition of the dataset together with its transform.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSet {
    /// The records in this partition.
    pub records: Vec<ImageRecord>,

    /// The transform this partition is loaded with.
    pub transform: TransformConfig,
}

impl SplitSet {
    /// Number of records in this partition.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the partition holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The three dataset partitions, each paired with its transform.
///
/// Construction starts every partition from the training transform, then
/// overrides the validation and test transforms with the deterministic
/// variant derived from it — augmentation is stripped, resize and
/// normalization stay as configured.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplits {
    /// Training partition (augmented transform).
    pub train: SplitSet,

    /// Validation partition (deterministic transform).
    pub val: SplitSet,

    /// Held-out test partition (deterministic transform).
    pub test: SplitSet,
}

impl DatasetSplits {
    /// Splits `records` and assigns per-partition transforms.
    #[must_use]
    pub fn new(
        records: &[ImageRecord],
        fractions: SplitFractions,
        seed: u64,
        train_transform: TransformConfig,
    ) -> Self {
        let (train, val, test) = split_records(records, fractions, seed);
        let eval_transform = train_transform.deterministic();

        Self {
            train: SplitSet {
                records: train,
                transform: train_transform,
            },
            val: SplitSet {
                records: val,
                transform: eval_transform.clone(),
            },
            test: SplitSet {
                records: test,
                transform: eval_transform,
            },
        }
    }

    /// Total number of records across the three partitions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn records(n: usize) -> Vec<ImageRecord> {
        (0..n)
            .map(|i| ImageRecord::new(format!("img_{i:04}.jpg"), i % 2))
            .collect()
    }

    #[test]
    fn fractions_default() {
        let fractions = SplitFractions::default();
        assert!((fractions.train() - 0.8).abs() < 1e-6);
        assert!((fractions.val() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn fractions_rejects_invalid() {
        assert!(SplitFractions::new(0.0, 0.1).is_err());
        assert!(SplitFractions::new(0.8, 0.0).is_err());
        assert!(SplitFractions::new(0.9, 0.1).is_err());
        assert!(SplitFractions::new(0.5, 0.6).is_err());
        assert!(SplitFractions::new(0.7, 0.2).is_ok());
    }

    #[test]
    fn fractions_counts_sum_to_total() {
        let fractions = SplitFractions::default();
        for total in [0, 1, 7, 10, 50, 99, 1000] {
            let (train, val, test) = fractions.counts(total);
            assert_eq!(train + val + test, total, "total={total}");
        }
    }

    #[test]
    fn split_sizes_sum_to_total() {
        let all = records(103);
        let (train, val, test) = split_records(&all, SplitFractions::default(), 42);
        assert_eq!(train.len() + val.len() + test.len(), 103);
    }

    #[test]
    fn split_partitions_are_disjoint() {
        let all = records(50);
        let (train, val, test) = split_records(&all, SplitFractions::default(), 42);

        let paths: BTreeSet<PathBuf> = train
            .iter()
            .chain(val.iter())
            .chain(test.iter())
            .map(|r| r.path.clone())
            .collect();
        assert_eq!(paths.len(), 50, "no path may appear in two partitions");
    }

    #[test]
    fn split_reproducible_for_same_seed() {
        let all = records(100);
        let a = split_records(&all, SplitFractions::default(), 42);
        let b = split_records(&all, SplitFractions::default(), 42);
        assert_eq!(a, b);
    }

    #[test]
    fn split_differs_for_different_seed() {
        let all = records(100);
        let (train_a, _, _) = split_records(&all, SplitFractions::default(), 42);
        let (train_b, _, _) = split_records(&all, SplitFractions::default(), 43);
        assert_ne!(train_a, train_b);
    }

    #[test]
    fn split_empty_input() {
        let (train, val, test) = split_records(&[], SplitFractions::default(), 42);
        assert!(train.is_empty() && val.is_empty() && test.is_empty());
    }

    #[test]
    fn splits_override_holdout_transforms() {
        use ml_preprocess::Augmentation;

        let train_transform =
            TransformConfig::default().with_augmentation(Augmentation::default());
        let splits = DatasetSplits::new(&records(20), SplitFractions::default(), 7, train_transform);

        assert!(splits.train.transform.is_augmented());
        assert!(!splits.val.transform.is_augmented());
        assert!(!splits.test.transform.is_augmented());
        assert_eq!(splits.val.transform.side(), splits.train.transform.side());
        assert_eq!(splits.total(), 20);
    }
}
