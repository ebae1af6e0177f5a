//! Labeled image-folder datasets and reproducible splits.
//!
//! # Dataset Operations
//!
//! - [`ImageRecord`] - A single image path with its label index
//! - [`scan_image_folder`] - Build a labeled dataset from class-named
//!   subfolders
//! - [`split_records`] - Partition records into train/val/test
//! - [`DatasetSplits`] - The three partitions, each with its transform
//! - [`DatasetSummary`] - Per-class counts for logging
//!
//! # Reproducibility
//!
//! Splitting shuffles with a `ChaCha8Rng` seeded by the caller, so the
//! same seed always produces identical partitions. Partitions are disjoint
//! and their sizes sum to the dataset size.
//!
//! # Transforms
//!
//! The full dataset is configured with the (augmented) training transform.
//! After splitting, the validation and test partitions override theirs
//! with the deterministic variant derived from the training transform —
//! the augmentation stage is stripped, nothing else changes.
//!
//! # Example
//!
//! ```
//! use ml_dataset::{ImageRecord, SplitFractions, split_records};
//!
//! let records: Vec<ImageRecord> = (0..10)
//!     .map(|i| ImageRecord::new(format!("img_{i}.jpg"), i % 2))
//!     .collect();
//!
//! let (train, val, test) = split_records(&records, SplitFractions::default(), 42);
//! assert_eq!(train.len() + val.len() + test.len(), 10);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod record;
mod splits;
mod summary;

pub use error::{DatasetError, Result};
pub use record::{ImageRecord, scan_image_folder};
pub use splits::{DatasetSplits, SplitFractions, SplitSet, split_records};
pub use summary::DatasetSummary;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        DatasetError, DatasetSplits, DatasetSummary, ImageRecord, SplitFractions, SplitSet,
        scan_image_folder, split_records,
    };
}
