//! Shared types for the cats-vs-dogs classifier pipeline.
//!
//! This crate provides the vocabulary used across training and serving:
//!
//! # Class Labels
//!
//! - [`ClassList`] - Ordered class names with `classes.txt` persistence
//!
//! # Predictions
//!
//! - [`Prediction`] - A classification result with per-class probabilities
//! - [`softmax`] - Numerically stable probability computation
//! - [`argmax`] - Index of the winning logit
//!
//! # Invariant
//!
//! The order of a [`ClassList`] is significant: index `i` must match output
//! column `i` of the model that was trained with it. Every consumer goes
//! through this type rather than re-reading `classes.txt` ad hoc.
//!
//! # Example
//!
//! ```
//! use ml_types::{ClassList, softmax, argmax};
//!
//! let classes = ClassList::cats_dogs();
//! let probs = softmax(&[1.0, 3.0]);
//! let winner = argmax(&probs).unwrap_or(0);
//! assert_eq!(classes.name(winner), Some("dog"));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod classes;
mod error;
mod prediction;

pub use classes::ClassList;
pub use error::{Result, TypesError};
pub use prediction::{Prediction, argmax, softmax};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{ClassList, Prediction, Result, TypesError, argmax, softmax};
}
