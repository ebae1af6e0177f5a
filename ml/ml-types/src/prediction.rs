//! Classification results and probability helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classes::ClassList;
use crate::error::{Result, TypesError};

/// Computes a numerically stable softmax over raw logits.
///
/// The maximum logit is subtracted before exponentiation so large values
/// cannot overflow. An empty slice yields an empty vector.
///
/// # Example
///
/// ```
/// use ml_types::softmax;
///
/// let probs = softmax(&[0.0, 0.0]);
/// assert!((probs[0] - 0.5).abs() < 1e-6);
/// assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|x| x / sum).collect()
}

/// Index of the largest value, or `None` for an empty slice.
///
/// Ties resolve to the earliest index, matching the class that comes first
/// in the list.
#[must_use]
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// A single classification result.
///
/// # Example
///
/// ```
/// use ml_types::{ClassList, Prediction};
///
/// let classes = ClassList::cats_dogs();
/// let pred = Prediction::from_probabilities(&classes, &[0.25, 0.75], 0.01).unwrap();
///
/// assert_eq!(pred.prediction, "dog");
/// assert!((pred.confidence - 0.75).abs() < 1e-6);
/// assert!(pred.is_normalized());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class name (the highest-probability class).
    pub prediction: String,

    /// Probability of the predicted class, in `[0, 1]`.
    pub confidence: f32,

    /// Full per-class probability mapping.
    pub probabilities: BTreeMap<String, f32>,

    /// Wall-clock time spent producing this prediction, in seconds.
    pub latency_seconds: f64,
}

impl Prediction {
    /// Builds a prediction from per-class probabilities.
    ///
    /// `probabilities[i]` corresponds to `classes` index `i`. The winner
    /// and its confidence are derived here so callers cannot disagree with
    /// the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::ProbabilityCountMismatch`] if the probability
    /// count differs from the class count, or
    /// [`TypesError::EmptyClassList`] if both are empty.
    pub fn from_probabilities(
        classes: &ClassList,
        probabilities: &[f32],
        latency_seconds: f64,
    ) -> Result<Self> {
        if probabilities.len() != classes.len() {
            return Err(TypesError::probability_count_mismatch(
                probabilities.len(),
                classes.len(),
            ));
        }
        let winner = argmax(probabilities).ok_or(TypesError::EmptyClassList)?;
        let prediction = classes
            .name(winner)
            .ok_or(TypesError::EmptyClassList)?
            .to_string();

        let mapping = classes
            .iter()
            .map(ToString::to_string)
            .zip(probabilities.iter().copied())
            .collect();

        Ok(Self {
            prediction,
            confidence: probabilities[winner],
            probabilities: mapping,
            latency_seconds,
        })
    }

    /// Returns `true` if the probabilities sum to `1.0 ± 1e-3`.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        let sum: f32 = self.probabilities.values().sum();
        (sum - 1.0).abs() <= 1e-3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn softmax_stable_with_large_logits() {
        let probs = softmax(&[1000.0, 1001.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn softmax_empty() {
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn softmax_uniform_for_equal_logits() {
        let probs = softmax(&[2.5, 2.5]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn argmax_basic() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_tie_takes_first() {
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
    }

    #[test]
    fn prediction_two_class_mapping() {
        let classes = ClassList::cats_dogs();
        let pred = Prediction::from_probabilities(&classes, &[0.6, 0.4], 0.002).unwrap();

        assert_eq!(pred.prediction, "cat");
        assert_eq!(pred.probabilities.len(), 2);
        assert!(pred.is_normalized());
        assert!((pred.probabilities["dog"] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn prediction_count_mismatch() {
        let classes = ClassList::cats_dogs();
        let err = Prediction::from_probabilities(&classes, &[1.0], 0.0).unwrap_err();
        assert!(matches!(err, TypesError::ProbabilityCountMismatch { .. }));
    }

    #[test]
    fn prediction_not_normalized() {
        let classes = ClassList::cats_dogs();
        let pred = Prediction::from_probabilities(&classes, &[0.9, 0.4], 0.0).unwrap();
        assert!(!pred.is_normalized());
    }

    #[test]
    fn prediction_serialization() {
        let classes = ClassList::cats_dogs();
        let pred = Prediction::from_probabilities(&classes, &[0.3, 0.7], 0.01).unwrap();

        let json = serde_json::to_string(&pred).unwrap();
        assert!(json.contains("\"prediction\":\"dog\""));
        assert!(json.contains("\"probabilities\""));

        let parsed: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pred);
    }
}
