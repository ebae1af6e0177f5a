//! Dataset statistics for logging.

use serde::{Deserialize, Serialize};

use ml_types::ClassList;

use crate::record::ImageRecord;

/// Per-class counts over a set of records.
///
/// # Example
///
/// ```
/// use ml_dataset::{DatasetSummary, ImageRecord};
/// use ml_types::ClassList;
///
/// let classes = ClassList::cats_dogs();
/// let records = vec![
///     ImageRecord::new("a.jpg", 0),
///     ImageRecord::new("b.jpg", 1),
///     ImageRecord::new("c.jpg", 1),
/// ];
///
/// let summary = DatasetSummary::from_records(&records, &classes);
/// assert_eq!(summary.total, 3);
/// assert_eq!(summary.count_for("dog"), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Total number of records.
    pub total: usize,

    /// `(class name, count)` pairs in class index order.
    pub per_class: Vec<(String, usize)>,
}

impl DatasetSummary {
    /// Tallies records against the class list.
    ///
    /// Labels outside the class list are counted into the total but not
    /// into any class bucket; scanning never produces them, so a mismatch
    /// here points at a stale `classes.txt`.
    #[must_use]
    pub fn from_records(records: &[ImageRecord], classes: &ClassList) -> Self {
        let mut counts = vec![0usize; classes.len()];
        for record in records {
            if let Some(count) = counts.get_mut(record.label) {
                *count += 1;
            }
        }

        let per_class = classes
            .iter()
            .map(ToString::to_string)
            .zip(counts)
            .collect();

        Self {
            total: records.len(),
            per_class,
        }
    }

    /// Count for a class by name.
    #[must_use]
    pub fn count_for(&self, class: &str) -> Option<usize> {
        self.per_class
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, count)| *count)
    }
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} images (", self.total)?;
        for (i, (name, count)) in self.per_class.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {count}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_per_class() {
        let classes = ClassList::cats_dogs();
        let records = vec![
            ImageRecord::new("a.jpg", 0),
            ImageRecord::new("b.jpg", 0),
            ImageRecord::new("c.jpg", 1),
        ];

        let summary = DatasetSummary::from_records(&records, &classes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count_for("cat"), Some(2));
        assert_eq!(summary.count_for("dog"), Some(1));
        assert_eq!(summary.count_for("bird"), None);
    }

    #[test]
    fn summary_empty_records() {
        let classes = ClassList::cats_dogs();
        let summary = DatasetSummary::from_records(&[], &classes);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.count_for("cat"), Some(0));
    }

    #[test]
    fn summary_display() {
        let classes = ClassList::cats_dogs();
        let records = vec![ImageRecord::new("a.jpg", 1)];
        let summary = DatasetSummary::from_records(&records, &classes);
        assert_eq!(summary.to_string(), "1 images (cat: 0, dog: 1)");
    }
}
