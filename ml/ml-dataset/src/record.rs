//! Image records and class-folder scanning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ml_types::ClassList;

use crate::error::{DatasetError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A single labeled image: a path plus the index of its class.
///
/// The label is derived from the containing directory during scanning;
/// class index order is the sorted order of the class directory names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path to the image file.
    pub path: PathBuf,

    /// Class index into the dataset's [`ClassList`].
    pub label: usize,
}

impl ImageRecord {
    /// Creates a record from a path and label index.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, label: usize) -> Self {
        Self {
            path: path.into(),
            label,
        }
    }
}

/// Returns `true` if the path carries a recognised image extension.
fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Builds a labeled dataset from a directory of class-named subfolders.
///
/// Subdirectory names become class names; their **sorted** order defines
/// the label indices, so repeated scans of the same tree agree with the
/// `classes.txt` written at training time. Files without an image
/// extension are ignored; directory entries that cannot be read are
/// skipped with a logged warning rather than aborting the scan.
///
/// # Errors
///
/// - [`DatasetError::RootNotFound`] if `dir` is not a directory
/// - [`DatasetError::NoClasses`] if it has no subdirectories
/// - [`DatasetError::EmptyDataset`] if no images were found at all
pub fn scan_image_folder(dir: &Path) -> Result<(Vec<ImageRecord>, ClassList)> {
    if !dir.is_dir() {
        return Err(DatasetError::root_not_found(dir.display().to_string()));
    }

    let mut class_names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            class_names.push(name.to_string());
        }
    }

    if class_names.is_empty() {
        return Err(DatasetError::no_classes(dir.display().to_string()));
    }
    class_names.sort();
    let classes = ClassList::new(class_names)?;

    let mut records = Vec::new();
    for (label, class_name) in classes.iter().enumerate() {
        let class_dir = dir.join(class_name);
        let mut class_count = 0usize;

        for entry in std::fs::read_dir(&class_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(class = class_name, error = %e, "skipping unreadable file entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && has_image_extension(&path) {
                records.push(ImageRecord::new(path, label));
                class_count += 1;
            }
        }
        debug!(class = class_name, images = class_count, "scanned class directory");
    }

    if records.is_empty() {
        return Err(DatasetError::empty_dataset(dir.display().to_string()));
    }

    Ok((records, classes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(path: &Path) {
        let mut img = RgbImage::new(4, 4);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([128, 64, 32]);
        }
        img.save(path).unwrap();
    }

    fn sample_tree(counts: &[(&str, usize)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (class, count) in counts {
            let class_dir = dir.path().join(class);
            std::fs::create_dir(&class_dir).unwrap();
            for i in 0..*count {
                write_image(&class_dir.join(format!("{class}_{i}.png")));
            }
        }
        dir
    }

    #[test]
    fn scan_labels_follow_sorted_class_order() {
        let dir = sample_tree(&[("dog", 2), ("cat", 3)]);
        let (records, classes) = scan_image_folder(dir.path()).unwrap();

        assert_eq!(classes.names(), &["cat".to_string(), "dog".to_string()]);
        assert_eq!(records.len(), 5);
        assert_eq!(records.iter().filter(|r| r.label == 0).count(), 3);
        assert_eq!(records.iter().filter(|r| r.label == 1).count(), 2);
    }

    #[test]
    fn scan_ignores_non_image_files() {
        let dir = sample_tree(&[("cat", 1)]);
        std::fs::write(dir.path().join("cat").join("notes.txt"), "not an image").unwrap();

        let (records, _) = scan_image_folder(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn scan_accepts_uppercase_extensions() {
        let dir = sample_tree(&[("cat", 0)]);
        write_image(&dir.path().join("cat").join("loud.PNG"));

        let (records, _) = scan_image_folder(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn scan_missing_root() {
        let err = scan_image_folder(Path::new("/nonexistent/data")).unwrap_err();
        assert!(matches!(err, DatasetError::RootNotFound(_)));
    }

    #[test]
    fn scan_no_class_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_image_folder(dir.path()).unwrap_err();
        assert!(matches!(err, DatasetError::NoClasses(_)));
    }

    #[test]
    fn scan_empty_classes() {
        let dir = sample_tree(&[("cat", 0), ("dog", 0)]);
        let err = scan_image_folder(dir.path()).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyDataset(_)));
    }
}
