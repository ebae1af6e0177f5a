//! Ordered class labels and `classes.txt` persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypesError};

/// An ordered, non-empty list of class names.
///
/// Index order is significant: it must match the output dimension of the
/// model trained with this list. The list round-trips through the
/// newline-separated `classes.txt` format consumed by the inference
/// service.
///
/// # Example
///
/// ```
/// use ml_types::ClassList;
///
/// let classes = ClassList::new(vec!["cat".into(), "dog".into()]).unwrap();
/// assert_eq!(classes.len(), 2);
/// assert_eq!(classes.name(1), Some("dog"));
/// assert_eq!(classes.index_of("cat"), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    /// Creates a class list from ordered names.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::EmptyClassList`] for an empty input,
    /// [`TypesError::InvalidClassName`] for empty or multi-line names, and
    /// [`TypesError::DuplicateClass`] if a name repeats.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(TypesError::EmptyClassList);
        }
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() || name.contains('\n') {
                return Err(TypesError::invalid_class_name(name.clone()));
            }
            if names[..i].contains(name) {
                return Err(TypesError::duplicate_class(name.clone()));
            }
        }
        Ok(Self { names })
    }

    /// The default cats-vs-dogs label pair.
    #[must_use]
    pub fn cats_dogs() -> Self {
        Self {
            names: vec!["cat".to_string(), "dog".to_string()],
        }
    }

    /// Parses a newline-separated class list.
    ///
    /// Blank lines and surrounding whitespace are ignored.
    ///
    /// # Errors
    ///
    /// Same validation as [`ClassList::new`].
    pub fn from_text(text: &str) -> Result<Self> {
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect();
        Self::new(names)
    }

    /// Renders the list in `classes.txt` format (one name per line).
    #[must_use]
    pub fn to_text(&self) -> String {
        self.names.join("\n")
    }

    /// Loads a class list from a `classes.txt` file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a validation
    /// error if its contents are not a valid class list.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TypesError::io(format!("{}: {e}", path.display())))?;
        Self::from_text(&text)
    }

    /// Saves the list to a `classes.txt` file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_text())
            .map_err(|e| TypesError::io(format!("{}: {e}", path.display())))?;
        Ok(())
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the list is empty (never, for a constructed list).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the class at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of the given class name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All names, in index order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates over the names in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
