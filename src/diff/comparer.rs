use crate::diff::formatting::{generate_git_diff, generate_readable_summary};
use crate::diff::structured::{Change, ChangeCollector};
use serde::Serialize;
use serde_json::Value as JsonValue;
use treediff::diff;

use super::error::DiffError;

/// Builder for a [`Comparer`]. Works for any serializable revision; in practice a
/// `Slide` (AI edit review) or a whole `Lesson` (before export).
pub struct ComparerBuilder<T> {
    base: Option<T>,
    label: String,
    is_simplify: bool,
}

impl<T> Default for ComparerBuilder<T> {
    fn default() -> Self {
        Self {
            base: None,
            label: "revision".to_string(),
            is_simplify: false,
        }
    }
}

impl<T: Serialize + Clone> ComparerBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The revision to compare against.
    pub fn set_base(mut self, base: T) -> Self {
        self.base = Some(base);
        self
    }

    /// File name stem used in the git-style diff header.
    pub fn set_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Keep only reviewer-facing fields and drop paths from the readable summary.
    pub fn set_simplify(mut self, is_simplify: bool) -> Self {
        self.is_simplify = is_simplify;
        self
    }

    pub fn build(self) -> Result<Comparer<T>, DiffError> {
        let base = self.base.ok_or(DiffError::MissingBase)?;
        Ok(Comparer {
            base_value: serde_json::to_value(&base)?,
            base,
            label: self.label,
            is_simplify: self.is_simplify,
        })
    }
}

/// Compares revisions against a stored base.
pub struct Comparer<T> {
    base: T,
    base_value: JsonValue,
    label: String,
    is_simplify: bool,
}

impl<T: Serialize + Clone> Comparer<T> {
    pub fn base(&self) -> &T {
        &self.base
    }

    pub fn compare(&self, other: &T) -> Result<ComparisonResult, DiffError> {
        let other_value = serde_json::to_value(other)?;

        let mut collector = ChangeCollector::new();
        diff(&self.base_value, &other_value, &mut collector);

        Ok(ComparisonResult {
            base: self.base_value.clone(),
            compared: other_value,
            changes: collector.changes,
            label: self.label.clone(),
            is_simplify: self.is_simplify,
        })
    }
}

/// The outcome of one comparison.
pub struct ComparisonResult {
    base: JsonValue,
    compared: JsonValue,
    changes: Vec<Change>,
    label: String,
    is_simplify: bool,
}

impl ComparisonResult {
    pub fn get_structured_diff(&self) -> &[Change] {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn get_git_diff(&self) -> Result<String, DiffError> {
        let old = serde_json::to_string_pretty(&self.base)?;
        let new = serde_json::to_string_pretty(&self.compared)?;
        generate_git_diff(&old, &new, &self.label)
    }

    pub fn get_readable_diff(&self) -> Result<String, DiffError> {
        generate_readable_summary(&self.changes, self.is_simplify)
    }
}
