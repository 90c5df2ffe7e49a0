//! Revision diffs for slides and lessons.
//!
//! Used to review an AI-assisted rewrite before it is saved, and to see what an
//! editing session changed before export.

pub mod comparer;
pub mod error;
pub(crate) mod formatting;
pub mod structured;

pub use comparer::{Comparer, ComparerBuilder, ComparisonResult};
pub use error::DiffError;
pub use structured::{Change, ChangeType, ValueRepr};

use crate::edit::ai::AiEditOutcome;
use crate::models::slide::Slide;

/// Compares two revisions of one slide.
pub fn compare_slides(before: &Slide, after: &Slide) -> Result<ComparisonResult, DiffError> {
    ComparerBuilder::new()
        .set_base(before.clone())
        .set_label("slide")
        .build()?
        .compare(after)
}

impl AiEditOutcome {
    /// Readable summary of what an applied rewrite changed, for the editor to show
    /// before the form is saved. `None` for outcomes that changed nothing.
    pub fn review(&self) -> Result<Option<String>, DiffError> {
        match self {
            AiEditOutcome::Applied { before, after } => {
                Ok(Some(compare_slides(before, after)?.get_readable_diff()?))
            }
            AiEditOutcome::Discarded | AiEditOutcome::Failed { .. } => Ok(None),
        }
    }
}
