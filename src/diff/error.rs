use thiserror::Error;

/// Errors raised while comparing two lesson revisions.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Text diff generation failed: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("No base revision set")]
    MissingBase,
}
