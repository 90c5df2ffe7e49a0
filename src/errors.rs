use thiserror::Error;

use crate::models::media::MediaIndex;

/// Represents errors that can occur while loading, running, editing or exporting a lesson.
#[derive(Error, Debug)]
pub enum LessonError {
    /// The generation collaborator (or an embedded document) produced content that
    /// cannot be turned into a lesson. Never recovered silently.
    #[error("Malformed lesson input: {0}")]
    MalformedInput(String),

    /// Error occurred while (de)serializing lesson JSON.
    #[error("Failed to process lesson JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A block points at a media index that is not in the media table.
    /// Rendering recovers from this locally; it is only returned by explicit lookups.
    #[error("Media index {0} is not present in the media table")]
    UnresolvedMediaReference(MediaIndex),

    /// A structural edit would break a lesson invariant. Nothing was mutated.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// An async result arrived after its slide or editor stopped being current.
    #[error("Discarded stale result from {0}")]
    StaleAsyncResult(&'static str),

    /// A narration or AI-edit backend is missing credentials or unreachable.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// An editor field holds a value that cannot be committed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error originating from the underlying HTTP client (`reqwest`).
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// An error reported by a remote API (4xx or 5xx status code).
    #[error("API returned an error: Status {status}, Message: {message}")]
    ApiError {
        status: reqwest::StatusCode,
        message: String,
    },

    /// An error related to reading environment variables.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A data URI payload could not be decoded.
    #[error("Failed to decode media payload: {0}")]
    MediaDecode(#[from] base64::DecodeError),

    /// Error occurred during string formatting while building markup.
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// An I/O error occurred, e.g. while reading or writing lesson files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A type alias for `Result<T, LessonError>` for convenience within the crate.
pub type Result<T> = std::result::Result<T, LessonError>;
