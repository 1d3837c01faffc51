use thiserror::Error;

/// Top-level error type for the Casebook system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for
/// CasebookError` so that the `?` operator works seamlessly across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CasebookError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A durable-store read or write failed (quota, locked file, missing
    /// table). Cascade deletes tolerate this per table; the send path does
    /// not.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An uploaded file could not be read into a payload. Contained to the
    /// single file; sibling uploads proceed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The reasoning collaborator failed or returned an unusable response.
    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CasebookError {
    fn from(err: toml::de::Error) -> Self {
        CasebookError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CasebookError {
    fn from(err: toml::ser::Error) -> Self {
        CasebookError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CasebookError {
    fn from(err: serde_json::Error) -> Self {
        CasebookError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Casebook operations.
pub type Result<T> = std::result::Result<T, CasebookError>;
