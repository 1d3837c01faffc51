//! Error types for the reasoning-collaborator interface.

use casebook_core::error::CasebookError;

/// Errors from the reasoning service.
///
/// All variants are caught at the orchestrator boundary and converted into a
/// visible assistant message; none of them is allowed to propagate as an
/// unhandled fault.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("credential environment variable {0} is not set")]
    MissingCredential(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("response contained no generated text")]
    EmptyReply,
    #[error("failed to parse response: {0}")]
    MalformedResponse(String),
}

impl From<AssistantError> for CasebookError {
    fn from(err: AssistantError) -> Self {
        CasebookError::Assistant(err.to_string())
    }
}
