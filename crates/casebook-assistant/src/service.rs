//! The contract between the workspace and the reasoning collaborator.

use async_trait::async_trait;

use casebook_core::types::{Attachment, Grounding, Message};

use crate::error::AssistantError;

/// One turn's worth of input for the collaborator.
#[derive(Clone, Debug, Default)]
pub struct ReasoningRequest {
    /// Free-form user text for the current turn.
    pub text: String,
    /// Attachments captured at composition time, in upload order.
    pub attachments: Vec<Attachment>,
    /// Prior turns, best-effort and not guaranteed complete.
    pub history: Vec<Message>,
}

/// The collaborator's reply for one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct ReasoningReply {
    pub text: String,
    /// Citation metadata, when the service grounded its answer.
    pub grounding: Option<Grounding>,
}

/// A remote reasoning/generation service.
///
/// The workspace holds this trait object so orchestration can be exercised
/// without a network; `GeminiClient` is the production implementation.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate(&self, request: &ReasoningRequest) -> Result<ReasoningReply, AssistantError>;
}
