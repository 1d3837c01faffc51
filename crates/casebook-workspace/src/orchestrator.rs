//! Chat turn orchestration.
//!
//! Sequences one user-authored turn: validate, resolve the active
//! project/session pair, persist the user message, invoke the reasoning
//! collaborator, then persist and surface the reply or a synthetic failure
//! notice. The user's side of the turn is durable before the collaborator
//! is ever called, and every submitted turn terminates in a visible
//! assistant message.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use casebook_assistant::{ReasoningRequest, ReasoningService};
use casebook_core::error::CasebookError;
use casebook_core::types::{Message, MessageRole, TurnPhase};

use crate::manager::WorkspaceManager;

/// Implicit project names are cut to this many characters of input text.
const PROJECT_NAME_CHARS: usize = 30;

/// Project name when the first turn has attachments but no text.
const FALLBACK_PROJECT_NAME: &str = "New direct estimate";

/// Surfaced in place of a reply when the collaborator fails. States that
/// the durable record is intact.
const FAILURE_NOTICE: &str = "The reasoning service could not complete this request. \
Your message and attachments are saved locally and remain intact; try again in a moment.";

/// Outcome of a successfully submitted turn.
#[derive(Clone, Debug)]
pub struct TurnReport {
    pub user: Message,
    pub assistant: Message,
}

/// Drives the per-turn state machine over the workspace and the
/// collaborator.
pub struct TurnOrchestrator {
    manager: Arc<WorkspaceManager>,
    assistant: Arc<dyn ReasoningService>,
    phase: Mutex<TurnPhase>,
}

impl TurnOrchestrator {
    pub fn new(manager: Arc<WorkspaceManager>, assistant: Arc<dyn ReasoningService>) -> Self {
        Self {
            manager,
            assistant,
            phase: Mutex::new(TurnPhase::Composing),
        }
    }

    /// The current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
            .lock()
            .map(|p| *p)
            .unwrap_or(TurnPhase::Composing)
    }

    /// Submit one turn. Returns `None` without side effects when validation
    /// refuses the submission (empty input, or a turn already in flight).
    pub async fn send(&self, input: &str) -> Result<Option<TurnReport>, CasebookError> {
        let text = input.trim().to_string();
        let attachments = self.manager.pending_attachments();

        if text.is_empty() && attachments.is_empty() {
            debug!("Ignoring empty submission");
            return Ok(None);
        }
        if !self.enter_submitted() {
            warn!("A turn is already awaiting its reply; submission rejected");
            return Ok(None);
        }

        // Pre-flight: both implicit creations complete before any message
        // is recorded; failure aborts the send with nothing written.
        let fallback = implicit_project_name(&text);
        let (project_id, session_id) = match self.manager.ensure_active_session(&fallback) {
            Ok(ids) => ids,
            Err(e) => {
                self.set_phase(TurnPhase::Failed);
                return Err(e);
            }
        };

        // Context snapshot before this turn is appended.
        let history = self.manager.cached_messages();

        // The user's side of the turn is durable before the collaborator is
        // invoked.
        let user = match self.manager.record_message(
            project_id,
            session_id,
            MessageRole::User,
            &text,
            &attachments,
            None,
        ) {
            Ok(message) => message,
            Err(e) => {
                self.set_phase(TurnPhase::Failed);
                return Err(e);
            }
        };

        self.set_phase(TurnPhase::AwaitingReply);
        let request = ReasoningRequest {
            text,
            attachments,
            history,
        };
        let outcome = self.assistant.generate(&request).await;

        let (reply_result, final_phase) = match outcome {
            Ok(reply) => {
                let recorded = self.manager.record_message(
                    project_id,
                    session_id,
                    MessageRole::Assistant,
                    &reply.text,
                    &[],
                    reply.grounding.as_ref(),
                );
                (recorded, TurnPhase::Completed)
            }
            Err(e) => {
                warn!(error = %e, "Reasoning call failed; surfacing failure notice");
                let recorded = self.manager.record_message(
                    project_id,
                    session_id,
                    MessageRole::Assistant,
                    FAILURE_NOTICE,
                    &[],
                    None,
                );
                if recorded.is_ok() {
                    // The notice is durable, but the turn itself failed.
                    self.manager.report_sync_error();
                }
                (recorded, TurnPhase::Failed)
            }
        };

        // The composition buffer empties regardless of outcome.
        self.manager.clear_pending();

        match reply_result {
            Ok(assistant) => {
                self.set_phase(final_phase);
                Ok(Some(TurnReport { user, assistant }))
            }
            Err(e) => {
                self.set_phase(TurnPhase::Failed);
                Err(e)
            }
        }
    }

    /// Move Composing/Completed/Failed → Submitted; refuse while a turn is
    /// awaiting its reply.
    fn enter_submitted(&self) -> bool {
        match self.phase.lock() {
            Ok(mut phase) => {
                if *phase == TurnPhase::AwaitingReply {
                    false
                } else {
                    *phase = TurnPhase::Submitted;
                    true
                }
            }
            Err(_) => false,
        }
    }

    fn set_phase(&self, phase: TurnPhase) {
        if let Ok(mut current) = self.phase.lock() {
            *current = phase;
        }
    }
}

/// First ~30 characters of the input, or the fixed label for
/// attachment-only first turns.
fn implicit_project_name(text: &str) -> String {
    if text.is_empty() {
        return FALLBACK_PROJECT_NAME.to_string();
    }
    text.chars().take(PROJECT_NAME_CHARS).collect()
}
