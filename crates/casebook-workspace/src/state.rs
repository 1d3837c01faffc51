//! Transient workspace state.
//!
//! The visible "current project / session / messages" cluster, held as one
//! explicit struct owned by the manager. The durable store is the single
//! source of truth; this is a read-through cache invalidated on every table
//! mutation. Also carries the pending-attachment list the UI displays and
//! the queue of blobs uploaded before any session was active.

use casebook_core::types::{Attachment, Message};

/// Mutable state behind the manager's lock.
#[derive(Debug, Default)]
pub struct WorkspaceState {
    /// Currently selected project, if any.
    pub active_project: Option<i64>,
    /// Currently selected session, if any.
    pub active_session: Option<i64>,
    /// Cached messages of the active session, in conversation order.
    pub messages: Vec<Message>,
    /// Attachments ingested but not yet sent with a turn.
    pub pending_attachments: Vec<Attachment>,
    /// Uploads that arrived before any session was active; flushed to the
    /// blob table as soon as one becomes active.
    pub queued_blobs: Vec<Attachment>,
}

impl WorkspaceState {
    /// Forget the active selection and its cached messages.
    pub fn clear_active(&mut self) {
        self.active_project = None;
        self.active_session = None;
        self.messages.clear();
    }

    /// Point the cache at a freshly selected session.
    pub fn activate(&mut self, project_id: i64, session_id: i64, messages: Vec<Message>) {
        self.active_project = Some(project_id);
        self.active_session = Some(session_id);
        self.messages = messages;
    }
}
