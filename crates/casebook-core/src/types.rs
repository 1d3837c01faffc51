use chrono::Utc;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Author of a conversational turn. Exactly one of two variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// A turn composed by the user.
    User,
    /// A reply generated by (or synthesized on behalf of) the assistant.
    Assistant,
}

impl MessageRole {
    /// Stable string form used in the database `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Parse the database string form back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// Observed durability state of the most recent local mutation.
///
/// Purely observational: the tracker never retries and never blocks further
/// writes. Surfaced to the UI as a persistence indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The store matches the visible state, nothing pending.
    #[default]
    Synced,
    /// A write is in flight.
    Syncing,
    /// A write succeeded but the session holding it is not yet committed.
    Volatile,
    /// The most recent write failed; prior data is untouched.
    Error,
}

/// Lifecycle of a single chat turn through the orchestrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Input is being edited; nothing submitted.
    #[default]
    Composing,
    /// Validation passed, implicit project/session resolution underway.
    Submitted,
    /// The user message is durable and the collaborator call is in flight.
    AwaitingReply,
    /// The assistant reply was persisted and surfaced.
    Completed,
    /// The collaborator failed; a synthetic assistant notice was persisted.
    Failed,
}

// =============================================================================
// Entities
// =============================================================================

/// Top-level unit of work, analogous to a case file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Assigned by the store on creation, stable for the project's lifetime.
    pub id: i64,
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Updated on every turn in any of the project's sessions.
    pub last_message_at: i64,
}

/// One continuous conversational thread within a Project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub created_at: i64,
    pub last_active_at: i64,
    /// User-declared finalization marker. Starts `false`, set `true` only by
    /// an explicit commit; never cleared automatically.
    pub committed: bool,
}

/// One immutable conversational turn.
///
/// Ordering within a session is total: by `timestamp`, ties broken by `id`
/// (insertion order). Destroyed only via project or session cascade delete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub project_id: i64,
    pub session_id: i64,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: i64,
    /// Attachments captured at composition time, in upload order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Citation metadata; only ever present on `assistant` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<Grounding>,
}

/// A named, typed, base64-encoded payload attached to a message at
/// composition time. A value object embedded in the message, not
/// independently addressable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
    pub size_bytes: u64,
}

impl Attachment {
    /// Whether this attachment requires a multimodal-capable model variant.
    pub fn is_visual_document(&self) -> bool {
        self.mime_type.contains("pdf") || self.mime_type.contains("image")
    }
}

/// Durable counterpart of an [`Attachment`]: same payload, different
/// lifecycle. A blob never requires a corresponding message — an upload the
/// user never sends still survives here.
///
/// `project_id` is carried redundantly alongside `session_id` so project
/// cascade delete and orphan cleanup never traverse the session table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub id: i64,
    pub project_id: i64,
    pub session_id: i64,
    pub name: String,
    pub mime_type: String,
    pub data: String,
    pub timestamp: i64,
}

// =============================================================================
// Grounding metadata
// =============================================================================

/// A single citation returned alongside a generated reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingRef {
    pub uri: String,
    pub title: String,
}

/// Citation metadata attached to an assistant reply.
///
/// A closed tagged variant rather than an open structure: a reply is either
/// web-grounded or location-grounded, each carrying its own typed reference
/// list. Absence of grounding is `Option::None` on the message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "refs", rename_all = "snake_case")]
pub enum Grounding {
    /// References originating from web search.
    Web(Vec<GroundingRef>),
    /// References originating from a location/maps-style source.
    Location(Vec<GroundingRef>),
}

impl Grounding {
    pub fn refs(&self) -> &[GroundingRef] {
        match self {
            Grounding::Web(refs) | Grounding::Location(refs) => refs,
        }
    }
}

/// Current time as epoch milliseconds, the timestamp unit used across all
/// tables.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
