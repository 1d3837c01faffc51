//! Repository implementations for SQLite-backed persistence.
//!
//! One repository per record table (projects, sessions, messages, blobs),
//! each operating on the shared Database handle with raw SQL. Identifiers
//! are assigned by SQLite on insert and returned to the caller. Attachment
//! lists and grounding metadata are embedded as JSON text in the messages
//! table.

use std::sync::Arc;

use casebook_core::error::CasebookError;
use casebook_core::types::{
    Attachment, Grounding, Message, MessageRole, Project, Session, StoredBlob,
};

use crate::db::Database;

/// Repository for project records.
pub struct ProjectRepository {
    db: Arc<Database>,
}

impl ProjectRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new project and return it with its assigned id.
    pub fn insert(&self, name: &str, now: i64) -> Result<Project, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (name, created_at, last_message_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, now, now],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to insert project: {}", e)))?;
            Ok(Project {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                created_at: now,
                last_message_at: now,
            })
        })
    }

    /// Find a project by id.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Project>, CasebookError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, created_at, last_message_at FROM projects WHERE id = ?1",
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id], |row| Ok(row_to_project(row)))
                .optional()
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            match result {
                Some(project) => Ok(Some(project?)),
                None => Ok(None),
            }
        })
    }

    /// All projects, most recently touched first.
    pub fn list_by_recency(&self) -> Result<Vec<Project>, CasebookError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, created_at, last_message_at FROM projects
                     ORDER BY last_message_at DESC, id DESC",
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| Ok(row_to_project(row)))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let mut projects = Vec::new();
            for row in rows {
                projects.push(row.map_err(|e| CasebookError::Storage(e.to_string()))??);
            }
            Ok(projects)
        })
    }

    /// Update a project's last-activity timestamp.
    pub fn touch(&self, id: i64, now: i64) -> Result<(), CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE projects SET last_message_at = ?2 WHERE id = ?1",
                rusqlite::params![id, now],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to touch project: {}", e)))?;
            Ok(())
        })
    }

    /// Delete a project row. Child records are the caller's concern (the
    /// cascade is best-effort and lives in the workspace manager).
    pub fn delete(&self, id: i64) -> Result<usize, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM projects WHERE id = ?1", rusqlite::params![id])
                .map_err(|e| CasebookError::Storage(format!("Failed to delete project: {}", e)))
        })
    }

    pub fn count(&self) -> Result<u64, CasebookError> {
        count_table(&self.db, "projects")
    }
}

/// Repository for session records.
pub struct SessionRepository {
    db: Arc<Database>,
}

impl SessionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new session, uncommitted, and return it with its assigned id.
    pub fn insert(&self, project_id: i64, name: &str, now: i64) -> Result<Session, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (project_id, name, created_at, last_active_at, committed)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                rusqlite::params![project_id, name, now, now],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to insert session: {}", e)))?;
            Ok(Session {
                id: conn.last_insert_rowid(),
                project_id,
                name: name.to_string(),
                created_at: now,
                last_active_at: now,
                committed: false,
            })
        })
    }

    /// Find a session by id.
    pub fn find_by_id(&self, id: i64) -> Result<Option<Session>, CasebookError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, project_id, name, created_at, last_active_at, committed
                     FROM sessions WHERE id = ?1",
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id], |row| Ok(row_to_session(row)))
                .optional()
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            match result {
                Some(session) => Ok(Some(session?)),
                None => Ok(None),
            }
        })
    }

    /// Sessions belonging to a project, oldest first (thread order).
    pub fn list_for_project(&self, project_id: i64) -> Result<Vec<Session>, CasebookError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, project_id, name, created_at, last_active_at, committed
                     FROM sessions WHERE project_id = ?1
                     ORDER BY created_at ASC, id ASC",
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![project_id], |row| Ok(row_to_session(row)))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row.map_err(|e| CasebookError::Storage(e.to_string()))??);
            }
            Ok(sessions)
        })
    }

    /// Mark a session committed. Returns the number of rows updated: zero
    /// means the session no longer exists.
    pub fn set_committed(&self, id: i64) -> Result<usize, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET committed = 1 WHERE id = ?1",
                rusqlite::params![id],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to commit session: {}", e)))
        })
    }

    /// Update a session's last-active timestamp.
    pub fn touch(&self, id: i64, now: i64) -> Result<(), CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE sessions SET last_active_at = ?2 WHERE id = ?1",
                rusqlite::params![id, now],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to touch session: {}", e)))?;
            Ok(())
        })
    }

    /// Delete every session owned by a project.
    pub fn delete_for_project(&self, project_id: i64) -> Result<usize, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE project_id = ?1",
                rusqlite::params![project_id],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to delete sessions: {}", e)))
        })
    }

    pub fn count(&self) -> Result<u64, CasebookError> {
        count_table(&self.db, "sessions")
    }
}

/// Fields of a message about to be recorded. The id and immutability come
/// from the store: once inserted, a message is never updated.
pub struct NewMessage<'a> {
    pub project_id: i64,
    pub session_id: i64,
    pub role: MessageRole,
    pub content: &'a str,
    pub timestamp: i64,
    pub attachments: &'a [Attachment],
    pub grounding: Option<&'a Grounding>,
}

/// Repository for message records.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new message and return it with its assigned id.
    pub fn insert(&self, new: NewMessage<'_>) -> Result<Message, CasebookError> {
        let attachments_json = serde_json::to_string(new.attachments)?;
        let grounding_json = new
            .grounding
            .map(serde_json::to_string)
            .transpose()?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (project_id, session_id, role, content, timestamp, attachments, grounding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    new.project_id,
                    new.session_id,
                    new.role.as_str(),
                    new.content,
                    new.timestamp,
                    attachments_json,
                    grounding_json,
                ],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to insert message: {}", e)))?;
            Ok(Message {
                id: conn.last_insert_rowid(),
                project_id: new.project_id,
                session_id: new.session_id,
                role: new.role,
                content: new.content.to_string(),
                timestamp: new.timestamp,
                attachments: new.attachments.to_vec(),
                grounding: new.grounding.cloned(),
            })
        })
    }

    /// Messages of a session in conversation order: by timestamp, ties
    /// broken by insertion order.
    pub fn list_for_session(&self, session_id: i64) -> Result<Vec<Message>, CasebookError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, project_id, session_id, role, content, timestamp, attachments, grounding
                     FROM messages WHERE session_id = ?1
                     ORDER BY timestamp ASC, id ASC",
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![session_id], |row| Ok(row_to_message(row)))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row.map_err(|e| CasebookError::Storage(e.to_string()))??);
            }
            Ok(messages)
        })
    }

    /// Delete every message owned by a project.
    pub fn delete_for_project(&self, project_id: i64) -> Result<usize, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM messages WHERE project_id = ?1",
                rusqlite::params![project_id],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to delete messages: {}", e)))
        })
    }

    pub fn count(&self) -> Result<u64, CasebookError> {
        count_table(&self.db, "messages")
    }
}

/// Repository for blob records (durable uploads).
pub struct BlobRepository {
    db: Arc<Database>,
}

impl BlobRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a blob scoped to a project/session pair and return it with its
    /// assigned id.
    pub fn insert(
        &self,
        project_id: i64,
        session_id: i64,
        attachment: &Attachment,
        now: i64,
    ) -> Result<StoredBlob, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO blobs (project_id, session_id, name, mime_type, data, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    project_id,
                    session_id,
                    attachment.name,
                    attachment.mime_type,
                    attachment.data,
                    now,
                ],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to insert blob: {}", e)))?;
            Ok(StoredBlob {
                id: conn.last_insert_rowid(),
                project_id,
                session_id,
                name: attachment.name.clone(),
                mime_type: attachment.mime_type.clone(),
                data: attachment.data.clone(),
                timestamp: now,
            })
        })
    }

    /// Blobs scoped to a session, in upload order.
    pub fn list_for_session(&self, session_id: i64) -> Result<Vec<StoredBlob>, CasebookError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, project_id, session_id, name, mime_type, data, timestamp
                     FROM blobs WHERE session_id = ?1
                     ORDER BY timestamp ASC, id ASC",
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![session_id], |row| Ok(row_to_blob(row)))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;

            let mut blobs = Vec::new();
            for row in rows {
                blobs.push(row.map_err(|e| CasebookError::Storage(e.to_string()))??);
            }
            Ok(blobs)
        })
    }

    /// Delete every blob owned by a project, without touching the session
    /// table (the project id is carried redundantly for exactly this).
    pub fn delete_for_project(&self, project_id: i64) -> Result<usize, CasebookError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM blobs WHERE project_id = ?1",
                rusqlite::params![project_id],
            )
            .map_err(|e| CasebookError::Storage(format!("Failed to delete blobs: {}", e)))
        })
    }

    pub fn count(&self) -> Result<u64, CasebookError> {
        count_table(&self.db, "blobs")
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn count_table(db: &Database, table: &str) -> Result<u64, CasebookError> {
    db.with_conn(|conn| {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| CasebookError::Storage(e.to_string()))?;
        Ok(count as u64)
    })
}

fn row_to_project(row: &rusqlite::Row<'_>) -> Result<Project, CasebookError> {
    Ok(Project {
        id: row.get(0).map_err(|e| CasebookError::Storage(e.to_string()))?,
        name: row.get(1).map_err(|e| CasebookError::Storage(e.to_string()))?,
        created_at: row.get(2).map_err(|e| CasebookError::Storage(e.to_string()))?,
        last_message_at: row.get(3).map_err(|e| CasebookError::Storage(e.to_string()))?,
    })
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session, CasebookError> {
    let committed: i64 = row.get(5).map_err(|e| CasebookError::Storage(e.to_string()))?;
    Ok(Session {
        id: row.get(0).map_err(|e| CasebookError::Storage(e.to_string()))?,
        project_id: row.get(1).map_err(|e| CasebookError::Storage(e.to_string()))?,
        name: row.get(2).map_err(|e| CasebookError::Storage(e.to_string()))?,
        created_at: row.get(3).map_err(|e| CasebookError::Storage(e.to_string()))?,
        last_active_at: row.get(4).map_err(|e| CasebookError::Storage(e.to_string()))?,
        committed: committed != 0,
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, CasebookError> {
    let role_str: String = row.get(3).map_err(|e| CasebookError::Storage(e.to_string()))?;
    let role = MessageRole::parse(&role_str)
        .ok_or_else(|| CasebookError::Storage(format!("Invalid role: {}", role_str)))?;

    let attachments_json: String = row.get(6).map_err(|e| CasebookError::Storage(e.to_string()))?;
    let attachments: Vec<Attachment> = serde_json::from_str(&attachments_json)
        .map_err(|e| CasebookError::Storage(format!("Invalid attachments json: {}", e)))?;

    let grounding_json: Option<String> =
        row.get(7).map_err(|e| CasebookError::Storage(e.to_string()))?;
    let grounding = grounding_json
        .as_deref()
        .map(serde_json::from_str::<Grounding>)
        .transpose()
        .map_err(|e| CasebookError::Storage(format!("Invalid grounding json: {}", e)))?;

    Ok(Message {
        id: row.get(0).map_err(|e| CasebookError::Storage(e.to_string()))?,
        project_id: row.get(1).map_err(|e| CasebookError::Storage(e.to_string()))?,
        session_id: row.get(2).map_err(|e| CasebookError::Storage(e.to_string()))?,
        role,
        content: row.get(4).map_err(|e| CasebookError::Storage(e.to_string()))?,
        timestamp: row.get(5).map_err(|e| CasebookError::Storage(e.to_string()))?,
        attachments,
        grounding,
    })
}

fn row_to_blob(row: &rusqlite::Row<'_>) -> Result<StoredBlob, CasebookError> {
    Ok(StoredBlob {
        id: row.get(0).map_err(|e| CasebookError::Storage(e.to_string()))?,
        project_id: row.get(1).map_err(|e| CasebookError::Storage(e.to_string()))?,
        session_id: row.get(2).map_err(|e| CasebookError::Storage(e.to_string()))?,
        name: row.get(3).map_err(|e| CasebookError::Storage(e.to_string()))?,
        mime_type: row.get(4).map_err(|e| CasebookError::Storage(e.to_string()))?,
        data: row.get(5).map_err(|e| CasebookError::Storage(e.to_string()))?,
        timestamp: row.get(6).map_err(|e| CasebookError::Storage(e.to_string()))?,
    })
}

/// Extension trait for rusqlite to support optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
