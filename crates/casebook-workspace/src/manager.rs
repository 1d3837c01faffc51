//! Project/session lifecycle management.
//!
//! Creates, lists, and deletes projects and sessions, enforcing the
//! auto-provisioning rule (a project in active use is never session-less)
//! and the best-effort cascade on delete. All writes go through the entity
//! repositories; the transient state struct is refreshed after each one.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use tracing::{debug, warn};

use casebook_core::error::CasebookError;
use casebook_core::types::{
    now_ms, Attachment, Grounding, Message, MessageRole, Project, Session, SyncStatus,
};
use casebook_storage::repository::NewMessage;
use casebook_storage::{
    BlobRepository, Database, MessageRepository, ProjectRepository, SessionRepository,
};

use crate::state::WorkspaceState;
use crate::status::SyncTracker;

/// Central controller over the four entity tables and the transient state.
pub struct WorkspaceManager {
    projects: ProjectRepository,
    sessions: SessionRepository,
    messages: MessageRepository,
    blobs: BlobRepository,
    state: Mutex<WorkspaceState>,
    tracker: SyncTracker,
}

impl WorkspaceManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            projects: ProjectRepository::new(Arc::clone(&db)),
            sessions: SessionRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(Arc::clone(&db)),
            blobs: BlobRepository::new(db),
            state: Mutex::new(WorkspaceState::default()),
            tracker: SyncTracker::new(),
        }
    }

    // -- Observers --

    /// Currently observed sync status.
    pub fn status(&self) -> SyncStatus {
        self.tracker.current()
    }

    /// The active (project, session) pair, either of which may be unset.
    pub fn active(&self) -> (Option<i64>, Option<i64>) {
        match self.state.lock() {
            Ok(state) => (state.active_project, state.active_session),
            Err(_) => (None, None),
        }
    }

    /// Snapshot of the active session's cached messages.
    pub fn cached_messages(&self) -> Vec<Message> {
        self.state
            .lock()
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the attachments awaiting the next turn.
    pub fn pending_attachments(&self) -> Vec<Attachment> {
        self.state
            .lock()
            .map(|s| s.pending_attachments.clone())
            .unwrap_or_default()
    }

    // -- Project operations --

    /// All projects, most recently touched first. If nothing is active yet
    /// and projects exist, the most recent one becomes current — a project
    /// is never auto-created here.
    pub fn list_projects(&self) -> Result<Vec<Project>, CasebookError> {
        self.tracker.begin();
        let projects = match self.projects.list_by_recency() {
            Ok(projects) => projects,
            Err(e) => {
                self.tracker.fail();
                return Err(e);
            }
        };

        {
            let mut state = self.state()?;
            if state.active_project.is_none() {
                if let Some(most_recent) = projects.first() {
                    state.active_project = Some(most_recent.id);
                }
            }
        }

        self.tracker.succeed(SyncStatus::Synced);
        Ok(projects)
    }

    /// Create a project (name defaults to the current date and time), make
    /// it active, and immediately provision its first session.
    ///
    /// On failure nothing is left referenceable: a project row written
    /// before a failed session write is removed again, best-effort.
    pub fn create_project(&self, name: Option<&str>) -> Result<Project, CasebookError> {
        self.tracker.begin();
        let now = now_ms();
        let name = match name {
            Some(n) => n.to_string(),
            None => default_project_name(),
        };

        let project = match self.projects.insert(&name, now) {
            Ok(project) => project,
            Err(e) => {
                self.tracker.fail();
                return Err(e);
            }
        };

        let session = match self.sessions.insert(project.id, &default_session_name(), now) {
            Ok(session) => session,
            Err(e) => {
                // Do not leave a session-less project behind.
                if let Err(cleanup) = self.projects.delete(project.id) {
                    warn!(project_id = project.id, error = %cleanup,
                        "Failed to remove half-created project");
                }
                self.tracker.fail();
                return Err(e);
            }
        };

        {
            let mut state = self.state()?;
            state.activate(project.id, session.id, Vec::new());
        }
        self.flush_queued_blobs(project.id, session.id);

        debug!(project_id = project.id, session_id = session.id, "Project created");
        self.tracker.succeed(SyncStatus::Volatile);
        Ok(project)
    }

    /// Best-effort ordered cascade: blobs, messages, sessions, then the
    /// project row itself. Each per-table delete is attempted regardless of
    /// earlier failures; any failure resolves the tracker to `Error` but
    /// deletion of the remaining tables still proceeds.
    pub fn delete_project(&self, project_id: i64) -> Result<(), CasebookError> {
        self.tracker.begin();
        let mut first_failure: Option<CasebookError> = None;

        let mut note = |table: &str, result: Result<usize, CasebookError>| match result {
            Ok(rows) => debug!(project_id, table, rows, "Cascade delete step"),
            Err(e) => {
                warn!(project_id, table, error = %e, "Cascade delete step failed");
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        };

        note("blobs", self.blobs.delete_for_project(project_id));
        note("messages", self.messages.delete_for_project(project_id));
        note("sessions", self.sessions.delete_for_project(project_id));
        note("projects", self.projects.delete(project_id));

        {
            let mut state = self.state()?;
            if state.active_project == Some(project_id) {
                state.clear_active();
            }
        }

        match first_failure {
            Some(e) => {
                self.tracker.fail();
                Err(e)
            }
            None => {
                self.tracker.succeed(SyncStatus::Synced);
                Ok(())
            }
        }
    }

    // -- Session operations --

    /// Create a session under a project (name defaults to the current
    /// time), uncommitted, and make it active.
    pub fn create_session(
        &self,
        project_id: i64,
        name: Option<&str>,
    ) -> Result<Session, CasebookError> {
        self.tracker.begin();
        let name = match name {
            Some(n) => n.to_string(),
            None => default_session_name(),
        };

        let session = match self.sessions.insert(project_id, &name, now_ms()) {
            Ok(session) => session,
            Err(e) => {
                self.tracker.fail();
                return Err(e);
            }
        };

        {
            let mut state = self.state()?;
            state.activate(project_id, session.id, Vec::new());
        }
        self.flush_queued_blobs(project_id, session.id);

        self.tracker.succeed(SyncStatus::Volatile);
        Ok(session)
    }

    /// A project's sessions. Finding the list empty unconditionally
    /// provisions one session, so a project in active use is never
    /// session-less. A rare duplicate from a racing explicit create is
    /// accepted instead of cross-call locking.
    pub fn sessions(&self, project_id: i64) -> Result<Vec<Session>, CasebookError> {
        let listed = self.sessions.list_for_project(project_id)?;
        if !listed.is_empty() {
            return Ok(listed);
        }

        debug!(project_id, "Project has no sessions; auto-provisioning one");
        let session = self.create_session(project_id, None)?;
        Ok(vec![session])
    }

    /// Make a session active and load its messages into the cache.
    pub fn load_session(&self, session_id: i64) -> Result<Vec<Message>, CasebookError> {
        self.tracker.begin();
        let result = (|| {
            let session = self.sessions.find_by_id(session_id)?.ok_or_else(|| {
                CasebookError::Storage(format!("session {} not found", session_id))
            })?;
            let messages = self.messages.list_for_session(session_id)?;
            Ok((session, messages))
        })();

        let (session, messages) = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                self.tracker.fail();
                return Err(e);
            }
        };

        {
            let mut state = self.state()?;
            state.activate(session.project_id, session.id, messages.clone());
        }
        self.flush_queued_blobs(session.project_id, session.id);

        // A session with recorded turns is fully reflected by the store; an
        // empty uncommitted one is still volatile.
        if messages.is_empty() && !session.committed {
            self.tracker.succeed(SyncStatus::Volatile);
        } else {
            self.tracker.succeed(SyncStatus::Synced);
        }
        Ok(messages)
    }

    /// Mark a session committed. Touches no messages or blobs and is
    /// idempotent. A missing session (already deleted) or a failed write
    /// resolves silently into `Error` status rather than an error return.
    pub fn commit_session(&self, session_id: i64) {
        self.tracker.begin();
        match self.sessions.set_committed(session_id) {
            Ok(0) => {
                warn!(session_id, "Commit requested for a session that no longer exists");
                self.tracker.fail();
            }
            Ok(_) => self.tracker.succeed(SyncStatus::Synced),
            Err(e) => {
                warn!(session_id, error = %e, "Failed to commit session");
                self.tracker.fail();
            }
        }
    }

    /// Pre-flight for the send path: resolve the active project/session
    /// pair, creating either as needed, and return the ids. Completes fully
    /// before any message is recorded.
    pub fn ensure_active_session(&self, fallback_name: &str) -> Result<(i64, i64), CasebookError> {
        match self.active() {
            (Some(project_id), Some(session_id)) => Ok((project_id, session_id)),
            (Some(project_id), None) => {
                let session = self.create_session(project_id, None)?;
                Ok((project_id, session.id))
            }
            _ => {
                let project = self.create_project(Some(fallback_name))?;
                let (_, session_id) = self.active();
                let session_id = session_id.ok_or_else(|| {
                    CasebookError::Storage("project created without a session".to_string())
                })?;
                Ok((project.id, session_id))
            }
        }
    }

    // -- Message and blob writes --

    /// Persist one immutable turn and advance the project's and session's
    /// last-activity timestamps in the same logical step. The message
    /// timestamp equals the refreshed `last_message_at`.
    pub fn record_message(
        &self,
        project_id: i64,
        session_id: i64,
        role: MessageRole,
        content: &str,
        attachments: &[Attachment],
        grounding: Option<&Grounding>,
    ) -> Result<Message, CasebookError> {
        self.tracker.begin();
        let now = now_ms();
        let result = (|| {
            let message = self.messages.insert(NewMessage {
                project_id,
                session_id,
                role,
                content,
                timestamp: now,
                attachments,
                grounding,
            })?;
            self.projects.touch(project_id, now)?;
            self.sessions.touch(session_id, now)?;
            Ok(message)
        })();

        match result {
            Ok(message) => {
                let mut state = self.state()?;
                if state.active_session == Some(session_id) {
                    state.messages.push(message.clone());
                }
                drop(state);
                self.tracker.succeed(SyncStatus::Volatile);
                Ok(message)
            }
            Err(e) => {
                self.tracker.fail();
                Err(e)
            }
        }
    }

    /// Durably store one ingested attachment. With an active session the
    /// blob is written immediately under that project/session pair; without
    /// one it is queued and flushed on the next activation. Returns whether
    /// a blob row was written now.
    pub fn store_attachment_blob(&self, attachment: &Attachment) -> Result<bool, CasebookError> {
        let (project_id, session_id) = self.active();
        match (project_id, session_id) {
            (Some(project_id), Some(session_id)) => {
                self.tracker.begin();
                match self.blobs.insert(project_id, session_id, attachment, now_ms()) {
                    Ok(_) => {
                        self.tracker.succeed(SyncStatus::Volatile);
                        Ok(true)
                    }
                    Err(e) => {
                        self.tracker.fail();
                        Err(e)
                    }
                }
            }
            _ => {
                debug!(name = %attachment.name, "No active session; queueing blob");
                self.state()?.queued_blobs.push(attachment.clone());
                Ok(false)
            }
        }
    }

    /// Add an attachment to the pending list the UI displays.
    pub fn push_pending(&self, attachment: Attachment) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_attachments.push(attachment);
        }
    }

    /// Drop all pending attachments (after a turn resolves, either way).
    pub fn clear_pending(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_attachments.clear();
        }
    }

    /// Record that the most recent logical operation failed after its
    /// writes succeeded (e.g. the collaborator call behind a turn).
    pub fn report_sync_error(&self) {
        self.tracker.fail();
    }

    // -- Internals --

    fn state(&self) -> Result<MutexGuard<'_, WorkspaceState>, CasebookError> {
        self.state
            .lock()
            .map_err(|e| CasebookError::Storage(format!("workspace state lock poisoned: {}", e)))
    }

    /// Write out any blobs queued while no session was active. Failures are
    /// logged and surfaced as `Error` status; the activation itself stands.
    fn flush_queued_blobs(&self, project_id: i64, session_id: i64) {
        let queued = match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.queued_blobs),
            Err(_) => return,
        };
        if queued.is_empty() {
            return;
        }

        debug!(count = queued.len(), project_id, session_id, "Flushing queued blobs");
        for attachment in &queued {
            if let Err(e) = self.blobs.insert(project_id, session_id, attachment, now_ms()) {
                warn!(name = %attachment.name, error = %e, "Failed to flush queued blob");
                self.tracker.fail();
            }
        }
    }
}

/// Default project name, derived from the current date and time.
fn default_project_name() -> String {
    format!("Estimate {}", Local::now().format("%Y-%m-%d %H:%M"))
}

/// Default session name, derived from the current time.
fn default_session_name() -> String {
    format!("Session {}", Local::now().format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_manager() -> (Arc<Database>, WorkspaceManager) {
        let db = Arc::new(Database::in_memory().unwrap());
        let manager = WorkspaceManager::new(Arc::clone(&db));
        (db, manager)
    }

    fn make_attachment(name: &str) -> Attachment {
        Attachment {
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            data: "JVBERi0xLjQ=".to_string(),
            size_bytes: 9,
        }
    }

    fn table_count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| CasebookError::Storage(e.to_string()))
        })
        .unwrap()
    }

    // ---- Project creation ----

    #[test]
    fn test_create_project_provisions_initial_session() {
        let (db, manager) = make_manager();
        let project = manager.create_project(Some("Warehouse refit")).unwrap();

        assert_eq!(table_count(&db, "projects"), 1);
        assert_eq!(table_count(&db, "sessions"), 1);

        let (active_project, active_session) = manager.active();
        assert_eq!(active_project, Some(project.id));
        assert!(active_session.is_some());
        assert_eq!(manager.status(), SyncStatus::Volatile);
    }

    #[test]
    fn test_create_project_default_name_has_date() {
        let (_db, manager) = make_manager();
        let project = manager.create_project(None).unwrap();
        assert!(project.name.starts_with("Estimate "));
        let year = Local::now().format("%Y").to_string();
        assert!(project.name.contains(&year));
    }

    // ---- Project listing ----

    #[test]
    fn test_list_projects_recency_and_selection() {
        let (_db, manager) = make_manager();
        manager.create_project(Some("first")).unwrap();
        let second = manager.create_project(Some("second")).unwrap();

        // Simulate a fresh load with nothing selected.
        manager.state().unwrap().clear_active();

        let listed = manager.list_projects().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);

        // Most recently active project becomes current.
        let (active_project, _) = manager.active();
        assert_eq!(active_project, Some(second.id));
        assert_eq!(manager.status(), SyncStatus::Synced);
    }

    #[test]
    fn test_list_projects_empty_store_creates_nothing() {
        let (db, manager) = make_manager();
        let listed = manager.list_projects().unwrap();
        assert!(listed.is_empty());
        assert_eq!(table_count(&db, "projects"), 0);
        assert_eq!(manager.active(), (None, None));
    }

    // ---- Auto-provisioning ----

    #[test]
    fn test_session_list_auto_provisions_exactly_one() {
        let (db, manager) = make_manager();

        // A project with zero sessions (created behind the manager's back).
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (name, created_at, last_message_at) VALUES ('bare', 1, 1)",
                [],
            )
            .map_err(|e| CasebookError::Storage(e.to_string()))?;
            Ok(())
        })
        .unwrap();

        let sessions = manager.sessions(1).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].committed);
        assert_eq!(table_count(&db, "sessions"), 1);

        // A second listing reuses the provisioned session.
        let again = manager.sessions(1).unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id, sessions[0].id);
    }

    // ---- Commit ----

    #[test]
    fn test_commit_session_idempotent() {
        let (db, manager) = make_manager();
        manager.create_project(Some("p")).unwrap();
        let (_, session_id) = manager.active();
        let session_id = session_id.unwrap();

        let msg = manager
            .record_message(1, session_id, MessageRole::User, "turn", &[], None)
            .unwrap();

        manager.commit_session(session_id);
        assert_eq!(manager.status(), SyncStatus::Synced);
        manager.commit_session(session_id);
        assert_eq!(manager.status(), SyncStatus::Synced);

        let committed: i64 = db
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT committed FROM sessions WHERE id = ?1",
                    rusqlite::params![session_id],
                    |row| row.get(0),
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(committed, 1);

        // Messages are untouched by commit.
        assert_eq!(table_count(&db, "messages"), 1);
        let messages = manager.load_session(session_id).unwrap();
        assert_eq!(messages[0], msg);
    }

    #[test]
    fn test_commit_missing_session_fails_silently() {
        let (_db, manager) = make_manager();
        manager.commit_session(404);
        assert_eq!(manager.status(), SyncStatus::Error);
    }

    // ---- Cascade delete ----

    #[test]
    fn test_delete_project_cascades_all_tables() {
        let (db, manager) = make_manager();
        let project = manager.create_project(Some("doomed")).unwrap();
        let (_, session_id) = manager.active();
        let session_id = session_id.unwrap();

        manager
            .record_message(
                project.id,
                session_id,
                MessageRole::User,
                "turn",
                &[make_attachment("plan.pdf")],
                None,
            )
            .unwrap();
        manager.store_attachment_blob(&make_attachment("plan.pdf")).unwrap();

        // A survivor project to prove scoping.
        let survivor = manager.create_project(Some("kept")).unwrap();
        let (_, survivor_session) = manager.active();
        manager
            .record_message(
                survivor.id,
                survivor_session.unwrap(),
                MessageRole::User,
                "other",
                &[],
                None,
            )
            .unwrap();

        manager.delete_project(project.id).unwrap();

        for table in ["sessions", "messages", "blobs"] {
            let remaining: i64 = db
                .with_conn(|conn| {
                    conn.query_row(
                        &format!("SELECT COUNT(*) FROM {} WHERE project_id = ?1", table),
                        rusqlite::params![project.id],
                        |row| row.get(0),
                    )
                    .map_err(|e| CasebookError::Storage(e.to_string()))
                })
                .unwrap();
            assert_eq!(remaining, 0, "table {} should be empty for the project", table);
        }
        assert_eq!(table_count(&db, "projects"), 1);
        assert_eq!(table_count(&db, "messages"), 1);
    }

    #[test]
    fn test_delete_project_best_effort_when_one_table_fails() {
        let (db, manager) = make_manager();
        let project = manager.create_project(Some("doomed")).unwrap();
        let (_, session_id) = manager.active();
        manager
            .record_message(project.id, session_id.unwrap(), MessageRole::User, "x", &[], None)
            .unwrap();

        // Force the blobs delete to fail.
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE blobs;")
                .map_err(|e| CasebookError::Storage(e.to_string()))
        })
        .unwrap();

        let result = manager.delete_project(project.id);
        assert!(result.is_err());
        assert_eq!(manager.status(), SyncStatus::Error);

        // The other three deletes still went through.
        assert_eq!(table_count(&db, "projects"), 0);
        assert_eq!(table_count(&db, "sessions"), 0);
        assert_eq!(table_count(&db, "messages"), 0);
    }

    #[test]
    fn test_delete_active_project_clears_selection() {
        let (_db, manager) = make_manager();
        let project = manager.create_project(Some("active")).unwrap();
        manager.delete_project(project.id).unwrap();
        assert_eq!(manager.active(), (None, None));
        assert!(manager.cached_messages().is_empty());
    }

    #[test]
    fn test_delete_inactive_project_keeps_selection() {
        let (_db, manager) = make_manager();
        let first = manager.create_project(Some("first")).unwrap();
        let second = manager.create_project(Some("second")).unwrap();

        manager.delete_project(first.id).unwrap();

        let (active_project, _) = manager.active();
        assert_eq!(active_project, Some(second.id));
    }

    // ---- Session loading ----

    #[test]
    fn test_load_session_with_messages_is_synced() {
        let (_db, manager) = make_manager();
        let project = manager.create_project(Some("p")).unwrap();
        let (_, session_id) = manager.active();
        let session_id = session_id.unwrap();
        manager
            .record_message(project.id, session_id, MessageRole::User, "hello", &[], None)
            .unwrap();

        let messages = manager.load_session(session_id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(manager.status(), SyncStatus::Synced);
        assert_eq!(manager.cached_messages().len(), 1);
    }

    #[test]
    fn test_load_empty_session_is_volatile() {
        let (_db, manager) = make_manager();
        manager.create_project(Some("p")).unwrap();
        let (_, session_id) = manager.active();

        manager.load_session(session_id.unwrap()).unwrap();
        assert_eq!(manager.status(), SyncStatus::Volatile);
    }

    #[test]
    fn test_load_missing_session_errors() {
        let (_db, manager) = make_manager();
        assert!(manager.load_session(999).is_err());
        assert_eq!(manager.status(), SyncStatus::Error);
    }

    // ---- ensure_active_session ----

    #[test]
    fn test_ensure_active_session_creates_from_nothing() {
        let (db, manager) = make_manager();
        let (project_id, session_id) = manager.ensure_active_session("Concrete for slab").unwrap();

        assert_eq!(manager.active(), (Some(project_id), Some(session_id)));
        assert_eq!(table_count(&db, "projects"), 1);
        assert_eq!(table_count(&db, "sessions"), 1);

        let project = ProjectRepository::new(db).find_by_id(project_id).unwrap().unwrap();
        assert_eq!(project.name, "Concrete for slab");
    }

    #[test]
    fn test_ensure_active_session_reuses_active_pair() {
        let (db, manager) = make_manager();
        let project = manager.create_project(Some("p")).unwrap();
        let (_, session_id) = manager.active();

        let resolved = manager.ensure_active_session("ignored").unwrap();
        assert_eq!(resolved, (project.id, session_id.unwrap()));
        assert_eq!(table_count(&db, "projects"), 1);
        assert_eq!(table_count(&db, "sessions"), 1);
    }

    // ---- Messages and timestamps ----

    #[test]
    fn test_record_message_touches_parents() {
        let (_db, manager) = make_manager();
        let project = manager.create_project(Some("p")).unwrap();
        let (_, session_id) = manager.active();
        let session_id = session_id.unwrap();

        let message = manager
            .record_message(project.id, session_id, MessageRole::Assistant, "reply", &[], None)
            .unwrap();

        let listed = manager.list_projects().unwrap();
        assert_eq!(listed[0].last_message_at, message.timestamp);
        assert_eq!(manager.cached_messages().last().unwrap().id, message.id);
    }

    // ---- Blob queueing ----

    #[test]
    fn test_blob_queued_without_session_then_flushed() {
        let (db, manager) = make_manager();

        let wrote_now = manager.store_attachment_blob(&make_attachment("early.pdf")).unwrap();
        assert!(!wrote_now);
        assert_eq!(table_count(&db, "blobs"), 0);

        // Activating a session flushes the queue.
        let project = manager.create_project(Some("p")).unwrap();
        assert_eq!(table_count(&db, "blobs"), 1);

        let (_, session_id) = manager.active();
        let blobs = BlobRepository::new(db).list_for_session(session_id.unwrap()).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].project_id, project.id);
        assert_eq!(blobs[0].name, "early.pdf");
    }

    #[test]
    fn test_blob_written_immediately_with_active_session() {
        let (db, manager) = make_manager();
        manager.create_project(Some("p")).unwrap();

        let wrote_now = manager.store_attachment_blob(&make_attachment("now.pdf")).unwrap();
        assert!(wrote_now);
        assert_eq!(table_count(&db, "blobs"), 1);
        assert_eq!(manager.status(), SyncStatus::Volatile);
    }
}
