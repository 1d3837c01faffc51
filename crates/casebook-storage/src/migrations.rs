//! Database schema migrations.
//!
//! Applies the initial schema: the projects, sessions, messages, and blobs
//! tables plus the schema_migrations tracking table. Secondary indexes cover
//! the ordered range scans the workspace needs: per-parent listing by
//! timestamp and project listing by recency.

use rusqlite::Connection;
use tracing::info;

use casebook_core::error::CasebookError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), CasebookError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| CasebookError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| CasebookError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
///
/// All timestamps are epoch milliseconds. Embedded documents (attachment
/// lists, grounding metadata) are JSON text.
fn apply_v1(conn: &Connection) -> Result<(), CasebookError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS projects (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            created_at      INTEGER NOT NULL,
            last_message_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_projects_last_message
            ON projects (last_message_at DESC);

        CREATE TABLE IF NOT EXISTS sessions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL,
            name            TEXT NOT NULL,
            created_at      INTEGER NOT NULL,
            last_active_at  INTEGER NOT NULL,
            committed       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_project
            ON sessions (project_id, last_active_at DESC);

        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL,
            session_id      INTEGER NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('user', 'assistant')),
            content         TEXT NOT NULL DEFAULT '',
            timestamp       INTEGER NOT NULL,
            attachments     TEXT NOT NULL DEFAULT '[]',
            grounding       TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_messages_project
            ON messages (project_id, timestamp ASC);

        CREATE INDEX IF NOT EXISTS idx_messages_session
            ON messages (session_id, timestamp ASC);

        CREATE INDEX IF NOT EXISTS idx_messages_role
            ON messages (role);

        CREATE TABLE IF NOT EXISTS blobs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id      INTEGER NOT NULL,
            session_id      INTEGER NOT NULL,
            name            TEXT NOT NULL,
            mime_type       TEXT NOT NULL DEFAULT 'application/octet-stream',
            data            TEXT NOT NULL,
            timestamp       INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_blobs_project
            ON blobs (project_id, timestamp ASC);

        CREATE INDEX IF NOT EXISTS idx_blobs_session
            ON blobs (session_id, timestamp ASC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| CasebookError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_all_tables_exist() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        for table in ["projects", "sessions", "messages", "blobs"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "table {} should exist and be empty", table);
        }
    }

    #[test]
    fn test_ids_autoincrement() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO projects (name, created_at, last_message_at) VALUES ('a', 1, 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO projects (name, created_at, last_message_at) VALUES ('b', 2, 2)",
            [],
        )
        .unwrap();

        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM projects ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_messages_role_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO messages (project_id, session_id, role, content, timestamp)
             VALUES (1, 1, 'system', 'bad', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sessions_default_uncommitted() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO sessions (project_id, name, created_at, last_active_at)
             VALUES (1, 'Session 1', 0, 0)",
            [],
        )
        .unwrap();

        let committed: i64 = conn
            .query_row("SELECT committed FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(committed, 0);
    }

    #[test]
    fn test_blobs_default_mime_type() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO blobs (project_id, session_id, name, data, timestamp)
             VALUES (1, 1, 'upload.bin', 'AAAA', 0)",
            [],
        )
        .unwrap();

        let mime: String = conn
            .query_row("SELECT mime_type FROM blobs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mime, "application/octet-stream");
    }
}
