//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use casebook_core::error::CasebookError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// The connection is wrapped in a Mutex since rusqlite Connection is not
/// Sync. There is exactly one store per device profile; all repositories
/// share this handle.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, CasebookError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| CasebookError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| CasebookError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, CasebookError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CasebookError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CasebookError::Storage(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// This is the primary way to interact with the database. The mutex is
    /// held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CasebookError>
    where
        F: FnOnce(&Connection) -> Result<T, CasebookError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CasebookError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casebook.db");
        let db = Database::open(&path).unwrap();

        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casebook.db");

        {
            let db = Database::open(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute(
                    "INSERT INTO projects (name, created_at, last_message_at)
                     VALUES ('survives reload', 1, 1)",
                    [],
                )
                .map_err(|e| CasebookError::Storage(e.to_string()))?;
                Ok(())
            })
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        db.with_conn(|conn| {
            let name: String = conn
                .query_row("SELECT name FROM projects", [], |row| row.get(0))
                .map_err(|e| CasebookError::Storage(e.to_string()))?;
            assert_eq!(name, "survives reload");
            Ok(())
        })
        .unwrap();
    }
}
