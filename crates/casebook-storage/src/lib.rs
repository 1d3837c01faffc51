//! Casebook storage crate - SQLite persistence for the chat workspace.
//!
//! Provides a WAL-mode SQLite database with migrations and repository
//! implementations for the four record tables: projects, sessions,
//! messages, and blobs. Each table write is independently atomic; there are
//! no cross-table transactions, by design (cascade delete is best-effort).

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{BlobRepository, MessageRepository, ProjectRepository, SessionRepository};
