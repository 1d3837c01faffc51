//! Sync status tracking.
//!
//! A small observational state machine: every mutating operation sets
//! `Syncing` before issuing its writes and resolves to `Synced`, `Volatile`,
//! or `Error`. It never retries and never blocks further operations — a
//! caller in `Error` state may still attempt new writes.

use std::sync::Mutex;

use casebook_core::types::SyncStatus;

/// Tracks the durability state of the most recent mutation.
#[derive(Debug, Default)]
pub struct SyncTracker {
    status: Mutex<SyncStatus>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently observed status.
    pub fn current(&self) -> SyncStatus {
        self.status.lock().map(|s| *s).unwrap_or(SyncStatus::Error)
    }

    /// Mark a write as in flight.
    pub fn begin(&self) {
        self.set(SyncStatus::Syncing);
    }

    /// Resolve the in-flight write. `Volatile` for committed-eligible data
    /// (messages, attachments, fresh sessions), `Synced` when the store
    /// matches the visible state.
    pub fn succeed(&self, status: SyncStatus) {
        self.set(status);
    }

    /// The most recent write failed; prior data is untouched.
    pub fn fail(&self) {
        self.set(SyncStatus::Error);
    }

    fn set(&self, status: SyncStatus) {
        if let Ok(mut current) = self.status.lock() {
            *current = status;
        }
    }
}
