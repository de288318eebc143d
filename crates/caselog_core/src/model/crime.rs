//! Crime domain model.
//!
//! # Responsibility
//! - Define the persisted record for one crime report.
//! - Provide constructors and small lifecycle helpers.
//!
//! # Invariants
//! - `id` is generated once and never changes for the record's lifetime.
//! - `timestamp_ms` carries the occurrence time as Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a crime record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CrimeId = Uuid;

/// One recorded crime report.
///
/// Identity is fixed at construction; every other field is edited in place
/// on the detail screen and flushed back through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crime {
    /// Stable global ID, maps to exactly one persisted row.
    pub id: CrimeId,
    /// Short description shown in the list view.
    pub title: String,
    /// Occurrence time in Unix epoch milliseconds.
    pub timestamp_ms: i64,
    /// Whether the case has been closed.
    pub solved: bool,
}

impl Crime {
    /// Creates a new record with a generated stable ID.
    ///
    /// # Invariants
    /// - `title` starts empty, `solved` starts `false`.
    /// - `timestamp_ms` is set to the current wall-clock time.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates a new record with a caller-provided stable ID.
    ///
    /// Used by import and test paths where identity already exists.
    pub fn with_id(id: CrimeId) -> Self {
        Self {
            id,
            title: String::new(),
            timestamp_ms: now_epoch_ms(),
            solved: false,
        }
    }

    /// Marks the case as solved.
    pub fn resolve(&mut self) {
        self.solved = true;
    }

    /// Reopens a previously solved case.
    pub fn reopen(&mut self) {
        self.solved = false;
    }
}

impl Default for Crime {
    fn default() -> Self {
        Self::new()
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// A clock set before the epoch falls back to 0 rather than failing.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
