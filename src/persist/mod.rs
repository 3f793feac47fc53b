/// In-memory compare-and-commit store.
pub mod memory;
/// SQLite-backed compare-and-commit store.
pub mod sqlite;

use thiserror::Error;

use crate::{
    event::EventRecord,
    op::{JournalEntry, TransitionOp},
    types::{EventId, Version},
};

/// Failures reported by an [`EventStore`] adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record changed since it was read; the commit was rejected.
    #[error("write conflict on {event_id}: expected version {expected}, found {actual}")]
    Conflict {
        /// Conflicting event.
        event_id: EventId,
        /// Version the writer read.
        expected: Version,
        /// Version currently stored.
        actual: Version,
    },
    /// No record with this id.
    #[error("event not found: {0}")]
    NotFound(EventId),
    /// A record with this id already exists.
    #[error("event already exists: {0}")]
    AlreadyExists(EventId),
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The backend did not answer in time.
    #[error("store timed out: {0}")]
    Timeout(String),
    /// SQLite failure.
    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
    /// Payload encoding failure.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// Stored payload could not be interpreted.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::Timeout(value.to_string())
            }
            Some(ErrorCode::CannotOpen) => Self::Unavailable(value.to_string()),
            _ => Self::Sqlite(value),
        }
    }
}

/// Result alias for adapter calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// A record together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    /// Version to pass back to [`EventStore::commit`].
    pub version: Version,
    /// Record contents.
    pub record: EventRecord,
}

/// Single-document transactional store.
///
/// `load` plus `commit` form the optimistic transaction primitive: a commit
/// succeeds only if the stored version still equals the version read, and the
/// record write and its journal entry become visible together or not at all.
/// [`crate::core::txn::run_transaction`] builds the retrying read-compute-commit
/// loop on top of it.
pub trait EventStore: Send + Sync {
    /// Reads the current record and version, or `None` when absent.
    fn load(&self, event_id: &str) -> StoreResult<Option<Versioned>>;

    /// Inserts a new record at version 1, journaling [`TransitionOp::Create`].
    fn create(&self, record: &EventRecord) -> StoreResult<Version>;

    /// Replaces the record if its version is still `expected`.
    ///
    /// Returns the new version, or [`StoreError::Conflict`] when another
    /// writer committed first.
    fn commit(
        &self,
        event_id: &str,
        expected: Version,
        record: &EventRecord,
        op: &TransitionOp,
    ) -> StoreResult<Version>;

    /// Reads every record, ordered by event id.
    fn list(&self) -> StoreResult<Vec<Versioned>>;

    /// Reads the committed journal of one event, oldest first.
    ///
    /// Fails with [`StoreError::NotFound`] when the event does not exist.
    fn journal(&self, event_id: &str) -> StoreResult<Vec<JournalEntry>>;
}
