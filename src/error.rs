//! Caller-facing error type for every lottery operation.

use thiserror::Error;

use crate::{persist::StoreError, types::EventId};

/// Errors surfaced by the lottery core.
///
/// Write conflicts never appear here directly: they are retried inside the
/// transaction loop and only escape as [`LotteryError::RetryExhausted`].
#[derive(Debug, Error)]
pub enum LotteryError {
    /// The event record does not exist.
    #[error("event not found: {0}")]
    NotFound(EventId),

    /// An event with this id already exists.
    #[error("event already exists: {0}")]
    AlreadyExists(EventId),

    /// Input rejected before any store I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Sign-up refused because every seat is taken.
    #[error("event is full: {0}")]
    EventFull(EventId),

    /// The commit lost the race on every attempt.
    #[error("transaction on {event_id} still conflicting after {attempts} attempts")]
    RetryExhausted {
        /// Event whose record kept changing underneath.
        event_id: EventId,
        /// Number of read-compute-commit attempts made.
        attempts: usize,
    },

    /// The store could not be reached or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store gave up waiting on the round-trip.
    #[error("store timed out: {0}")]
    Timeout(String),

    /// A computed state broke a membership invariant and was not committed.
    #[error("membership invariant violated: {0}")]
    InvariantViolated(String),

    /// The async runtime is no longer accepting work.
    #[error("runtime channel closed")]
    ChannelClosed,
}

impl From<StoreError> for LotteryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::AlreadyExists(id) => Self::AlreadyExists(id),
            StoreError::Timeout(msg) => Self::Timeout(msg),
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            StoreError::Conflict { event_id, .. } => Self::RetryExhausted {
                event_id,
                attempts: 1,
            },
            other => Self::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_kind() {
        let err: LotteryError = StoreError::Timeout("3s".to_string()).into();
        assert!(matches!(err, LotteryError::Timeout(_)));

        let err: LotteryError = StoreError::NotFound("e1".to_string()).into();
        assert!(matches!(err, LotteryError::NotFound(id) if id == "e1"));

        let err: LotteryError = StoreError::Corrupt("bad payload".to_string()).into();
        assert!(matches!(err, LotteryError::Unavailable(msg) if msg.contains("bad payload")));
    }
}
