//! Shared primitive IDs, versions, and clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::LotteryError;

/// Opaque event identifier.
pub type EventId = String;
/// Stable entrant identifier (device id, account id, ...).
pub type EntrantId = String;
/// Document version used for compare-and-commit.
pub type Version = u64;
/// Monotonic per-event journal sequence number.
pub type JournalSeq = u64;
/// Milliseconds since the Unix epoch.
pub type TimestampMs = u64;

/// Default upper bound on identifier length.
pub const DEFAULT_MAX_ID_LEN: usize = 128;

/// Rejects empty, oversized, padded, or control-character identifiers.
///
/// `kind` names the identifier in the error message ("event id", "entrant id").
pub fn validate_id(kind: &str, id: &str, max_len: usize) -> Result<(), LotteryError> {
    if id.is_empty() {
        return Err(LotteryError::InvalidArgument(format!("{kind} is empty")));
    }
    if id.len() > max_len {
        return Err(LotteryError::InvalidArgument(format!(
            "{kind} exceeds {max_len} bytes"
        )));
    }
    if id.trim() != id {
        return Err(LotteryError::InvalidArgument(format!(
            "{kind} has surrounding whitespace"
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(LotteryError::InvalidArgument(format!(
            "{kind} contains control characters"
        )));
    }
    Ok(())
}

/// Current wall-clock time in milliseconds.
pub fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
