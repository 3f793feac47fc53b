//! Journaled transition model and persistence wrappers.

use serde::{Deserialize, Serialize};

use crate::{
    event::EventPatch,
    types::{EntrantId, JournalSeq, TimestampMs},
};

/// Version number for serialized [`JournalEnvelope`] payloads.
pub const JOURNAL_FORMAT_VERSION: u16 = 1;

/// Committed change to one event, appended to its journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOp {
    /// The event record was created.
    Create,
    /// Entrant joined the waiting list.
    Join {
        /// Joining entrant.
        entrant: EntrantId,
    },
    /// Entrant left the waiting list.
    Leave {
        /// Leaving entrant.
        entrant: EntrantId,
    },
    /// Entrant accepted a seat.
    SignUp {
        /// Accepting entrant.
        entrant: EntrantId,
    },
    /// Entrant declined a seat.
    Decline {
        /// Declining entrant.
        entrant: EntrantId,
    },
    /// Winners were drawn into `chosen`.
    Draw {
        /// Drawn entrants in draw order.
        winners: Vec<EntrantId>,
        /// Seed the sampler ran with.
        seed: u64,
    },
    /// Event settings were patched.
    Update {
        /// Applied patch.
        patch: EventPatch,
    },
}

impl TransitionOp {
    /// Short stable name, used as the journal `kind` column.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::SignUp { .. } => "sign_up",
            Self::Decline { .. } => "decline",
            Self::Draw { .. } => "draw",
            Self::Update { .. } => "update",
        }
    }
}

/// Journal row metadata plus operation payload.
///
/// `seq` equals the record version the commit produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Per-event sequence.
    pub seq: JournalSeq,
    /// Commit timestamp in milliseconds.
    pub ts_ms: TimestampMs,
    /// Operation body.
    pub op: TransitionOp,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped entry.
    pub entry: JournalEntry,
}

impl JournalEnvelope {
    /// Constructs an envelope using [`JOURNAL_FORMAT_VERSION`].
    pub fn new(entry: JournalEntry) -> Self {
        Self {
            format_version: JOURNAL_FORMAT_VERSION,
            entry,
        }
    }
}
