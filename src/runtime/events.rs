//! Runtime event stream payloads.

use crate::types::{EntrantId, EventId};

/// Events broadcast after each committed, state-changing operation.
///
/// No-op calls (joining twice, leaving when absent, empty draws) emit nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LotteryEvent {
    /// An event record was created.
    Created {
        /// New event id.
        event_id: EventId,
    },
    /// Event settings changed.
    Updated {
        /// Patched event id.
        event_id: EventId,
    },
    /// An entrant joined the waiting list.
    Joined {
        /// Event id.
        event_id: EventId,
        /// Joining entrant.
        entrant_id: EntrantId,
    },
    /// An entrant left the waiting list.
    Left {
        /// Event id.
        event_id: EventId,
        /// Leaving entrant.
        entrant_id: EntrantId,
    },
    /// An entrant accepted a seat.
    SignedUp {
        /// Event id.
        event_id: EventId,
        /// Accepting entrant.
        entrant_id: EntrantId,
    },
    /// An entrant declined a seat.
    Declined {
        /// Event id.
        event_id: EventId,
        /// Declining entrant.
        entrant_id: EntrantId,
    },
    /// Winners were drawn; the payload is what a "selected" notice needs.
    WinnersDrawn {
        /// Event id.
        event_id: EventId,
        /// Event title.
        event_title: String,
        /// Organizer sending the notice.
        organizer_id: String,
        /// Drawn entrants.
        winners: Vec<EntrantId>,
    },
}
