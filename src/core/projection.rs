use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{event::EventRecord, types::TimestampMs};

use super::membership::Membership;

/// Per-entrant status shown on event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStatus {
    /// Waiting for a draw.
    Open,
    /// Drawn or signed up.
    Selected,
    /// Declined.
    NotSelected,
}

impl DisplayStatus {
    /// Label used by UI collaborators.
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Selected => "Selected",
            Self::NotSelected => "Not Selected",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions a UI may offer the entrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Affordances {
    /// Sign-up button.
    pub can_sign_up: bool,
    /// Decline button.
    pub can_decline: bool,
    /// Leave-waitlist button.
    pub can_leave: bool,
}

/// Status plus affordances for one entrant on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Display status.
    pub status: DisplayStatus,
    /// Offerable actions.
    pub affordances: Affordances,
}

/// Derives the entrant's view of `rec` at `now_ms`; `None` for non-participants.
pub fn project(rec: &EventRecord, entrant: &str, now_ms: TimestampMs) -> Option<Projection> {
    let status = match rec.members.membership(entrant)? {
        Membership::Cancelled => DisplayStatus::NotSelected,
        Membership::Chosen | Membership::SignedUp => DisplayStatus::Selected,
        Membership::Waiting => DisplayStatus::Open,
    };

    let full = rec.full || rec.members.is_full(rec.capacity);
    let in_window = rec.register_window.is_none_or(|w| w.contains(now_ms));
    let selected = status == DisplayStatus::Selected;

    Some(Projection {
        status,
        affordances: Affordances {
            can_sign_up: selected && !full && in_window,
            can_decline: selected,
            can_leave: status == DisplayStatus::Open,
        },
    })
}
