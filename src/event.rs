//! Event record, creation draft, settings patch, and registration window.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    core::membership::MembershipSets,
    types::{EventId, TimestampMs},
};

/// Half-open `[start, end)` interval during which sign-up is offered.
///
/// A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterWindow {
    /// First millisecond at which sign-up opens.
    pub start_ms: Option<TimestampMs>,
    /// First millisecond at which sign-up is closed again.
    pub end_ms: Option<TimestampMs>,
}

impl RegisterWindow {
    /// Window bounded on both sides.
    pub fn between(start_ms: TimestampMs, end_ms: TimestampMs) -> Self {
        Self {
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
        }
    }

    /// Returns true when `now_ms` lies inside the window.
    pub fn contains(&self, now_ms: TimestampMs) -> bool {
        self.start_ms.is_none_or(|start| now_ms >= start)
            && self.end_ms.is_none_or(|end| now_ms < end)
    }

    /// Returns true when the bounds describe an empty or inverted range.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start_ms, self.end_ms), (Some(s), Some(e)) if e <= s)
    }
}

/// Authoritative event document as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Stable event identifier.
    pub id: EventId,
    /// Display title, carried for downstream notifiers.
    pub title: String,
    /// Identifier of the organizer who created the event.
    pub organizer_id: String,
    /// Maximum signed-up entrants; `0` means unlimited.
    pub capacity: u32,
    /// Optional sign-up window.
    pub register_window: Option<RegisterWindow>,
    /// Cached `capacity > 0 && |signedUp| >= capacity`.
    pub full: bool,
    /// Creation time in milliseconds since epoch.
    pub created_at_ms: TimestampMs,
    /// The four entrant sets.
    pub members: MembershipSets,
}

/// Insert payload used to create a new [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    /// Identifier to create the event under.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Creating organizer.
    pub organizer_id: String,
    /// Requested capacity; negative values are rejected.
    pub capacity: i64,
    /// Optional sign-up window.
    pub register_window: Option<RegisterWindow>,
}

/// Sparse settings patch where each `Some` field overwrites the record value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventPatch {
    /// Optional replacement title.
    pub title: Option<String>,
    /// Optional replacement capacity.
    pub capacity: Option<i64>,
    /// Optional replacement window; `Some(None)` clears it.
    ///
    /// Serialized as absent for `None` and `null` for `Some(None)`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_field"
    )]
    pub register_window: Option<Option<RegisterWindow>>,
}

/// Maps any present value, `null` included, to `Some`.
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl EventPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`. Capacity must already be validated.
    pub fn apply_to(&self, rec: &mut EventRecord, capacity: Option<u32>) {
        if let Some(v) = &self.title {
            rec.title = v.clone();
        }
        if let Some(v) = capacity {
            rec.capacity = v;
        }
        if let Some(v) = self.register_window {
            rec.register_window = v;
        }
    }
}
