//! Pure membership transitions.
//!
//! Every function maps a freshly read record to the next record, or `None` when
//! the operation's postcondition already holds. Retrying any of them against a
//! newer snapshot is always safe: set inserts are no-ops when the id is present.

use crate::{
    error::LotteryError,
    event::{EventPatch, EventRecord},
    types::EntrantId,
};

use super::draw::{DrawEngine, DrawLimit};

/// Adds to `waiting`; drops the entrant from every other set.
pub fn join(rec: &EventRecord, entrant: &str) -> Option<EventRecord> {
    let mut next = rec.clone();
    next.members.waiting.insert(entrant);
    next.members.chosen.remove(entrant);
    next.members.signed_up.remove(entrant);
    next.members.cancelled.remove(entrant);
    finish(rec, next)
}

/// Removes from `waiting` only.
pub fn leave(rec: &EventRecord, entrant: &str) -> Option<EventRecord> {
    let mut next = rec.clone();
    next.members.waiting.remove(entrant);
    finish(rec, next)
}

/// Moves the entrant to `signed_up`, whether or not they were drawn.
///
/// Fails with [`LotteryError::EventFull`] when the entrant is not already
/// signed up and no seat is left.
pub fn sign_up(rec: &EventRecord, entrant: &str) -> Result<Option<EventRecord>, LotteryError> {
    if !rec.members.signed_up.contains(entrant) && rec.members.is_full(rec.capacity) {
        return Err(LotteryError::EventFull(rec.id.clone()));
    }

    let mut next = rec.clone();
    next.members.signed_up.insert(entrant);
    next.members.chosen.remove(entrant);
    next.members.waiting.remove(entrant);
    next.members.cancelled.remove(entrant);
    Ok(finish(rec, next))
}

/// Moves the entrant to `cancelled`, releasing a chosen or signed-up seat.
pub fn decline(rec: &EventRecord, entrant: &str) -> Option<EventRecord> {
    let mut next = rec.clone();
    next.members.chosen.remove(entrant);
    next.members.signed_up.remove(entrant);
    next.members.waiting.remove(entrant);
    next.members.cancelled.insert(entrant);
    finish(rec, next)
}

/// Result of computing a draw against one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawComputation {
    /// Entrants appended to `chosen`, in draw order.
    pub winners: Vec<EntrantId>,
    /// Next record, or `None` when nobody was drawn.
    pub next: Option<EventRecord>,
}

/// Samples winners from the eligible waiting pool and appends them to `chosen`.
///
/// Winners stay in `waiting` until they sign up or decline.
pub fn draw_winners(rec: &EventRecord, limit: DrawLimit, engine: &DrawEngine) -> DrawComputation {
    let pool = rec.members.eligible_pool();
    let k = limit.resolve(rec.members.remaining_seats(rec.capacity), pool.len());
    if k == 0 {
        return DrawComputation {
            winners: Vec::new(),
            next: None,
        };
    }

    let winners = engine.sample(pool, i64::try_from(k).unwrap_or(i64::MAX));
    let mut next = rec.clone();
    for id in &winners {
        next.members.chosen.insert(id);
    }

    DrawComputation {
        next: finish(rec, next),
        winners,
    }
}

/// Validates a requested capacity.
pub fn checked_capacity(capacity: i64) -> Result<u32, LotteryError> {
    u32::try_from(capacity).map_err(|_| {
        LotteryError::InvalidArgument(format!(
            "capacity {capacity} must be within 0..={}",
            u32::MAX
        ))
    })
}

/// Applies a settings patch, refusing a capacity below the current sign-ups.
pub fn apply_patch(
    rec: &EventRecord,
    patch: &EventPatch,
) -> Result<Option<EventRecord>, LotteryError> {
    let capacity = patch.capacity.map(checked_capacity).transpose()?;
    if let Some(cap) = capacity {
        if cap > 0 && (cap as usize) < rec.members.signed_up.len() {
            return Err(LotteryError::InvalidArgument(format!(
                "capacity {cap} is below {} signed-up entrants",
                rec.members.signed_up.len()
            )));
        }
    }
    if let Some(Some(window)) = patch.register_window {
        if window.is_inverted() {
            return Err(LotteryError::InvalidArgument(
                "register window ends before it starts".to_string(),
            ));
        }
    }

    let mut next = rec.clone();
    patch.apply_to(&mut next, capacity);
    Ok(finish(rec, next))
}

fn finish(prev: &EventRecord, mut next: EventRecord) -> Option<EventRecord> {
    next.full = next.members.is_full(next.capacity);
    if next == *prev { None } else { Some(next) }
}
