use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::EntrantId;

use super::capacity::{self, RemainingSeats};

/// Insertion-ordered, duplicate-free list of entrant ids.
///
/// Order matters: the draw shuffles the waiting pool in this order, so equal
/// lists plus equal seeds give equal winners.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntrantList(Vec<EntrantId>);

impl EntrantList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|x| x == id)
    }

    /// Appends `id` unless already present. Returns true when the list changed.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id.to_string());
        true
    }

    /// Removes `id` if present. Returns true when the list changed.
    pub fn remove(&mut self, id: &str) -> bool {
        if let Some(pos) = self.0.iter().position(|x| x == id) {
            self.0.remove(pos);
            return true;
        }
        false
    }

    /// Number of entrants.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when there are no entrants.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EntrantId> {
        self.0.iter()
    }

    /// Borrows the ids in insertion order.
    pub fn as_slice(&self) -> &[EntrantId] {
        &self.0
    }
}

impl<S: Into<EntrantId>> FromIterator<S> for EntrantList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for id in iter {
            let id = id.into();
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
        Self(ids)
    }
}

/// Which of the four sets an entrant sits in, by display precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Membership {
    /// In the waiting pool only.
    Waiting,
    /// Drawn, awaiting a response.
    Chosen,
    /// Accepted a seat.
    SignedUp,
    /// Declined a seat.
    Cancelled,
}

/// A broken membership rule found by [`MembershipSets::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// An entrant appears in two sets that must be disjoint.
    #[error("{entrant} is in both {first} and {second}")]
    Overlap {
        /// Offending entrant.
        entrant: EntrantId,
        /// First set name.
        first: &'static str,
        /// Second set name.
        second: &'static str,
    },
    /// A set holds the same entrant twice.
    #[error("{entrant} appears more than once in {set}")]
    Duplicate {
        /// Offending entrant.
        entrant: EntrantId,
        /// Set name.
        set: &'static str,
    },
    /// More signed-up entrants than seats.
    #[error("{signed_up} signed up exceeds capacity {capacity}")]
    OverCapacity {
        /// Signed-up count.
        signed_up: usize,
        /// Configured capacity.
        capacity: u32,
    },
}

/// The four entrant sets of one event.
///
/// `signed_up` and `cancelled` are disjoint from every other set. `chosen` may
/// overlap `waiting`: drawn entrants stay listed as waiting until they respond.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MembershipSets {
    /// Entrants who joined the pool.
    pub waiting: EntrantList,
    /// Entrants drawn but not yet responded.
    pub chosen: EntrantList,
    /// Entrants who accepted.
    pub signed_up: EntrantList,
    /// Entrants who declined.
    pub cancelled: EntrantList,
}

impl MembershipSets {
    /// Returns true when `id` is in any of the four sets.
    pub fn contains(&self, id: &str) -> bool {
        self.membership(id).is_some()
    }

    /// Resolves `id` to its highest-precedence set.
    pub fn membership(&self, id: &str) -> Option<Membership> {
        if self.cancelled.contains(id) {
            Some(Membership::Cancelled)
        } else if self.signed_up.contains(id) {
            Some(Membership::SignedUp)
        } else if self.chosen.contains(id) {
            Some(Membership::Chosen)
        } else if self.waiting.contains(id) {
            Some(Membership::Waiting)
        } else {
            None
        }
    }

    /// Seats left under `capacity`.
    pub fn remaining_seats(&self, capacity: u32) -> RemainingSeats {
        capacity::remaining_seats(capacity, self.signed_up.len())
    }

    /// Returns true when every seat under `capacity` is taken.
    pub fn is_full(&self, capacity: u32) -> bool {
        capacity::is_full(capacity, self.signed_up.len())
    }

    /// Entrants excluded from a draw: anyone chosen, signed up, or cancelled.
    pub fn taken(&self) -> HashSet<&str> {
        self.chosen
            .iter()
            .chain(self.signed_up.iter())
            .chain(self.cancelled.iter())
            .map(String::as_str)
            .collect()
    }

    /// Waiting entrants eligible for a draw, in waiting-list order.
    pub fn eligible_pool(&self) -> Vec<EntrantId> {
        let taken = self.taken();
        self.waiting
            .iter()
            .filter(|id| !taken.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Checks disjointness, duplicate-freedom, and the seat limit.
    pub fn check(&self, capacity: u32) -> Result<(), InvariantViolation> {
        let sets: [(&'static str, &EntrantList); 4] = [
            ("waiting", &self.waiting),
            ("chosen", &self.chosen),
            ("signedUp", &self.signed_up),
            ("cancelled", &self.cancelled),
        ];

        let mut indexed: Vec<(&'static str, &EntrantList, HashSet<&str>)> = Vec::with_capacity(4);
        for (name, list) in sets {
            let mut seen = HashSet::with_capacity(list.len());
            for id in list.iter() {
                if !seen.insert(id.as_str()) {
                    return Err(InvariantViolation::Duplicate {
                        entrant: id.clone(),
                        set: name,
                    });
                }
            }
            indexed.push((name, list, seen));
        }

        for (i, (first, a, _)) in indexed.iter().enumerate() {
            for (second, _, b) in indexed.iter().skip(i + 1) {
                // Drawn entrants remain waiting until they respond.
                if *first == "waiting" && *second == "chosen" {
                    continue;
                }
                if let Some(id) = a.iter().find(|id| b.contains(id.as_str())) {
                    return Err(InvariantViolation::Overlap {
                        entrant: id.clone(),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }

        if capacity > 0 && self.signed_up.len() > capacity as usize {
            return Err(InvariantViolation::OverCapacity {
                signed_up: self.signed_up.len(),
                capacity,
            });
        }

        Ok(())
    }
}
