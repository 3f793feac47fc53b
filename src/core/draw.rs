use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::types::EntrantId;

use super::capacity::RemainingSeats;

static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// How many winners an organizer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawLimit {
    /// Draw as many as there are remaining seats.
    Fill,
    /// Draw at most this many, still capped by remaining seats.
    AtMost(usize),
}

impl DrawLimit {
    /// Maps the organizer's `max_to_draw`; zero or negative means fill.
    pub fn from_requested(max_to_draw: i64) -> Self {
        if max_to_draw <= 0 {
            Self::Fill
        } else {
            Self::AtMost(usize::try_from(max_to_draw).unwrap_or(usize::MAX))
        }
    }

    /// Number of winners to draw given the seats left and the eligible pool size.
    pub fn resolve(self, seats: RemainingSeats, pool_len: usize) -> usize {
        let wanted = match self {
            Self::Fill => pool_len,
            Self::AtMost(n) => n.min(pool_len),
        };
        seats.cap(wanted)
    }
}

/// Seeded uniform sampler without replacement.
///
/// Shuffles the whole pool with a seeded RNG and keeps the first `k`, so every
/// subset of size `k` is equally likely and a fixed seed over a fixed pool
/// order always yields the same winners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawEngine {
    seed: u64,
}

impl DrawEngine {
    /// Engine with an explicit seed.
    pub fn seeded(seed: u64) -> Self {
        Self { seed }
    }

    /// Engine seeded from the wall clock mixed with a process-wide counter.
    ///
    /// Fair, not unguessable.
    pub fn from_clock() -> Self {
        Self::seeded(clock_seed())
    }

    /// Seed this engine samples with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns `min(k, pool.len())` distinct entrants; negative `k` draws none.
    pub fn sample(&self, mut pool: Vec<EntrantId>, k: i64) -> Vec<EntrantId> {
        let k = usize::try_from(k).unwrap_or(0).min(pool.len());
        let mut rng = StdRng::seed_from_u64(self.seed);
        pool.shuffle(&mut rng);
        pool.truncate(k);
        pool
    }
}

/// Draws up to `k` winners from `waiting`, skipping anyone in `taken`.
pub fn sample_winners(
    waiting: &[EntrantId],
    taken: impl Fn(&str) -> bool,
    k: i64,
    seed: u64,
) -> Vec<EntrantId> {
    let pool = waiting
        .iter()
        .filter(|id| !taken(id.as_str()))
        .cloned()
        .collect();
    DrawEngine::seeded(seed).sample(pool, k)
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let n = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    nanos ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
