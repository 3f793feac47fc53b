//! Pure membership model, draw engine, and the transaction loop around them.

/// Seat accounting.
pub mod capacity;
/// Seeded without-replacement sampler.
pub mod draw;
/// The four entrant sets and their invariants.
pub mod membership;
/// Per-entrant display status and affordances.
pub mod projection;
/// State-changing transitions as pure functions.
pub mod transition;
/// Optimistic read-compute-commit loop with conflict retry.
pub mod txn;
