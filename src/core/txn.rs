use tracing::{debug, warn};

use crate::{
    config::RetryPolicy,
    error::LotteryError,
    event::EventRecord,
    op::TransitionOp,
    persist::{EventStore, StoreError},
    types::Version,
};

/// What one attempt computed from the snapshot it read.
#[derive(Debug, Clone)]
pub struct TxStep<T> {
    /// Value handed back to the caller if this attempt wins.
    pub output: T,
    /// Record to commit and the op to journal; `None` commits nothing.
    pub change: Option<(EventRecord, TransitionOp)>,
}

impl<T> TxStep<T> {
    /// Step that leaves the record untouched.
    pub fn unchanged(output: T) -> Self {
        Self {
            output,
            change: None,
        }
    }
}

/// Outcome of a finished transaction.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    /// Output of the winning attempt.
    pub output: T,
    /// Record as of the end of the transaction.
    pub record: EventRecord,
    /// New version when something was written, `None` for a skipped no-op.
    pub version: Option<Version>,
    /// Attempts used, including the winning one.
    pub attempts: usize,
}

impl<T> Committed<T> {
    /// Returns true when the transaction wrote a new version.
    pub fn changed(&self) -> bool {
        self.version.is_some()
    }
}

/// Runs `compute` as an optimistic single-document transaction.
///
/// Each attempt re-reads the record, computes purely from that snapshot, checks
/// the membership invariants, and compare-and-commits. A write conflict throws
/// the attempt away and starts over from a fresh read; after
/// `policy.max_attempts()` lost races the call fails with
/// [`LotteryError::RetryExhausted`]. Errors from `compute` abort without writing.
pub fn run_transaction<S, T, F>(
    store: &S,
    policy: &RetryPolicy,
    event_id: &str,
    mut compute: F,
) -> Result<Committed<T>, LotteryError>
where
    S: EventStore + ?Sized,
    F: FnMut(&EventRecord) -> Result<TxStep<T>, LotteryError>,
{
    let max_attempts = policy.max_attempts();

    for attempt in 1..=max_attempts {
        debug!(event_id, attempt, "transaction attempt");

        let current = store
            .load(event_id)?
            .ok_or_else(|| LotteryError::NotFound(event_id.to_string()))?;

        let step = compute(&current.record)?;
        let Some((next, op)) = step.change else {
            debug!(event_id, attempt, "no change, skipping commit");
            return Ok(Committed {
                output: step.output,
                record: current.record,
                version: None,
                attempts: attempt,
            });
        };

        next.members
            .check(next.capacity)
            .map_err(|v| LotteryError::InvariantViolated(v.to_string()))?;

        match store.commit(event_id, current.version, &next, &op) {
            Ok(version) => {
                debug!(event_id, attempt, version, kind = op.kind(), "committed");
                return Ok(Committed {
                    output: step.output,
                    record: next,
                    version: Some(version),
                    attempts: attempt,
                });
            }
            Err(StoreError::Conflict {
                expected, actual, ..
            }) => {
                warn!(event_id, attempt, expected, actual, "write conflict, retrying");
                if attempt < max_attempts {
                    let delay = policy.delay_for_retry(attempt - 1);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
            }
            Err(other) => return Err(other.into()),
        }
    }

    warn!(event_id, attempts = max_attempts, "retries exhausted");
    Err(LotteryError::RetryExhausted {
        event_id: event_id.to_string(),
        attempts: max_attempts,
    })
}
