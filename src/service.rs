//! Synchronous lottery operations against an injected [`EventStore`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    config::LotteryConfig,
    core::{
        draw::{DrawEngine, DrawLimit},
        projection::{self, Projection},
        transition,
        txn::{Committed, TxStep, run_transaction},
    },
    error::LotteryError,
    event::{EventDraft, EventPatch, EventRecord},
    op::{JournalEntry, TransitionOp},
    persist::EventStore,
    types::{EntrantId, EventId, TimestampMs, now_ms, validate_id},
};

/// Result of a committed or empty draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Event drawn on.
    pub event_id: EventId,
    /// Newly chosen entrants; empty when no seat or nobody eligible.
    pub winners: Vec<EntrantId>,
    /// Event title from the committed snapshot.
    pub event_title: String,
    /// Organizer from the committed snapshot.
    pub organizer_id: String,
    /// Seed the sampler ran with.
    pub seed: u64,
}

/// Entry point for every membership operation.
///
/// Holds no event state of its own: each call re-reads the record through the
/// store, so clones may be used from any number of threads.
#[derive(Clone)]
pub struct Lottery {
    store: Arc<dyn EventStore>,
    config: LotteryConfig,
}

impl Lottery {
    /// Wraps `store` with `config`.
    pub fn new(store: Arc<dyn EventStore>, config: LotteryConfig) -> Self {
        Self { store, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &LotteryConfig {
        &self.config
    }

    /// Underlying store adapter.
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Creates an event with empty entrant sets.
    pub fn create_event(&self, draft: EventDraft) -> Result<EventRecord, LotteryError> {
        self.check_event_id(&draft.id)?;
        let capacity = transition::checked_capacity(draft.capacity)?;
        if draft.register_window.is_some_and(|w| w.is_inverted()) {
            return Err(LotteryError::InvalidArgument(
                "register window ends before it starts".to_string(),
            ));
        }

        let record = EventRecord {
            id: draft.id,
            title: draft.title,
            organizer_id: draft.organizer_id,
            capacity,
            register_window: draft.register_window,
            full: false,
            created_at_ms: now_ms(),
            members: Default::default(),
        };
        self.store.create(&record)?;
        info!(event_id = %record.id, capacity, "event created");
        Ok(record)
    }

    /// Patches title, capacity, or register window.
    pub fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<bool, LotteryError> {
        self.check_event_id(event_id)?;
        if patch.is_empty() {
            self.get(event_id)?;
            return Ok(false);
        }
        let done = run_transaction(&*self.store, &self.config.retry, event_id, |rec| {
            let change = transition::apply_patch(rec, &patch)?.map(|next| {
                (
                    next,
                    TransitionOp::Update {
                        patch: patch.clone(),
                    },
                )
            });
            Ok(TxStep { output: (), change })
        })?;
        Ok(done.changed())
    }

    /// Adds the entrant to the waiting list. Returns true when state changed.
    pub fn join(&self, event_id: &str, entrant_id: &str) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id,
            entrant_id,
            |rec| Ok(transition::join(rec, entrant_id)),
            || TransitionOp::Join {
                entrant: entrant_id.to_string(),
            },
        )
    }

    /// Removes the entrant from the waiting list. Returns true when state changed.
    pub fn leave(&self, event_id: &str, entrant_id: &str) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id,
            entrant_id,
            |rec| Ok(transition::leave(rec, entrant_id)),
            || TransitionOp::Leave {
                entrant: entrant_id.to_string(),
            },
        )
    }

    /// Accepts a seat. Returns true when state changed.
    pub fn sign_up(&self, event_id: &str, entrant_id: &str) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id,
            entrant_id,
            |rec| transition::sign_up(rec, entrant_id),
            || TransitionOp::SignUp {
                entrant: entrant_id.to_string(),
            },
        )
    }

    /// Declines a seat. Returns true when state changed.
    pub fn decline(&self, event_id: &str, entrant_id: &str) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id,
            entrant_id,
            |rec| Ok(transition::decline(rec, entrant_id)),
            || TransitionOp::Decline {
                entrant: entrant_id.to_string(),
            },
        )
    }

    /// Draws winners with a clock-derived seed; `max_to_draw <= 0` fills every free seat.
    pub fn draw_winners(
        &self,
        event_id: &str,
        max_to_draw: i64,
    ) -> Result<DrawOutcome, LotteryError> {
        self.draw_with(event_id, max_to_draw, DrawEngine::from_clock())
    }

    /// Draws winners with an explicit seed.
    pub fn draw_winners_seeded(
        &self,
        event_id: &str,
        max_to_draw: i64,
        seed: u64,
    ) -> Result<DrawOutcome, LotteryError> {
        self.draw_with(event_id, max_to_draw, DrawEngine::seeded(seed))
    }

    /// Read-only status and affordances for one entrant.
    pub fn project_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        now_ms: TimestampMs,
    ) -> Result<Option<Projection>, LotteryError> {
        self.check_entrant_id(entrant_id)?;
        let rec = self.get(event_id)?;
        Ok(projection::project(&rec, entrant_id, now_ms))
    }

    /// Every event the entrant participates in, with its projection.
    pub fn entrant_overview(
        &self,
        entrant_id: &str,
        now_ms: TimestampMs,
    ) -> Result<Vec<(EventId, Projection)>, LotteryError> {
        self.check_entrant_id(entrant_id)?;
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter_map(|v| {
                projection::project(&v.record, entrant_id, now_ms).map(|p| (v.record.id, p))
            })
            .collect())
    }

    /// Current record.
    pub fn get(&self, event_id: &str) -> Result<EventRecord, LotteryError> {
        self.check_event_id(event_id)?;
        self.store
            .load(event_id)?
            .map(|v| v.record)
            .ok_or_else(|| LotteryError::NotFound(event_id.to_string()))
    }

    /// Committed journal of one event.
    pub fn journal(&self, event_id: &str) -> Result<Vec<JournalEntry>, LotteryError> {
        self.check_event_id(event_id)?;
        Ok(self.store.journal(event_id)?)
    }

    fn draw_with(
        &self,
        event_id: &str,
        max_to_draw: i64,
        engine: DrawEngine,
    ) -> Result<DrawOutcome, LotteryError> {
        self.check_event_id(event_id)?;
        let limit = DrawLimit::from_requested(max_to_draw);

        let done = run_transaction(&*self.store, &self.config.retry, event_id, |rec| {
            let computed = transition::draw_winners(rec, limit, &engine);
            let change = computed.next.map(|next| {
                (
                    next,
                    TransitionOp::Draw {
                        winners: computed.winners.clone(),
                        seed: engine.seed(),
                    },
                )
            });
            Ok(TxStep {
                output: computed.winners,
                change,
            })
        })?;

        if done.changed() {
            info!(event_id, winners = done.output.len(), seed = engine.seed(), "winners drawn");
        }
        Ok(outcome(done, engine.seed()))
    }

    fn entrant_op<C, O>(
        &self,
        event_id: &str,
        entrant_id: &str,
        mut compute: C,
        op: O,
    ) -> Result<bool, LotteryError>
    where
        C: FnMut(&EventRecord) -> Result<Option<EventRecord>, LotteryError>,
        O: Fn() -> TransitionOp,
    {
        self.check_event_id(event_id)?;
        self.check_entrant_id(entrant_id)?;
        let done = run_transaction(&*self.store, &self.config.retry, event_id, |rec| {
            let change = compute(rec)?.map(|next| (next, op()));
            Ok(TxStep { output: (), change })
        })?;
        debug!(
            event_id,
            entrant_id,
            changed = done.changed(),
            attempts = done.attempts,
            "entrant operation finished"
        );
        Ok(done.changed())
    }

    fn check_event_id(&self, id: &str) -> Result<(), LotteryError> {
        validate_id("event id", id, self.config.max_id_len)
    }

    fn check_entrant_id(&self, id: &str) -> Result<(), LotteryError> {
        validate_id("entrant id", id, self.config.max_id_len)
    }
}

fn outcome(done: Committed<Vec<EntrantId>>, seed: u64) -> DrawOutcome {
    DrawOutcome {
        event_id: done.record.id,
        winners: done.output,
        event_title: done.record.title,
        organizer_id: done.record.organizer_id,
        seed,
    }
}
