use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    config::LotteryConfig,
    core::projection::Projection,
    error::LotteryError,
    event::{EventDraft, EventPatch, EventRecord},
    persist::EventStore,
    service::{DrawOutcome, Lottery},
    types::{EntrantId, EventId, TimestampMs},
};

use super::events::LotteryEvent;

/// Async, cloneable front end over [`Lottery`].
///
/// Each call runs its store round-trips on tokio's blocking pool, so concurrent
/// calls proceed independently and only the calling task waits. Dropping a
/// pending call's future abandons the wait; the operation itself either commits
/// in full or not at all, and a commit that lands is still broadcast.
#[derive(Clone)]
pub struct LotteryHandle {
    lottery: Lottery,
    events_tx: broadcast::Sender<LotteryEvent>,
}

/// Builds a handle over `store`. Must be called inside a tokio runtime to be used.
pub fn spawn_lottery(store: Arc<dyn EventStore>, config: LotteryConfig) -> LotteryHandle {
    let (events_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
    LotteryHandle {
        lottery: Lottery::new(store, config),
        events_tx,
    }
}

impl LotteryHandle {
    /// Subscribes to committed lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LotteryEvent> {
        self.events_tx.subscribe()
    }

    /// Synchronous core this handle drives.
    pub fn lottery(&self) -> &Lottery {
        &self.lottery
    }

    /// See [`Lottery::create_event`].
    pub async fn create_event(&self, draft: EventDraft) -> Result<EventRecord, LotteryError> {
        self.run(
            move |l| l.create_event(draft),
            |rec: &EventRecord| {
                Some(LotteryEvent::Created {
                    event_id: rec.id.clone(),
                })
            },
        )
        .await
    }

    /// See [`Lottery::update_event`].
    pub async fn update_event(
        &self,
        event_id: impl Into<EventId>,
        patch: EventPatch,
    ) -> Result<bool, LotteryError> {
        let event_id = event_id.into();
        let id = event_id.clone();
        self.run(
            move |l| l.update_event(&id, patch),
            move |changed: &bool| changed.then_some(LotteryEvent::Updated { event_id }),
        )
        .await
    }

    /// See [`Lottery::join`].
    pub async fn join(
        &self,
        event_id: impl Into<EventId>,
        entrant_id: impl Into<EntrantId>,
    ) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id.into(),
            entrant_id.into(),
            Lottery::join,
            |event_id, entrant_id| LotteryEvent::Joined { event_id, entrant_id },
        )
        .await
    }

    /// See [`Lottery::leave`].
    pub async fn leave(
        &self,
        event_id: impl Into<EventId>,
        entrant_id: impl Into<EntrantId>,
    ) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id.into(),
            entrant_id.into(),
            Lottery::leave,
            |event_id, entrant_id| LotteryEvent::Left { event_id, entrant_id },
        )
        .await
    }

    /// See [`Lottery::sign_up`].
    pub async fn sign_up(
        &self,
        event_id: impl Into<EventId>,
        entrant_id: impl Into<EntrantId>,
    ) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id.into(),
            entrant_id.into(),
            Lottery::sign_up,
            |event_id, entrant_id| LotteryEvent::SignedUp { event_id, entrant_id },
        )
        .await
    }

    /// See [`Lottery::decline`].
    pub async fn decline(
        &self,
        event_id: impl Into<EventId>,
        entrant_id: impl Into<EntrantId>,
    ) -> Result<bool, LotteryError> {
        self.entrant_op(
            event_id.into(),
            entrant_id.into(),
            Lottery::decline,
            |event_id, entrant_id| LotteryEvent::Declined { event_id, entrant_id },
        )
        .await
    }

    /// See [`Lottery::draw_winners`].
    pub async fn draw_winners(
        &self,
        event_id: impl Into<EventId>,
        max_to_draw: i64,
    ) -> Result<DrawOutcome, LotteryError> {
        let event_id = event_id.into();
        self.run(move |l| l.draw_winners(&event_id, max_to_draw), drawn_event).await
    }

    /// See [`Lottery::draw_winners_seeded`].
    pub async fn draw_winners_seeded(
        &self,
        event_id: impl Into<EventId>,
        max_to_draw: i64,
        seed: u64,
    ) -> Result<DrawOutcome, LotteryError> {
        let event_id = event_id.into();
        self.run(
            move |l| l.draw_winners_seeded(&event_id, max_to_draw, seed),
            drawn_event,
        )
        .await
    }

    /// See [`Lottery::project_status`].
    pub async fn project_status(
        &self,
        event_id: impl Into<EventId>,
        entrant_id: impl Into<EntrantId>,
        now_ms: TimestampMs,
    ) -> Result<Option<Projection>, LotteryError> {
        let (event_id, entrant_id) = (event_id.into(), entrant_id.into());
        self.run(
            move |l| l.project_status(&event_id, &entrant_id, now_ms),
            |_: &Option<Projection>| None,
        )
        .await
    }

    /// See [`Lottery::entrant_overview`].
    pub async fn entrant_overview(
        &self,
        entrant_id: impl Into<EntrantId>,
        now_ms: TimestampMs,
    ) -> Result<Vec<(EventId, Projection)>, LotteryError> {
        let entrant_id = entrant_id.into();
        self.run(
            move |l| l.entrant_overview(&entrant_id, now_ms),
            |_: &Vec<(EventId, Projection)>| None,
        )
        .await
    }

    /// See [`Lottery::get`].
    pub async fn get(&self, event_id: impl Into<EventId>) -> Result<EventRecord, LotteryError> {
        let event_id = event_id.into();
        self.run(move |l| l.get(&event_id), |_: &EventRecord| None).await
    }

    async fn entrant_op<O, E>(
        &self,
        event_id: EventId,
        entrant_id: EntrantId,
        op: O,
        event: E,
    ) -> Result<bool, LotteryError>
    where
        O: FnOnce(&Lottery, &str, &str) -> Result<bool, LotteryError> + Send + 'static,
        E: FnOnce(EventId, EntrantId) -> LotteryEvent + Send + 'static,
    {
        let (e, n) = (event_id.clone(), entrant_id.clone());
        self.run(
            move |l| op(l, &e, &n),
            move |changed: &bool| changed.then(|| event(event_id, entrant_id)),
        )
        .await
    }

    /// Runs `f` on the blocking pool and broadcasts `event(&output)` from the
    /// same task, so a caller dropping this future never loses the event of a
    /// commit that still lands.
    async fn run<T, F, E>(&self, f: F, event: E) -> Result<T, LotteryError>
    where
        T: Send + 'static,
        F: FnOnce(&Lottery) -> Result<T, LotteryError> + Send + 'static,
        E: FnOnce(&T) -> Option<LotteryEvent> + Send + 'static,
    {
        let lottery = self.lottery.clone();
        let events_tx = self.events_tx.clone();
        tokio::task::spawn_blocking(move || {
            let out = f(&lottery)?;
            if let Some(evt) = event(&out) {
                emit(&events_tx, evt);
            }
            Ok(out)
        })
        .await
        .map_err(|e| {
            if e.is_cancelled() {
                LotteryError::ChannelClosed
            } else {
                LotteryError::Unavailable(format!("join error: {e}"))
            }
        })?
    }
}

fn drawn_event(out: &DrawOutcome) -> Option<LotteryEvent> {
    if out.winners.is_empty() {
        return None;
    }
    Some(LotteryEvent::WinnersDrawn {
        event_id: out.event_id.clone(),
        event_title: out.event_title.clone(),
        organizer_id: out.organizer_id.clone(),
        winners: out.winners.clone(),
    })
}

fn emit(events_tx: &broadcast::Sender<LotteryEvent>, event: LotteryEvent) {
    if events_tx.send(event).is_err() {
        debug!("no event subscribers");
    }
}
