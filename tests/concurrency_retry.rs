use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use eventdraw::{
    config::{LotteryConfig, RetryPolicy},
    core::{
        transition,
        txn::{TxStep, run_transaction},
    },
    error::LotteryError,
    event::{EventDraft, EventRecord},
    op::{JournalEntry, TransitionOp},
    persist::{EventStore, StoreError, StoreResult, Versioned, memory::MemoryEventStore},
    service::Lottery,
    types::Version,
};

fn draft(capacity: i64) -> EventDraft {
    EventDraft {
        id: "evt".to_string(),
        title: "Climbing intro".to_string(),
        organizer_id: "org".to_string(),
        capacity,
        register_window: None,
    }
}

fn immediate(max_retries: usize) -> LotteryConfig {
    LotteryConfig {
        retry: RetryPolicy::immediate(max_retries),
        ..LotteryConfig::default()
    }
}

/// Lets a rival writer commit a join for "B" right before the first commit lands.
struct RacingStore {
    inner: Arc<MemoryEventStore>,
    rival: Lottery,
    raced: AtomicBool,
    commits: AtomicUsize,
}

impl RacingStore {
    fn new(inner: Arc<MemoryEventStore>) -> Self {
        let rival = Lottery::new(inner.clone(), LotteryConfig::default());
        Self {
            inner,
            rival,
            raced: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
        }
    }
}

impl EventStore for RacingStore {
    fn load(&self, event_id: &str) -> StoreResult<Option<Versioned>> {
        self.inner.load(event_id)
    }

    fn create(&self, record: &EventRecord) -> StoreResult<Version> {
        self.inner.create(record)
    }

    fn commit(
        &self,
        event_id: &str,
        expected: Version,
        record: &EventRecord,
        op: &TransitionOp,
    ) -> StoreResult<Version> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.rival
                .join(event_id, "B")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }
        self.inner.commit(event_id, expected, record, op)
    }

    fn list(&self) -> StoreResult<Vec<Versioned>> {
        self.inner.list()
    }

    fn journal(&self, event_id: &str) -> StoreResult<Vec<JournalEntry>> {
        self.inner.journal(event_id)
    }
}

/// Reads succeed, every commit loses.
struct ConflictingStore {
    inner: MemoryEventStore,
}

impl EventStore for ConflictingStore {
    fn load(&self, event_id: &str) -> StoreResult<Option<Versioned>> {
        self.inner.load(event_id)
    }

    fn create(&self, record: &EventRecord) -> StoreResult<Version> {
        self.inner.create(record)
    }

    fn commit(
        &self,
        event_id: &str,
        expected: Version,
        _record: &EventRecord,
        _op: &TransitionOp,
    ) -> StoreResult<Version> {
        Err(StoreError::Conflict {
            event_id: event_id.to_string(),
            expected,
            actual: expected + 1,
        })
    }

    fn list(&self) -> StoreResult<Vec<Versioned>> {
        self.inner.list()
    }

    fn journal(&self, event_id: &str) -> StoreResult<Vec<JournalEntry>> {
        self.inner.journal(event_id)
    }
}

/// Every call fails with a backend error.
struct DownStore {
    timeout: bool,
}

impl DownStore {
    fn err(&self) -> StoreError {
        if self.timeout {
            StoreError::Timeout("deadline exceeded".to_string())
        } else {
            StoreError::Unavailable("connection refused".to_string())
        }
    }
}

impl EventStore for DownStore {
    fn load(&self, _event_id: &str) -> StoreResult<Option<Versioned>> {
        Err(self.err())
    }

    fn create(&self, _record: &EventRecord) -> StoreResult<Version> {
        Err(self.err())
    }

    fn commit(
        &self,
        _event_id: &str,
        _expected: Version,
        _record: &EventRecord,
        _op: &TransitionOp,
    ) -> StoreResult<Version> {
        Err(self.err())
    }

    fn list(&self) -> StoreResult<Vec<Versioned>> {
        Err(self.err())
    }

    fn journal(&self, _event_id: &str) -> StoreResult<Vec<JournalEntry>> {
        Err(self.err())
    }
}

#[test]
fn lost_race_is_recomputed_from_fresh_read() {
    let inner = Arc::new(MemoryEventStore::new());
    Lottery::new(inner.clone(), LotteryConfig::default())
        .create_event(draft(0))
        .expect("create");
    let racing = RacingStore::new(inner.clone());

    let done = run_transaction(&racing, &RetryPolicy::immediate(2), "evt", |rec| {
        Ok(TxStep {
            output: (),
            change: transition::join(rec, "A").map(|next| {
                (
                    next,
                    TransitionOp::Join {
                        entrant: "A".to_string(),
                    },
                )
            }),
        })
    })
    .expect("join after retry");

    assert_eq!(done.attempts, 2);
    assert_eq!(done.version, Some(3));
    assert_eq!(racing.commits.load(Ordering::SeqCst), 2);

    let rec = inner.load("evt").expect("load").expect("present");
    assert_eq!(rec.version, 3);
    assert!(rec.record.members.waiting.contains("A"));
    assert!(rec.record.members.waiting.contains("B"));
}

#[test]
fn racing_draw_never_picks_the_same_entrant_twice() {
    let inner = Arc::new(MemoryEventStore::new());
    let plain = Lottery::new(inner.clone(), LotteryConfig::default());
    plain.create_event(draft(0)).expect("create");
    plain.join("evt", "A").expect("join A");

    let lottery = Lottery::new(Arc::new(RacingStore::new(inner)), immediate(2));
    let out = lottery.draw_winners_seeded("evt", 0, 9).expect("draw");

    // The rival's join lands first, so the retried draw sees both entrants.
    let mut winners = out.winners.clone();
    winners.sort();
    assert_eq!(winners, vec!["A".to_string(), "B".to_string()]);
    let rec = plain.get("evt").expect("get");
    assert_eq!(rec.members.chosen.len(), 2);
}

#[test]
fn exhausted_retries_surface_attempt_count() {
    let store = Arc::new(ConflictingStore {
        inner: MemoryEventStore::new(),
    });
    let lottery = Lottery::new(store.clone(), immediate(3));
    lottery.create_event(draft(0)).expect("create");

    let err = lottery.join("evt", "A").unwrap_err();
    assert!(matches!(
        err,
        LotteryError::RetryExhausted { ref event_id, attempts: 4 } if event_id == "evt"
    ));

    // Nothing written, so the no-op path never touches commit.
    let rec = lottery.get("evt").expect("get");
    assert!(rec.members.waiting.is_empty());
    assert!(!lottery.leave("evt", "A").expect("no-op leave"));
}

#[test]
fn backend_failures_pass_through_unchanged() {
    let down = Lottery::new(Arc::new(DownStore { timeout: false }), LotteryConfig::default());
    assert!(matches!(down.join("evt", "A"), Err(LotteryError::Unavailable(_))));
    assert!(matches!(down.create_event(draft(1)), Err(LotteryError::Unavailable(_))));

    let slow = Lottery::new(Arc::new(DownStore { timeout: true }), LotteryConfig::default());
    assert!(matches!(slow.draw_winners("evt", 0), Err(LotteryError::Timeout(_))));
    assert!(matches!(slow.entrant_overview("A", 0), Err(LotteryError::Timeout(_))));
}

#[test]
fn concurrent_joins_from_many_threads_all_land() {
    let store = Arc::new(MemoryEventStore::new());
    let lottery = Lottery::new(store.clone(), immediate(1_000));
    lottery.create_event(draft(0)).expect("create");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let lottery = lottery.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    assert!(lottery.join("evt", &format!("t{t}-{i}")).expect("join"));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("thread");
    }

    let rec = lottery.get("evt").expect("get");
    assert_eq!(rec.members.waiting.len(), 200);
    assert_eq!(store.journal("evt").expect("journal").len(), 201);
}

#[test]
fn concurrent_sign_ups_never_overfill() {
    let store = Arc::new(MemoryEventStore::new());
    let lottery = Lottery::new(store, immediate(1_000));
    lottery.create_event(draft(3)).expect("create");
    for i in 0..12 {
        lottery.join("evt", &format!("e{i}")).expect("join");
    }

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let lottery = lottery.clone();
            std::thread::spawn(move || lottery.sign_up("evt", &format!("e{i}")))
        })
        .collect();

    let mut accepted = 0;
    let mut refused = 0;
    for h in handles {
        match h.join().expect("thread") {
            Ok(true) => accepted += 1,
            Err(LotteryError::EventFull(_)) => refused += 1,
            other => panic!("unexpected sign-up result: {other:?}"),
        }
    }
    assert_eq!((accepted, refused), (3, 9));

    let rec = lottery.get("evt").expect("get");
    assert_eq!(rec.members.signed_up.len(), 3);
    assert!(rec.full);
}
