use std::sync::Arc;

use tempfile::TempDir;

use eventdraw::{
    config::LotteryConfig,
    error::LotteryError,
    event::{EventDraft, EventPatch, RegisterWindow},
    op::TransitionOp,
    persist::{EventStore, StoreError, sqlite::SqliteEventStore},
    service::Lottery,
};

fn draft(id: &str, capacity: i64) -> EventDraft {
    EventDraft {
        id: id.to_string(),
        title: "Community swim".to_string(),
        organizer_id: "org-7".to_string(),
        capacity,
        register_window: Some(RegisterWindow::between(10, 20)),
    }
}

#[test]
fn sqlite_state_and_journal_survive_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("lottery.db");

    let (winners, before) = {
        let store = SqliteEventStore::open(&db_path).expect("open sqlite");
        let lottery = Lottery::new(Arc::new(store), LotteryConfig::default());
        lottery.create_event(draft("evt", 2)).expect("create");
        for id in ["A", "B", "C"] {
            lottery.join("evt", id).expect("join");
        }
        let out = lottery.draw_winners_seeded("evt", 0, 21).expect("draw");
        lottery.sign_up("evt", &out.winners[0]).expect("sign up");
        lottery
            .update_event(
                "evt",
                EventPatch {
                    title: Some("Community swim (week 2)".to_string()),
                    ..EventPatch::default()
                },
            )
            .expect("update");
        (out.winners, lottery.get("evt").expect("get"))
    };

    let reopened = SqliteEventStore::open(&db_path).expect("reopen");
    let loaded = reopened.load("evt").expect("load").expect("present");
    assert_eq!(loaded.record, before);
    assert_eq!(loaded.version, 7);
    assert_eq!(loaded.record.register_window, Some(RegisterWindow::between(10, 20)));

    let journal = reopened.journal("evt").expect("journal");
    let kinds: Vec<_> = journal.iter().map(|e| e.op.kind()).collect();
    assert_eq!(
        kinds,
        vec!["create", "join", "join", "join", "draw", "sign_up", "update"]
    );
    assert_eq!(journal.iter().map(|e| e.seq).collect::<Vec<_>>(), (1..=7).collect::<Vec<_>>());
    match &journal[4].op {
        TransitionOp::Draw { winners: drawn, seed } => {
            assert_eq!(drawn, &winners);
            assert_eq!(*seed, 21);
        }
        other => panic!("expected draw, got {other:?}"),
    }
}

#[test]
fn second_connection_sees_version_conflict() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("lottery.db");

    let first = SqliteEventStore::open(&db_path).expect("open first");
    let second = SqliteEventStore::open(&db_path).expect("open second");

    let creator = SqliteEventStore::open(&db_path).expect("open");
    Lottery::new(Arc::new(creator), LotteryConfig::default())
        .create_event(draft("evt", 0))
        .expect("create");

    let a = first.load("evt").expect("load a").expect("present");
    let b = second.load("evt").expect("load b").expect("present");
    assert_eq!(a.version, b.version);

    let mut rec_a = a.record.clone();
    rec_a.members.waiting.insert("A");
    let next = first
        .commit(
            "evt",
            a.version,
            &rec_a,
            &TransitionOp::Join {
                entrant: "A".to_string(),
            },
        )
        .expect("first commit");
    assert_eq!(next, a.version + 1);

    let mut rec_b = b.record.clone();
    rec_b.members.waiting.insert("B");
    let err = second
        .commit(
            "evt",
            b.version,
            &rec_b,
            &TransitionOp::Join {
                entrant: "B".to_string(),
            },
        )
        .unwrap_err();
    match err {
        StoreError::Conflict {
            event_id,
            expected,
            actual,
        } => {
            assert_eq!(event_id, "evt");
            assert_eq!(expected, b.version);
            assert_eq!(actual, b.version + 1);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    // The losing write left neither record nor journal behind.
    let stored = second.load("evt").expect("load").expect("present");
    assert_eq!(stored.record.members.waiting.as_slice(), ["A".to_string()].as_slice());
    assert_eq!(second.journal("evt").expect("journal").len(), 2);
}

#[test]
fn sqlite_reports_missing_and_duplicate_events() {
    let store = Arc::new(SqliteEventStore::open_in_memory().expect("open"));
    let lottery = Lottery::new(store.clone(), LotteryConfig::default());

    assert!(matches!(lottery.join("ghost", "A"), Err(LotteryError::NotFound(_))));

    let mut rec = lottery.create_event(draft("evt", 1)).expect("create");
    rec.id = "ghost".to_string();
    assert!(matches!(
        store.commit("ghost", 1, &rec, &TransitionOp::Create),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(lottery.create_event(draft("evt", 1)), Err(LotteryError::AlreadyExists(_))));
    assert!(matches!(store.journal("ghost"), Err(StoreError::NotFound(_))));
    assert!(matches!(lottery.journal("ghost"), Err(LotteryError::NotFound(_))));
}

#[test]
fn cleared_register_window_is_journaled_as_a_clear() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("lottery.db");

    {
        let store = SqliteEventStore::open(&db_path).expect("open sqlite");
        let lottery = Lottery::new(Arc::new(store), LotteryConfig::default());
        lottery.create_event(draft("evt", 0)).expect("create");
        let clear = EventPatch {
            register_window: Some(None),
            ..EventPatch::default()
        };
        assert!(lottery.update_event("evt", clear).expect("clear window"));
        assert_eq!(lottery.get("evt").expect("get").register_window, None);
    }

    let reopened = SqliteEventStore::open(&db_path).expect("reopen");
    let journal = reopened.journal("evt").expect("journal");
    match &journal.last().expect("entry").op {
        TransitionOp::Update { patch } => {
            assert_eq!(patch.register_window, Some(None));
            assert_eq!(patch.title, None);
            assert_eq!(patch.capacity, None);
        }
        other => panic!("expected update, got {other:?}"),
    }
}

#[test]
fn sqlite_list_is_ordered_by_event_id() {
    let store = Arc::new(SqliteEventStore::open_in_memory().expect("open"));
    let lottery = Lottery::new(store.clone(), LotteryConfig::default());
    for id in ["zumba", "archery", "kayak"] {
        lottery.create_event(draft(id, 0)).expect("create");
        lottery.join(id, "me").expect("join");
    }

    let ids: Vec<_> = store
        .list()
        .expect("list")
        .into_iter()
        .map(|v| v.record.id)
        .collect();
    assert_eq!(ids, vec!["archery", "kayak", "zumba"]);

    let overview = lottery.entrant_overview("me", 15).expect("overview");
    assert_eq!(overview.len(), 3);
}
