//! Process-local store with the same version semantics as SQLite.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::{
    event::EventRecord,
    op::{JournalEntry, TransitionOp},
    types::{EventId, Version, now_ms},
};

use super::{EventStore, StoreError, StoreResult, Versioned};

#[derive(Debug)]
struct Slot {
    version: Version,
    record: EventRecord,
    journal: Vec<JournalEntry>,
}

/// In-memory implementation of [`EventStore`].
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    slots: Mutex<BTreeMap<EventId, Slot>>,
}

impl MemoryEventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> StoreResult<MutexGuard<'_, BTreeMap<EventId, Slot>>> {
        self.slots
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl EventStore for MemoryEventStore {
    fn load(&self, event_id: &str) -> StoreResult<Option<Versioned>> {
        Ok(self.slots()?.get(event_id).map(|slot| Versioned {
            version: slot.version,
            record: slot.record.clone(),
        }))
    }

    fn create(&self, record: &EventRecord) -> StoreResult<Version> {
        let mut slots = self.slots()?;
        if slots.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id.clone()));
        }
        slots.insert(
            record.id.clone(),
            Slot {
                version: 1,
                record: record.clone(),
                journal: vec![JournalEntry {
                    seq: 1,
                    ts_ms: now_ms(),
                    op: TransitionOp::Create,
                }],
            },
        );
        Ok(1)
    }

    fn commit(
        &self,
        event_id: &str,
        expected: Version,
        record: &EventRecord,
        op: &TransitionOp,
    ) -> StoreResult<Version> {
        let mut slots = self.slots()?;
        let slot = slots
            .get_mut(event_id)
            .ok_or_else(|| StoreError::NotFound(event_id.to_string()))?;

        if slot.version != expected {
            return Err(StoreError::Conflict {
                event_id: event_id.to_string(),
                expected,
                actual: slot.version,
            });
        }

        slot.version += 1;
        slot.record = record.clone();
        slot.journal.push(JournalEntry {
            seq: slot.version,
            ts_ms: now_ms(),
            op: op.clone(),
        });
        Ok(slot.version)
    }

    fn list(&self) -> StoreResult<Vec<Versioned>> {
        Ok(self
            .slots()?
            .values()
            .map(|slot| Versioned {
                version: slot.version,
                record: slot.record.clone(),
            })
            .collect())
    }

    fn journal(&self, event_id: &str) -> StoreResult<Vec<JournalEntry>> {
        self.slots()?
            .get(event_id)
            .map(|slot| slot.journal.clone())
            .ok_or_else(|| StoreError::NotFound(event_id.to_string()))
    }
}
