//! SQLite-backed event documents with an append-only membership journal.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::{Deserialize, Serialize};

use crate::{
    event::EventRecord,
    op::{JOURNAL_FORMAT_VERSION, JournalEntry, JournalEnvelope, TransitionOp},
    types::{JournalSeq, Version, now_ms},
};

use super::{EventStore, StoreError, StoreResult, Versioned};

const RECORD_FORMAT_VERSION: u16 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordEnvelope {
    format_version: u16,
    record: EventRecord,
}

/// SQLite implementation of [`crate::persist::EventStore`].
///
/// Several stores (or processes) may open the same file; the `version` column
/// makes their commits compare-and-swap.
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
    }

    fn append_journal(
        tx: &Transaction<'_>,
        event_id: &str,
        seq: JournalSeq,
        op: &TransitionOp,
    ) -> StoreResult<()> {
        let entry = JournalEntry {
            seq,
            ts_ms: now_ms(),
            op: op.clone(),
        };
        let payload = serde_json::to_vec(&JournalEnvelope::new(entry.clone()))?;
        tx.execute(
            "INSERT INTO journal(event_id, seq, ts_ms, kind, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event_id, seq as i64, entry.ts_ms as i64, op.kind(), payload],
        )?;
        Ok(())
    }
}

impl EventStore for SqliteEventStore {
    fn load(&self, event_id: &str) -> StoreResult<Option<Versioned>> {
        let conn = self.conn()?;
        let row: Option<(i64, Vec<u8>)> = conn
            .query_row(
                "SELECT version, payload FROM events WHERE id = ?1",
                params![event_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(version, payload)| decode_record(version, &payload))
            .transpose()
    }

    fn create(&self, record: &EventRecord) -> StoreResult<Version> {
        let payload = encode_record(record)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO events(id, version, updated_ms, payload) VALUES (?1, 1, ?2, ?3)",
            params![record.id, now_ms() as i64, payload],
        )?;
        if inserted == 0 {
            return Err(StoreError::AlreadyExists(record.id.clone()));
        }
        Self::append_journal(&tx, &record.id, 1, &TransitionOp::Create)?;
        tx.commit()?;
        Ok(1)
    }

    fn commit(
        &self,
        event_id: &str,
        expected: Version,
        record: &EventRecord,
        op: &TransitionOp,
    ) -> StoreResult<Version> {
        let payload = encode_record(record)?;
        let next = expected + 1;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE events SET version = ?1, updated_ms = ?2, payload = ?3 \
             WHERE id = ?4 AND version = ?5",
            params![next as i64, now_ms() as i64, payload, event_id, expected as i64],
        )?;

        if updated == 0 {
            let actual: Option<i64> = tx
                .query_row(
                    "SELECT version FROM events WHERE id = ?1",
                    params![event_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match actual {
                Some(actual) => StoreError::Conflict {
                    event_id: event_id.to_string(),
                    expected,
                    actual: actual as Version,
                },
                None => StoreError::NotFound(event_id.to_string()),
            });
        }

        Self::append_journal(&tx, event_id, next, op)?;
        tx.commit()?;
        Ok(next)
    }

    fn list(&self) -> StoreResult<Vec<Versioned>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT version, payload FROM events ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            let version: i64 = row.get(0)?;
            let payload: Vec<u8> = row.get(1)?;
            Ok((version, payload))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (version, payload) = row?;
            out.push(decode_record(version, &payload)?);
        }
        Ok(out)
    }

    fn journal(&self, event_id: &str) -> StoreResult<Vec<JournalEntry>> {
        let conn = self.conn()?;
        let exists = conn
            .query_row("SELECT 1 FROM events WHERE id = ?1", params![event_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound(event_id.to_string()));
        }

        let mut stmt =
            conn.prepare("SELECT payload FROM journal WHERE event_id = ?1 ORDER BY seq ASC")?;
        let rows = stmt.query_map(params![event_id], |row| row.get::<_, Vec<u8>>(0))?;

        let mut out = Vec::new();
        for row in rows {
            let env: JournalEnvelope = serde_json::from_slice(&row?)?;
            if env.format_version != JOURNAL_FORMAT_VERSION {
                return Err(StoreError::Corrupt(format!(
                    "unsupported journal format {}",
                    env.format_version
                )));
            }
            out.push(env.entry);
        }
        Ok(out)
    }
}

fn encode_record(record: &EventRecord) -> StoreResult<Vec<u8>> {
    let env = RecordEnvelope {
        format_version: RECORD_FORMAT_VERSION,
        record: record.clone(),
    };
    Ok(serde_json::to_vec(&env)?)
}

fn decode_record(version: i64, payload: &[u8]) -> StoreResult<Versioned> {
    let env: RecordEnvelope = serde_json::from_slice(payload)?;
    if env.format_version != RECORD_FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported record format {}",
            env.format_version
        )));
    }
    Ok(Versioned {
        version: version as Version,
        record: env.record,
    })
}
