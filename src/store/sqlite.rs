//! SQLite-backed history store.
//!
//! Schema:
//! - connection_status: (id = 1, status TEXT, last_email_sent TEXT NULL)
//! - logs: (id INTEGER PRIMARY KEY AUTOINCREMENT, timestamp TEXT, status TEXT)

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::health::probe::ProbeOutcome;
use crate::health::state::ConnectionState;
use crate::store::{
    format_timestamp, parse_timestamp, HistoryStore, Page, ProbeRecord, StatusRecord, StoreError,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS connection_status (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    status TEXT NOT NULL,
    last_email_sent TEXT
);
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    status TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_logs_status ON logs (status);
CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs (timestamp);
";

/// History store over a single SQLite connection.
///
/// The connection sits behind a mutex, so every statement is serialized
/// within the process.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and bootstrap the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::bootstrap(conn)
    }

    /// A throwaway database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-applied in SQLite.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HistoryStore for SqliteStore {
    fn read_status(&self) -> Result<Option<StatusRecord>, StoreError> {
        let row = self
            .conn()
            .query_row(
                "SELECT status, last_email_sent FROM connection_status WHERE id = 1",
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        let Some((status, last_email_sent)) = row else {
            return Ok(None);
        };

        let state = ConnectionState::parse(&status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status {status:?}")))?;
        let last_notified_at = match last_email_sent.as_deref() {
            None | Some("") => None,
            Some(text) => Some(
                parse_timestamp(text)
                    .ok_or_else(|| StoreError::Corrupt(format!("bad timestamp {text:?}")))?,
            ),
        };

        Ok(Some(StatusRecord {
            state,
            last_notified_at,
        }))
    }

    fn write_status(&self, status: &StatusRecord) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO connection_status (id, status, last_email_sent) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                last_email_sent = excluded.last_email_sent",
            params![
                status.state.as_str(),
                status.last_notified_at.map(format_timestamp)
            ],
        )?;
        Ok(())
    }

    fn append_record(&self, outcome: ProbeOutcome, at: DateTime<Utc>) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO logs (timestamp, status) VALUES (?1, ?2)",
            params![format_timestamp(at), outcome.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn read_records(&self, page: Page) -> Result<Vec<ProbeRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, status FROM logs
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![page.size() as i64, page.offset() as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, timestamp, status) = row?;
            let status = ProbeOutcome::parse(&status)
                .ok_or_else(|| StoreError::Corrupt(format!("log {id} has status {status:?}")))?;
            records.push(ProbeRecord {
                id,
                timestamp,
                status,
            });
        }
        Ok(records)
    }
}
