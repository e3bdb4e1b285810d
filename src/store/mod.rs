//! Probe history persistence.
//!
//! # Data Flow
//! ```text
//! Monitor loop      → append_record (every cycle)
//! AlertStateMachine → write_status (on state/notification changes)
//! Startup           → read_status (seed the state machine)
//! /logs handler     → read_records (paginated, newest first)
//! ```
//!
//! # Design Decisions
//! - Pure persistence: no business logic lives here
//! - Timestamps stored as UTC strings that sort lexicographically

pub mod sqlite;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::health::probe::ProbeOutcome;
use crate::health::state::ConnectionState;

pub use sqlite::SqliteStore;

/// Storage format for every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Errors raised by a history store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// The persisted snapshot of the connection status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub state: ConnectionState,
    pub last_notified_at: Option<DateTime<Utc>>,
}

/// One row of probe history, as served by `/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRecord {
    pub id: i64,
    pub timestamp: String,
    pub status: ProbeOutcome,
}

/// Default rows per page on `/logs`.
pub const DEFAULT_PER_PAGE: u32 = 25;

/// Upper bound on rows per page.
pub const MAX_PER_PAGE: u32 = 500;

/// A normalized page request: `number >= 1`, `1 <= size <= MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Zero page numbers clamp to the first page; a zero size falls back
    /// to the default.
    pub fn new(number: u32, size: u32) -> Self {
        let size = match size {
            0 => DEFAULT_PER_PAGE,
            n => n.min(MAX_PER_PAGE),
        };
        Self {
            number: number.max(1),
            size,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// Append-only probe log plus the single current-status row.
///
/// Implementations serialize their own writes; callers never need a
/// transaction across calls.
pub trait HistoryStore: Send + Sync {
    fn read_status(&self) -> Result<Option<StatusRecord>, StoreError>;

    fn write_status(&self, status: &StatusRecord) -> Result<(), StoreError>;

    /// Append one probe result and return its id.
    fn append_record(&self, outcome: ProbeOutcome, at: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Newest-first page of probe history.
    fn read_records(&self, page: Page) -> Result<Vec<ProbeRecord>, StoreError>;
}
