//! Best-effort local persistence of the conversation
//!
//! The history lives in a single keyed record holding the JSON-encoded turn
//! list. Every failure is logged and swallowed: losing history must never
//! interrupt a conversation.

use super::state::Turn;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Key of the history record
pub const HISTORY_KEY: &str = "kalyana_history";

/// Number of most recent turns kept in storage
pub const MAX_STORED_TURNS: usize = 60;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Local storage for the turn history
pub trait HistoryStore: Send + Sync {
    /// Last saved turns; empty if nothing is stored or the payload is corrupt
    fn load(&self) -> Vec<Turn>;

    /// Overwrite the stored turns with the last [`MAX_STORED_TURNS`] of `turns`
    fn save(&self, turns: &[Turn]);

    /// Remove the stored turns
    fn clear(&self);
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed history store
#[derive(Clone)]
pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryStore {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open the store at `path`, falling back to memory when that fails.
    ///
    /// The conversation still works without durable history; it is simply
    /// forgotten at exit.
    pub fn open_or_memory<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        match Self::open(&path) {
            Ok(store) => Ok(store),
            Err(e) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "Cannot open history store, history will not survive this process"
                );
                Self::open_in_memory()
            }
        }
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_raw(&self) -> StoreResult<Option<String>> {
        let conn = self.conn();
        let raw = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![HISTORY_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw)
    }

    fn write_raw(&self, raw: &str) -> StoreResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![HISTORY_KEY, raw],
        )?;
        Ok(())
    }

    fn try_load(&self) -> StoreResult<Vec<Turn>> {
        match self.read_raw()? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn try_save(&self, turns: &[Turn]) -> StoreResult<()> {
        let raw = serde_json::to_string(recent(turns))?;
        self.write_raw(&raw)
    }

    fn try_clear(&self) -> StoreResult<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![HISTORY_KEY])?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn load(&self) -> Vec<Turn> {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable history");
            Vec::new()
        })
    }

    fn save(&self, turns: &[Turn]) {
        if let Err(e) = self.try_save(turns) {
            tracing::warn!(error = %e, turns = turns.len(), "Failed to save history");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.try_clear() {
            tracing::warn!(error = %e, "Failed to clear history");
        }
    }
}

/// The suffix of `turns` that fits in storage
pub fn recent(turns: &[Turn]) -> &[Turn] {
    let start = turns.len().saturating_sub(MAX_STORED_TURNS);
    &turns[start..]
}
