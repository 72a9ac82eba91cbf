//! SQLite-backed watch store.
//!
//! Provides persistent storage for:
//! - Daily watch-time records
//! - Key-value store for application state (reset marker, streak, counters)

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::{data_dir, DailyWatchRecord, WatchStore};
use crate::error::StorageError;
use crate::streak::Streak;

const LAST_RESET_KEY: &str = "last_reset_date";
const STREAK_KEY: &str = "streak";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database for watch-time storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/scrolljail/scrolljail.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("scrolljail.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and simulations).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_watch (
                date     TEXT PRIMARY KEY,
                watch_ms INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load the persisted streak, or a fresh one if none was saved.
    pub fn load_streak(&self) -> Result<Streak, StorageError> {
        match self.kv_get(STREAK_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|_| StorageError::Corrupt {
                key: STREAK_KEY.to_string(),
                value: raw,
            }),
            None => Ok(Streak::default()),
        }
    }

    pub fn save_streak(&self, streak: &Streak) -> Result<(), StorageError> {
        let json = serde_json::to_string(streak).map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        self.kv_set(STREAK_KEY, &json)
    }

    fn parse_date(raw: &str, key: &str) -> Result<NaiveDate, StorageError> {
        NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| StorageError::Corrupt {
            key: key.to_string(),
            value: raw.to_string(),
        })
    }
}

impl WatchStore for Database {
    fn daily_record(&self, date: NaiveDate) -> Result<Option<Duration>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT watch_ms FROM daily_watch WHERE date = ?1")?;
        let key = date.format(DATE_FORMAT).to_string();
        match stmt.query_row(params![key], |row| row.get::<_, i64>(0)) {
            Ok(ms) => Ok(Some(Duration::from_millis(ms.max(0) as u64))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_daily_record(&mut self, date: NaiveDate, watch_time: Duration) -> Result<(), StorageError> {
        let ms = watch_time.as_millis().min(i64::MAX as u128) as i64;
        self.conn.execute(
            "INSERT OR REPLACE INTO daily_watch (date, watch_ms) VALUES (?1, ?2)",
            params![date.format(DATE_FORMAT).to_string(), ms],
        )?;
        Ok(())
    }

    fn last_reset_date(&self) -> Result<Option<NaiveDate>, StorageError> {
        match self.kv_get(LAST_RESET_KEY)? {
            Some(raw) => Self::parse_date(&raw, LAST_RESET_KEY).map(Some),
            None => Ok(None),
        }
    }

    fn set_last_reset_date(&mut self, date: NaiveDate) -> Result<(), StorageError> {
        self.kv_set(LAST_RESET_KEY, &date.format(DATE_FORMAT).to_string())
    }

    fn history(&self) -> Result<Vec<DailyWatchRecord>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, watch_ms FROM daily_watch ORDER BY date ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (raw_date, ms) = row?;
            let date = Self::parse_date(&raw_date, "daily_watch.date")?;
            records.push(DailyWatchRecord {
                date,
                watch_ms: ms.max(0) as u64,
            });
        }
        Ok(records)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM daily_watch", [])?;
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![LAST_RESET_KEY])?;
        Ok(())
    }
}
