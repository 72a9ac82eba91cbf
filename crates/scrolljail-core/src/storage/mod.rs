mod config;
pub mod database;
mod memory;

pub use config::{
    Config, InterventionConfig, MascotConfig, ThresholdConfig, TrackingConfig, WeightEntry,
    THRESHOLD_PRESETS_SECS,
};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Total watch time committed for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWatchRecord {
    pub date: NaiveDate,
    pub watch_ms: u64,
}

impl DailyWatchRecord {
    pub fn new(date: NaiveDate, watch_time: Duration) -> Self {
        Self {
            date,
            watch_ms: watch_time.as_millis().min(u64::MAX as u128) as u64,
        }
    }

    pub fn watch_time(&self) -> Duration {
        Duration::from_millis(self.watch_ms)
    }
}

/// Key-value persistence for daily watch time.
///
/// The tracker treats every read failure as "nothing recorded" and every
/// write failure as a logged, non-fatal degradation.
pub trait WatchStore: Send {
    /// Committed watch time for `date`, or `None` if no record exists.
    fn daily_record(&self, date: NaiveDate) -> Result<Option<Duration>, StorageError>;

    fn set_daily_record(&mut self, date: NaiveDate, watch_time: Duration) -> Result<(), StorageError>;

    fn last_reset_date(&self) -> Result<Option<NaiveDate>, StorageError>;

    fn set_last_reset_date(&mut self, date: NaiveDate) -> Result<(), StorageError>;

    /// All records, oldest first.
    fn history(&self) -> Result<Vec<DailyWatchRecord>, StorageError>;

    /// Explicit data reset: drops every record and the reset marker. Other
    /// saved state, such as the streak, is kept.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Returns `~/.config/scrolljail[-dev]/` based on SCROLLJAIL_ENV.
///
/// Set SCROLLJAIL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SCROLLJAIL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("scrolljail-dev")
    } else {
        base_dir.join("scrolljail")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
