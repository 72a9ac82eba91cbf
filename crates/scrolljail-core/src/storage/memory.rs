//! In-process watch store.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;

use super::{DailyWatchRecord, WatchStore};
use crate::error::StorageError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<NaiveDate, Duration>,
    last_reset: Option<NaiveDate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchStore for MemoryStore {
    fn daily_record(&self, date: NaiveDate) -> Result<Option<Duration>, StorageError> {
        Ok(self.records.get(&date).copied())
    }

    fn set_daily_record(&mut self, date: NaiveDate, watch_time: Duration) -> Result<(), StorageError> {
        self.records.insert(date, watch_time);
        Ok(())
    }

    fn last_reset_date(&self) -> Result<Option<NaiveDate>, StorageError> {
        Ok(self.last_reset)
    }

    fn set_last_reset_date(&mut self, date: NaiveDate) -> Result<(), StorageError> {
        self.last_reset = Some(date);
        Ok(())
    }

    fn history(&self) -> Result<Vec<DailyWatchRecord>, StorageError> {
        Ok(self
            .records
            .iter()
            .map(|(date, watch)| DailyWatchRecord::new(*date, *watch))
            .collect())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.records.clear();
        self.last_reset = None;
        Ok(())
    }
}
