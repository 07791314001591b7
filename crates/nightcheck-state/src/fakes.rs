//! In-memory fake for [`ErrorStore`] (testing only)
//!
//! `MemoryErrorStore` satisfies the trait contract without a database and
//! can be told to reject inserts for specific callers, which exercises the
//! pipeline's keep-going policy on insert failure.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory result table backed by a `Vec<ErrorRow>`.
#[derive(Debug, Default)]
pub struct MemoryErrorStore {
    rows: Mutex<Vec<ErrorRow>>,
    failing_callers: Mutex<HashSet<String>>,
}

impl MemoryErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert for `caller` fail with a backend error.
    pub fn fail_inserts_for(&self, caller: impl Into<String>) {
        self.failing_callers.lock().unwrap().insert(caller.into());
    }

    /// Snapshot of every stored row, in insertion order.
    pub fn all_rows(&self) -> Vec<ErrorRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ErrorStore for MemoryErrorStore {
    async fn insert(&self, row: ErrorRow) -> StorageResult<()> {
        row.validate()?;
        if self.failing_callers.lock().unwrap().contains(&row.caller) {
            return Err(StorageError::Backend(format!(
                "insert rejected for {}",
                row.caller
            )));
        }
        self.rows.lock().unwrap().push(row);
        Ok(())
    }

    async fn rows_on(&self, date: NaiveDate) -> StorageResult<Vec<ErrorRow>> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<ErrorRow> = rows
            .iter()
            .filter(|r| r.timestamp.date_naive() == date)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }

    async fn oldest_timestamp(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().map(|r| r.timestamp).min())
    }

    async fn truncate(&self) -> StorageResult<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}
