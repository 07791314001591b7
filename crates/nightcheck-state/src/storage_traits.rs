//! Storage trait for NightCheck results.
//!
//! `ErrorStore` persists one row per checked script per run and answers the
//! two report queries (rows with errors, rows without) for a given day. The
//! trait is async and backend-agnostic; an in-memory fake lives in
//! [`crate::fakes`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Stored value of a verdict with nothing to report.
pub const CLEAN_VALUE: &str = "None";

/// Default age, in days, after which the table is cleared.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// One persisted result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRow {
    /// Absolute path of the checked script.
    pub caller: String,
    /// Syntax verdict text, or [`CLEAN_VALUE`].
    pub syntax_err: String,
    /// Combined runtime verdict text, or [`CLEAN_VALUE`].
    pub runtime_err: String,
    /// When the row was written (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ErrorRow {
    /// Row stamped with the current time.
    pub fn new(
        caller: impl Into<String>,
        syntax_err: impl Into<String>,
        runtime_err: impl Into<String>,
    ) -> Self {
        Self {
            caller: caller.into(),
            syntax_err: syntax_err.into(),
            runtime_err: runtime_err.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether either column carries something other than the clean value.
    pub fn has_errors(&self) -> bool {
        self.syntax_err != CLEAN_VALUE || self.runtime_err != CLEAN_VALUE
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.caller.trim().is_empty() {
            return Err(StorageError::InvalidRow {
                caller: self.caller.clone(),
                reason: "caller must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Persistence for check results.
///
/// Guarantees:
/// - `insert` stores the row as given, including its timestamp.
/// - `rows_on(date)` returns rows whose UTC date is `date`, oldest first.
/// - `truncate` removes every row.
#[async_trait]
pub trait ErrorStore: Send + Sync {
    /// Persist one row.
    async fn insert(&self, row: ErrorRow) -> StorageResult<()>;

    /// Rows written on `date`, ordered by timestamp.
    async fn rows_on(&self, date: NaiveDate) -> StorageResult<Vec<ErrorRow>>;

    /// Timestamp of the oldest row, if any.
    async fn oldest_timestamp(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Remove every row.
    async fn truncate(&self) -> StorageResult<()>;

    /// Rows written on `date` that report a problem.
    async fn errors_on(&self, date: NaiveDate) -> StorageResult<Vec<ErrorRow>> {
        let rows = self.rows_on(date).await?;
        Ok(rows.into_iter().filter(ErrorRow::has_errors).collect())
    }

    /// Rows written on `date` with nothing to report.
    async fn okay_on(&self, date: NaiveDate) -> StorageResult<Vec<ErrorRow>> {
        let rows = self.rows_on(date).await?;
        Ok(rows.into_iter().filter(|r| !r.has_errors()).collect())
    }

    /// Clear the table when its oldest row is more than `max_age_days` days
    /// older than `today`. Returns whether the table was cleared.
    async fn truncate_if_older_than(
        &self,
        today: NaiveDate,
        max_age_days: i64,
    ) -> StorageResult<bool> {
        let Some(oldest) = self.oldest_timestamp().await? else {
            return Ok(false);
        };
        let age = today.signed_duration_since(oldest.date_naive()).num_days();
        if age > max_age_days {
            self.truncate().await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
