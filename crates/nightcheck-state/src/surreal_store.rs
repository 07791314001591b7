//! SurrealDB-backed ErrorStore implementation
//!
//! Uses `schema::ErrorRowRecord` for persistence, converting to/from
//! `storage_traits::ErrorRow` at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use surrealdb::engine::any::Any;
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::{ErrorRowRecord, ERRORS_TABLE};
use crate::storage_traits::{ErrorRow, ErrorStore, StorageResult};

/// Environment variable naming the database endpoint.
pub const DATABASE_URL_ENV: &str = "SURREALDB_URL";

/// Local persistence used when no endpoint is configured.
pub const DEFAULT_LOCAL_PATH: &str = ".nightcheck/db";

const NAMESPACE: &str = "nightcheck";
const DATABASE: &str = "main";

/// SurrealDB-backed implementation of [`ErrorStore`].
pub struct SurrealErrorStore {
    db: Surreal<Any>,
}

impl SurrealErrorStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `nightcheck/main`, and runs `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        let store = Self::connect("mem://").await?;
        info!("SurrealErrorStore connected (in-memory)");
        Ok(store)
    }

    /// Connect to `url` (any engine URL: `mem://`, `surrealkv://path`, `ws://host`).
    pub async fn connect(url: &str) -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    /// Create from environment.
    ///
    /// Uses `SURREALDB_URL` when set, else local persistence under
    /// `.nightcheck/db`.
    pub async fn from_env() -> crate::Result<Self> {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            let store = Self::connect(&url).await?;
            info!("SurrealErrorStore connected ({})", url);
            return Ok(store);
        }

        std::fs::create_dir_all(DEFAULT_LOCAL_PATH).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                DEFAULT_LOCAL_PATH, e
            ))
        })?;
        let url = format!("surrealkv://{}", DEFAULT_LOCAL_PATH);
        info!("No {} found, using local persistence: {}", DATABASE_URL_ENV, url);
        Self::connect(&url).await
    }

    async fn select(
        &self,
        sql: &'static str,
        binds: Vec<(&'static str, SurrealDatetime)>,
    ) -> StorageResult<Vec<ErrorRow>> {
        let mut query = self.db.query(sql);
        for bind in binds {
            query = query.bind(bind);
        }
        let mut res = query
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<ErrorRowRecord> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(ErrorRow::from).collect())
    }
}

#[async_trait]
impl ErrorStore for SurrealErrorStore {
    async fn insert(&self, row: ErrorRow) -> StorageResult<()> {
        row.validate()?;
        debug!(caller = %row.caller, "inserting result row");

        let _created: Option<ErrorRowRecord> = self
            .db
            .create(ERRORS_TABLE)
            .content(ErrorRowRecord::from(row))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn rows_on(&self, date: NaiveDate) -> StorageResult<Vec<ErrorRow>> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1);
        self.select(
            "SELECT * FROM night_check_errors WHERE timestamp >= $start AND timestamp < $end ORDER BY timestamp ASC",
            vec![
                ("start", SurrealDatetime::from(start)),
                ("end", SurrealDatetime::from(end)),
            ],
        )
        .await
    }

    async fn oldest_timestamp(&self) -> StorageResult<Option<DateTime<Utc>>> {
        let rows = self
            .select(
                "SELECT * FROM night_check_errors ORDER BY timestamp ASC LIMIT 1",
                Vec::new(),
            )
            .await?;
        Ok(rows.into_iter().next().map(|r| r.timestamp))
    }

    async fn truncate(&self) -> StorageResult<()> {
        self.db
            .query("DELETE night_check_errors")
            .await
            .and_then(|res| res.check())
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        info!("night_check_errors truncated");
        Ok(())
    }
}
