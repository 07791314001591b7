//! Row shapes for NightCheck SurrealDB tables
//!
//! Tables:
//! - night_check_errors: one row per checked script per run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_traits::ErrorRow;

/// Result table name.
pub const ERRORS_TABLE: &str = "night_check_errors";

/// Module for serializing chrono DateTime to SurrealDB datetime format
pub(crate) mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Database row for `night_check_errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRowRecord {
    /// SurrealDB record ID
    pub id: Option<surrealdb::sql::Thing>,
    pub caller: String,
    pub syntax_err: String,
    pub runtime_err: String,
    #[serde(with = "surreal_datetime")]
    pub timestamp: DateTime<Utc>,
}

impl From<ErrorRow> for ErrorRowRecord {
    fn from(row: ErrorRow) -> Self {
        ErrorRowRecord {
            id: None,
            caller: row.caller,
            syntax_err: row.syntax_err,
            runtime_err: row.runtime_err,
            timestamp: row.timestamp,
        }
    }
}

impl From<ErrorRowRecord> for ErrorRow {
    fn from(record: ErrorRowRecord) -> Self {
        ErrorRow {
            caller: record.caller,
            syntax_err: record.syntax_err,
            runtime_err: record.runtime_err,
            timestamp: record.timestamp,
        }
    }
}
