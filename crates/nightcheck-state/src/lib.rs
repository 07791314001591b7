//! nightcheck-state: persistence for NightCheck results
//!
//! Stores one row per checked script per run and answers the daily report
//! queries. The [`ErrorStore`] trait is the seam; [`SurrealErrorStore`] is
//! the SurrealDB backend and [`fakes::MemoryErrorStore`] the test double.

mod error;
pub mod fakes;
pub mod migrations;
pub mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use schema::ERRORS_TABLE;
pub use storage_traits::{
    ErrorRow, ErrorStore, StorageResult, CLEAN_VALUE, DEFAULT_RETENTION_DAYS,
};
pub use surreal_store::SurrealErrorStore;

/// Result type for nightcheck-state operations
pub type Result<T> = std::result::Result<T, StateError>;
