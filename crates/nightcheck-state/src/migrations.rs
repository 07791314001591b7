//! SurrealDB schema initialization for NightCheck

use crate::{Result, StateError};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all NightCheck tables.
///
/// Idempotent: safe to call on every connection.
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing NightCheck SurrealDB schema");
    init_errors_table(db).await?;
    info!("NightCheck schema initialization complete");
    Ok(())
}

/// Initialize `night_check_errors`.
///
/// Schema:
/// ```text
/// TABLE night_check_errors {
///   caller:       STRING (script path, indexed)
///   syntax_err:   STRING ("None" when clean)
///   runtime_err:  STRING ("None" when clean)
///   timestamp:    DATETIME (indexed)
/// }
/// ```
///
/// Rows are append-only per run; the whole table is cleared by the
/// retention rule, so delete is allowed.
async fn init_errors_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing night_check_errors table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS night_check_errors AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update NONE
                FOR delete FULL;

        -- Daily report queries filter on timestamp
        DEFINE INDEX IF NOT EXISTS idx_timestamp ON TABLE night_check_errors COLUMNS timestamp;

        -- Per-script history
        DEFINE INDEX IF NOT EXISTS idx_caller ON TABLE night_check_errors COLUMNS caller;
    "#;

    db.query(sql)
        .await
        .and_then(|response| response.check())
        .map_err(|e| StateError::SchemaSetup(format!("night_check_errors: {}", e)))?;
    info!("✓ night_check_errors table initialized");
    Ok(())
}
