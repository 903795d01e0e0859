//! Schema creation and version-change routing.
//!
//! # Responsibility
//! - Create the entry table the first time a database file is opened.
//! - Dispatch stored/configured version mismatches to upgrade or downgrade hooks.
//!
//! # Invariants
//! - `user_version = 0` means the file has never been initialized.
//! - After a successful bootstrap `user_version` equals the configured version.
//! - Hook dispatch and the version write commit in the same transaction.

use super::{DbConfig, DbError, DbResult};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};

/// Auto-assigned row identifier column.
pub const COLUMN_ID: &str = "_id";
/// Caller-visible text payload column.
pub const COLUMN_DATA: &str = "data";

/// Lifecycle callbacks invoked while bootstrapping a database file.
///
/// Implementations run inside the bootstrap transaction; returning an error
/// rolls back the hook's work and leaves the stored version untouched.
pub trait SchemaHooks: Send + Sync {
    /// Called once per database file lifetime, when `user_version` is `0`.
    fn on_create(&self, conn: &Connection, config: &DbConfig) -> DbResult<()>;

    /// Called when the stored version is older than the configured one.
    fn on_upgrade(&self, conn: &Connection, old_version: u32, new_version: u32) -> DbResult<()>;

    /// Called when the stored version is newer than the configured one.
    fn on_downgrade(&self, conn: &Connection, old_version: u32, new_version: u32)
        -> DbResult<()>;
}

/// Default hooks: create the single entry table, no migrations yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExamDbSchema;

impl SchemaHooks for ExamDbSchema {
    fn on_create(&self, conn: &Connection, config: &DbConfig) -> DbResult<()> {
        conn.execute_batch(&create_table_sql(&config.table_name))?;
        Ok(())
    }

    fn on_upgrade(&self, _conn: &Connection, _old_version: u32, _new_version: u32) -> DbResult<()> {
        Ok(())
    }

    fn on_downgrade(
        &self,
        _conn: &Connection,
        _old_version: u32,
        _new_version: u32,
    ) -> DbResult<()> {
        Ok(())
    }
}

/// `CREATE TABLE IF NOT EXISTS` statement for the entry table.
pub fn create_table_sql(table_name: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table_name}\" (
            {COLUMN_ID} INTEGER PRIMARY KEY AUTOINCREMENT,
            {COLUMN_DATA} TEXT NOT NULL
        );"
    )
}

/// Brings the connected file to the configured schema version.
pub(crate) fn bootstrap_schema(
    conn: &mut Connection,
    config: &DbConfig,
    hooks: &dyn SchemaHooks,
) -> DbResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let stored = current_user_version(&tx)?;
    let target = config.version;

    if stored == target {
        return Ok(());
    }

    if stored == 0 {
        hooks.on_create(&tx, config).map_err(DbError::schema)?;
        info!(
            "event=schema_create module=db status=ok table={} version={}",
            config.table_name, target
        );
    } else if stored < target {
        hooks
            .on_upgrade(&tx, stored, target)
            .map_err(DbError::schema)?;
        info!("event=schema_upgrade module=db status=ok from={stored} to={target}");
    } else {
        hooks
            .on_downgrade(&tx, stored, target)
            .map_err(DbError::schema)?;
        warn!("event=schema_downgrade module=db status=ok from={stored} to={target}");
    }

    tx.execute_batch(&format!("PRAGMA user_version = {target};"))?;
    tx.commit()?;
    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
