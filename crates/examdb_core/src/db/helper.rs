//! Shared database helper: lazy schema bootstrap plus read/write handles.
//!
//! # Responsibility
//! - Hold the store configuration and schema hooks for one database file.
//! - Run the schema bootstrap once, on first access.
//! - Hand out per-call connections; serialize writers.
//!
//! # Invariants
//! - `get_instance` constructs at most one helper per process.
//! - A `WriteConnection` holds the writer lock until it is dropped.
//! - Readers never wait on the writer lock.

use super::open::{open_connection, OpenMode};
use super::schema::{bootstrap_schema, ExamDbSchema, SchemaHooks};
use super::{DbConfig, DbResult};
use log::info;
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static SHARED_HELPER: OnceCell<Arc<DbHelper>> = OnceCell::new();

/// Returns the process-wide helper, constructing it from `init_config` on the
/// first call.
///
/// Later calls return the same instance and ignore their argument. Concurrent
/// first calls are serialized by the cell, so only one helper is ever built.
/// Construction does not touch the file; errors surface on first open.
pub fn get_instance(init_config: DbConfig) -> Arc<DbHelper> {
    SHARED_HELPER
        .get_or_init(|| {
            info!(
                "event=helper_init module=db status=ok table={} version={}",
                init_config.table_name, init_config.version
            );
            Arc::new(DbHelper::new(init_config))
        })
        .clone()
}

/// Owner of one database file's lifecycle.
pub struct DbHelper {
    config: DbConfig,
    hooks: Box<dyn SchemaHooks>,
    schema_ready: OnceCell<()>,
    write_lock: Mutex<()>,
}

impl DbHelper {
    /// Creates a helper with the default [`ExamDbSchema`] hooks.
    pub fn new(config: DbConfig) -> Self {
        Self::with_hooks(config, ExamDbSchema)
    }

    /// Creates a helper with caller-supplied schema hooks.
    pub fn with_hooks(config: DbConfig, hooks: impl SchemaHooks + 'static) -> Self {
        Self {
            config,
            hooks: Box::new(hooks),
            schema_ready: OnceCell::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn database_path(&self) -> &Path {
        &self.config.path
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Opens a query-only connection.
    pub fn open_for_read(&self) -> DbResult<ReadConnection> {
        self.ensure_schema()?;
        let conn = open_connection(&self.config, OpenMode::Read)?;
        Ok(ReadConnection { conn })
    }

    /// Opens a write connection, blocking until no other writer of this
    /// helper is active.
    pub fn open_for_write(&self) -> DbResult<WriteConnection<'_>> {
        self.ensure_schema()?;
        let guard = self.lock_writer();
        let conn = open_connection(&self.config, OpenMode::Write)?;
        Ok(WriteConnection {
            conn,
            _guard: guard,
        })
    }

    fn ensure_schema(&self) -> DbResult<()> {
        self.schema_ready
            .get_or_try_init(|| -> DbResult<()> {
                self.config.validate()?;
                let started_at = Instant::now();
                let _guard = self.lock_writer();
                let mut conn = open_connection(&self.config, OpenMode::Write)?;
                bootstrap_schema(&mut conn, &self.config, self.hooks.as_ref())?;
                info!(
                    "event=schema_ready module=db status=ok table={} duration_ms={}",
                    self.config.table_name,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            })
            .map(|_| ())
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so a panicked writer leaves nothing to repair.
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DbHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHelper")
            .field("config", &self.config)
            .field("schema_ready", &self.schema_ready.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Query-only connection scoped to one call.
#[derive(Debug)]
pub struct ReadConnection {
    conn: Connection,
}

impl Deref for ReadConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

/// Write connection that keeps the helper's writer lock while alive.
#[derive(Debug)]
pub struct WriteConnection<'helper> {
    conn: Connection,
    _guard: MutexGuard<'helper, ()>,
}

impl Deref for WriteConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for WriteConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::DbHelper;
    use crate::db::{DbConfig, DbError};
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn first_read_creates_file_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let helper = DbHelper::new(DbConfig::at_path(dir.path().join("ExamDb.db")));

        let conn = helper.open_for_read().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ExamDb;", [], |row| row.get(0))
            .unwrap();

        assert_eq!(count, 0);
        assert!(helper.database_path().exists());
    }

    #[test]
    fn invalid_config_fails_on_first_open_not_on_construction() {
        let dir = tempfile::tempdir().unwrap();
        let helper =
            DbHelper::new(DbConfig::at_path(dir.path().join("bad.db")).with_table_name("1bad"));

        let err = helper.open_for_write().unwrap_err();

        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[test]
    fn unopenable_location_is_reported_as_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let helper = DbHelper::new(DbConfig::at_path(dir.path().join("no/such/dir/x.db")));

        let err = helper.open_for_read().unwrap_err();

        assert!(matches!(err, DbError::Open { .. }));
    }

    #[test]
    fn readers_are_not_blocked_by_an_open_writer() {
        let dir = tempfile::tempdir().unwrap();
        let helper = Arc::new(DbHelper::new(DbConfig::at_path(dir.path().join("rw.db"))));

        let _writer = helper.open_for_write().unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let reader = {
            let helper = Arc::clone(&helper);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let conn = helper.open_for_read().unwrap();
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM ExamDb;", [], |row| row.get(0))
                    .unwrap();
                barrier.wait();
                count
            })
        };

        barrier.wait();
        assert_eq!(reader.join().unwrap(), 0);
    }
}
