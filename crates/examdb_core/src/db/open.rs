//! Per-call connection bootstrap.
//!
//! # Responsibility
//! - Open the configured database file in read or write mode.
//! - Apply connection pragmas required by the single-writer/multi-reader model.
//!
//! # Invariants
//! - Write connections may create the file and put it in WAL journal mode.
//! - Read connections never create the file and have `query_only=ON`.

use super::{DbConfig, DbError, DbResult};
use log::{debug, error};
use rusqlite::{Connection, OpenFlags};
use std::time::{Duration, Instant};

/// Access mode requested from the schema manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

impl OpenMode {
    fn label(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            Self::Read => base,
            Self::Write => base | OpenFlags::SQLITE_OPEN_CREATE,
        }
    }
}

/// Opens one connection to the configured file.
///
/// # Side effects
/// - Emits `db_open` logging events with mode, duration and status.
pub(crate) fn open_connection(config: &DbConfig, mode: OpenMode) -> DbResult<Connection> {
    let started_at = Instant::now();
    debug!("event=db_open module=db status=start mode={}", mode.label());

    let conn = match Connection::open_with_flags(&config.path, mode.flags()) {
        Ok(conn) => conn,
        Err(source) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode.label(),
                started_at.elapsed().as_millis(),
                source
            );
            return Err(DbError::Open {
                path: config.path.clone(),
                source,
            });
        }
    };

    match configure_connection(&conn, config, mode) {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode.label(),
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_configure_failed error={}",
                mode.label(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &Connection, config: &DbConfig, mode: OpenMode) -> DbResult<()> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    match mode {
        OpenMode::Write => {
            let _: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }
        OpenMode::Read => {
            conn.execute_batch("PRAGMA query_only = ON;")?;
        }
    }
    Ok(())
}
