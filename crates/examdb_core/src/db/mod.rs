//! SQLite storage lifecycle for the exam entry table.
//!
//! # Responsibility
//! - Resolve and validate store configuration.
//! - Open and configure per-call SQLite connections.
//! - Create the schema on first use and route version changes through hooks.
//! - Own the process-wide shared helper instance.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write entries before the schema bootstrap succeeds.
//! - At most one write connection per helper is live at any time.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod config;
mod helper;
mod open;
pub mod schema;

pub use config::{
    DbConfig, DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_VERSION,
    DEFAULT_TABLE_NAME,
};
pub use helper::{get_instance, DbHelper, ReadConnection, WriteConnection};
pub use open::OpenMode;
pub use schema::{ExamDbSchema, SchemaHooks, COLUMN_DATA, COLUMN_ID};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database file could not be opened or created.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    /// Table creation or a version hook failed.
    Schema(Box<DbError>),
    InvalidConfig(String),
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub(crate) fn schema(err: impl Into<DbError>) -> Self {
        match err.into() {
            already @ Self::Schema(_) => already,
            other => Self::Schema(Box::new(other)),
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "failed to open database `{}`: {source}", path.display())
            }
            Self::Schema(err) => write!(f, "schema bootstrap failed: {err}"),
            Self::InvalidConfig(message) => write!(f, "invalid database config: {message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Schema(err) => Some(err.as_ref()),
            Self::InvalidConfig(_) => None,
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
