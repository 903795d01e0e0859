//! Persistence façade over a single SQLite table of free-text entries.
//!
//! `db` owns the file lifecycle and schema; `service` exposes the
//! insert/select/update/delete operations, each answering with the whole table.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{get_instance, DbConfig, DbError, DbHelper, DbResult, ExamDbSchema, SchemaHooks};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{Entry, EntryId};
pub use repo::entry_repo::{EntryRepository, RepoError, RepoResult, SqliteEntryRepository};
pub use service::entry_facade::{ExamDbFacade, FacadeError, FacadeResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
