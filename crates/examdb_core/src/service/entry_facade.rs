//! Entry façade: the four whole-table-return operations.
//!
//! # Responsibility
//! - Translate insert/select/update/delete into repository calls.
//! - Answer every call with the full table contents after the operation.
//!
//! # Invariants
//! - Each mutating call runs one mutation and one full read in a single
//!   immediate transaction; on any failure nothing is committed and no
//!   sequence is returned.
//! - Nothing is cached between calls.
//! - `update` rewrites every row; `delete` removes every exact match. Neither
//!   is scoped by id.

use crate::db::{get_instance, DbConfig, DbError, DbHelper};
use crate::model::entry::Entry;
use crate::repo::entry_repo::{EntryRepository, RepoError, SqliteEntryRepository};
use log::{debug, error};
use rusqlite::TransactionBehavior;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type FacadeResult<T> = Result<T, FacadeError>;

/// Failure of one façade call. Never produced alongside a partial result.
///
/// Every `&str` is a valid value, so there is no argument-rejection variant.
#[derive(Debug)]
pub enum FacadeError {
    /// The store could not be opened, configured or locked.
    StoreUnavailable(DbError),
    /// Table creation or a version hook failed.
    Schema(DbError),
    /// A statement against the entry table failed.
    Repo(RepoError),
}

impl Display for FacadeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FacadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<DbError> for FacadeError {
    fn from(value: DbError) -> Self {
        match value {
            schema @ DbError::Schema(_) => Self::Schema(schema),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<RepoError> for FacadeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for FacadeError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Insert,
    Update,
    Delete,
}

impl Mutation {
    fn event(self) -> &'static str {
        match self {
            Self::Insert => "entry_insert",
            Self::Update => "entry_update",
            Self::Delete => "entry_delete",
        }
    }
}

/// Persistence façade over the entry table.
///
/// Cheap to clone; clones share the same helper.
#[derive(Debug, Clone)]
pub struct ExamDbFacade {
    helper: Arc<DbHelper>,
}

impl ExamDbFacade {
    /// Builds a façade over an explicitly constructed helper.
    pub fn new(helper: Arc<DbHelper>) -> Self {
        Self { helper }
    }

    /// Builds a façade over the process-wide shared helper.
    ///
    /// `init_config` only takes effect on the first call in the process.
    pub fn shared(init_config: DbConfig) -> Self {
        Self::new(get_instance(init_config))
    }

    pub fn helper(&self) -> &Arc<DbHelper> {
        &self.helper
    }

    /// Appends `value` and returns the full table.
    ///
    /// Empty strings are accepted; non-emptiness is a caller concern.
    pub fn insert(&self, value: &str) -> FacadeResult<Vec<String>> {
        self.mutate(Mutation::Insert, value, |repo| {
            repo.insert_entry(value).map(|_| 1)
        })
    }

    /// Returns every entry's text in insertion order.
    pub fn select(&self) -> FacadeResult<Vec<String>> {
        let started_at = Instant::now();
        let conn = self.helper.open_for_read()?;
        let repo = SqliteEntryRepository::new(&conn, self.helper.table_name());
        let entries = repo.list_entries().inspect_err(|err| {
            error!("event=entry_select module=service status=error error={err}");
        })?;
        debug!(
            "event=entry_select module=service status=ok rows={} duration_ms={}",
            entries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(into_values(entries))
    }

    /// Rewrites every row to `value` and returns the full table.
    pub fn update(&self, value: &str) -> FacadeResult<Vec<String>> {
        self.mutate(Mutation::Update, value, |repo| repo.update_all(value))
    }

    /// Removes every row equal to `value` and returns the full table.
    pub fn delete(&self, value: &str) -> FacadeResult<Vec<String>> {
        self.mutate(Mutation::Delete, value, |repo| repo.delete_matching(value))
    }

    fn mutate(
        &self,
        mutation: Mutation,
        value: &str,
        apply: impl FnOnce(&SqliteEntryRepository<'_>) -> Result<usize, RepoError>,
    ) -> FacadeResult<Vec<String>> {
        let started_at = Instant::now();

        let mut conn = self.helper.open_for_write()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| FacadeError::StoreUnavailable(DbError::Sqlite(err)))?;

        let repo = SqliteEntryRepository::new(&tx, self.helper.table_name());
        let outcome = apply(&repo).and_then(|affected| Ok((affected, repo.list_entries()?)));
        drop(repo);
        let (affected, entries) = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "event={} module=service status=error duration_ms={} error={}",
                    mutation.event(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };
        tx.commit()?;

        debug!(
            "event={} module=service status=ok value_len={} affected={} rows={} duration_ms={}",
            mutation.event(),
            value.len(),
            affected,
            entries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(into_values(entries))
    }
}

fn into_values(entries: Vec<Entry>) -> Vec<String> {
    entries.into_iter().map(Entry::into_data).collect()
}
