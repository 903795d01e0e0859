//! Entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/list/update-all/delete-by-value over the entry table.
//! - Decode rows into [`Entry`] values.
//!
//! # Invariants
//! - Listing returns rows in natural `_id` order.
//! - Update and delete are table-wide: there is no per-id addressing.
//! - Read paths reject undecodable rows instead of masking them.

use crate::db::{DbError, COLUMN_DATA, COLUMN_ID};
use crate::model::entry::{Entry, EntryId};
use rusqlite::{Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the single entry table.
pub trait EntryRepository {
    /// Appends one row and returns its store-assigned id.
    fn insert_entry(&self, data: &str) -> RepoResult<EntryId>;
    /// Returns every row in natural order.
    fn list_entries(&self) -> RepoResult<Vec<Entry>>;
    /// Rewrites `data` on every row. Returns the number of rows changed.
    fn update_all(&self, data: &str) -> RepoResult<usize>;
    /// Removes every row whose `data` equals `data` exactly. Returns the
    /// number of rows removed.
    fn delete_matching(&self, data: &str) -> RepoResult<usize>;
}

/// SQLite-backed entry repository.
///
/// Accepts a plain connection or a transaction (via deref).
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
    insert_sql: String,
    select_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// `table_name` must already be a validated identifier
    /// (see [`DbConfig::validate`](crate::db::DbConfig::validate)).
    pub fn new(conn: &'conn Connection, table_name: &str) -> Self {
        Self {
            conn,
            insert_sql: format!("INSERT INTO \"{table_name}\" ({COLUMN_DATA}) VALUES (?1);"),
            select_sql: format!(
                "SELECT {COLUMN_ID}, {COLUMN_DATA} FROM \"{table_name}\" ORDER BY {COLUMN_ID} ASC;"
            ),
            update_sql: format!("UPDATE \"{table_name}\" SET {COLUMN_DATA} = ?1;"),
            delete_sql: format!("DELETE FROM \"{table_name}\" WHERE {COLUMN_DATA} = ?1;"),
        }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert_entry(&self, data: &str) -> RepoResult<EntryId> {
        self.conn.execute(&self.insert_sql, [data])?;
        Ok(EntryId(self.conn.last_insert_rowid()))
    }

    fn list_entries(&self) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&self.select_sql)?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn update_all(&self, data: &str) -> RepoResult<usize> {
        Ok(self.conn.execute(&self.update_sql, [data])?)
    }

    fn delete_matching(&self, data: &str) -> RepoResult<usize> {
        Ok(self.conn.execute(&self.delete_sql, [data])?)
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let id: i64 = row.get(COLUMN_ID)?;
    let data: Option<String> = row.get(COLUMN_DATA).map_err(|err| {
        RepoError::InvalidData(format!("row {id}: `{COLUMN_DATA}` is not text: {err}"))
    })?;
    let data = data.ok_or_else(|| {
        RepoError::InvalidData(format!("row {id}: `{COLUMN_DATA}` is null"))
    })?;

    Ok(Entry {
        id: EntryId(id),
        data,
    })
}
