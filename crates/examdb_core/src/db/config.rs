//! Store configuration: file location, table name and schema version.

use super::{DbError, DbResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_NAME: &str = "ExamDb.db";
pub const DEFAULT_TABLE_NAME: &str = "ExamDb";
pub const DEFAULT_DATABASE_VERSION: u32 = 1;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const PATH_ENV: &str = "EXAMDB_PATH";
const VERSION_ENV: &str = "EXAMDB_VERSION";

// The table name is interpolated into SQL text, so it must be a bare identifier.
static TABLE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is a valid regex")
});

/// Configuration used to construct a [`DbHelper`](super::DbHelper).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Database file location.
    pub path: PathBuf,
    /// Name of the entry table.
    pub table_name: String,
    /// Schema version written to `PRAGMA user_version`.
    pub version: u32,
    /// How long a connection waits on a locked file before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_NAME),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            version: DEFAULT_DATABASE_VERSION,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DbConfig {
    /// Default config stored at `path`.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Builds a config from defaults overlaid with `EXAMDB_PATH` and
    /// `EXAMDB_VERSION`.
    ///
    /// Blank variables are ignored; an unparsable version is an error.
    pub fn from_env() -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = read_env(PATH_ENV) {
            config.path = PathBuf::from(raw);
        }
        if let Some(raw) = read_env(VERSION_ENV) {
            config.version = raw.parse::<u32>().map_err(|err| {
                DbError::InvalidConfig(format!("{VERSION_ENV}=`{raw}` is not a version: {err}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the schema manager relies on.
    ///
    /// # Errors
    /// - Empty path.
    /// - Table name that is not a plain SQL identifier.
    /// - Version `0`, which SQLite reserves for "never initialized".
    /// - Version above `i32::MAX`; `user_version` is a signed 32-bit field.
    pub fn validate(&self) -> DbResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DbError::InvalidConfig("path cannot be empty".to_string()));
        }
        if !TABLE_NAME_PATTERN.is_match(&self.table_name) {
            return Err(DbError::InvalidConfig(format!(
                "table name `{}` must match [A-Za-z_][A-Za-z0-9_]*",
                self.table_name
            )));
        }
        if self.version == 0 {
            return Err(DbError::InvalidConfig(
                "version must be at least 1".to_string(),
            ));
        }
        if i32::try_from(self.version).is_err() {
            return Err(DbError::InvalidConfig(format!(
                "version {} exceeds the maximum schema version {}",
                self.version,
                i32::MAX
            )));
        }
        Ok(())
    }
}

fn read_env(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
