//! Entry domain model.
//!
//! # Invariants
//! - `id` is assigned by SQLite `AUTOINCREMENT` and never reused.
//! - `data` is never null; empty text is allowed.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted row of the entry table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub data: String,
}

impl Entry {
    pub fn into_data(self) -> String {
        self.data
    }
}
