//! Domain model for the exam entry table.
//!
//! # Invariants
//! - Every entry is identified by a store-assigned `EntryId`.
//! - Entries are hard-deleted; there are no tombstones.

pub mod entry;
