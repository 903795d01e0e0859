//! Repository layer for the entry table.
//!
//! # Responsibility
//! - Keep SQL text and row decoding out of the façade.
//!
//! # Invariants
//! - Repositories never open connections; callers pass one in, possibly a
//!   transaction.

pub mod entry_repo;
