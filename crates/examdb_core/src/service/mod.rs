//! Caller-facing services.
//!
//! # Responsibility
//! - Expose the entry operations without leaking connection handling.

pub mod entry_facade;
