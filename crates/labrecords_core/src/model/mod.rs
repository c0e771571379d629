//! Domain model for lab records.
//!
//! # Responsibility
//! - Define the base record field group every persisted entity embeds.
//! - Define concrete entities stored by the record store.
//!
//! # Invariants
//! - Every entity is identified by a stable `RecordId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod record;
pub mod student;
