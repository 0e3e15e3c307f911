//! Domain model for the note store.
//!
//! # Responsibility
//! - Define the single persisted record type and its identity rules.
//!
//! # Invariants
//! - A note is identified by a storage-assigned `NoteId`; `0` means unsaved.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
