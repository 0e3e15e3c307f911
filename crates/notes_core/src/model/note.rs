//! Note entity.
//!
//! # Responsibility
//! - Define the record stored in `note_table`.
//! - Guard the identity rules checked before writes.
//!
//! # Invariants
//! - `id` is assigned by storage on first insert and never chosen by callers.
//! - `id == UNSAVED_NOTE_ID` means the note has not been persisted yet.
//! - Updates replace the whole record; there is no partial-field update.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned row identifier (`note_table.id`).
pub type NoteId = i64;

/// Sentinel id carried by notes that were never inserted.
pub const UNSAVED_NOTE_ID: NoteId = 0;

/// Identity violations detected before a note reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Insert was called with a note that already owns a row id.
    IdAlreadyAssigned(NoteId),
    /// Update/delete was called with a note that was never persisted.
    MissingId,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdAlreadyAssigned(id) => {
                write!(f, "note already has id {id}; insert expects an unsaved note")
            }
            Self::MissingId => write!(f, "note has no id; it must be inserted first"),
        }
    }
}

impl Error for NoteValidationError {}

/// A single note row.
///
/// Sorted for display by `priority` (highest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    pub title: String,
    pub description: String,
    pub priority: i32,
}

impl Note {
    /// Creates an unsaved note. Storage assigns the id on insert.
    pub fn new(title: impl Into<String>, description: impl Into<String>, priority: i32) -> Self {
        Self::with_id(UNSAVED_NOTE_ID, title, description, priority)
    }

    /// Creates a note bound to an existing row id.
    ///
    /// Used to build full-record replacements for `update` and row
    /// references for `delete`.
    pub fn with_id(
        id: NoteId,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            priority,
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    /// Returns whether storage has assigned an id to this note.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_NOTE_ID
    }

    /// Checks that this note may be inserted as a new row.
    pub fn validate_for_insert(&self) -> Result<(), NoteValidationError> {
        if self.is_persisted() {
            return Err(NoteValidationError::IdAlreadyAssigned(self.id));
        }
        Ok(())
    }

    /// Checks that this note references a row (update/delete paths).
    pub fn validate_persisted(&self) -> Result<NoteId, NoteValidationError> {
        if !self.is_persisted() {
            return Err(NoteValidationError::MissingId);
        }
        Ok(self.id)
    }
}
