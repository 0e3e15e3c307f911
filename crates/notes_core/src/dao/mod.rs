//! Data-access contract for `note_table`.
//!
//! # Responsibility
//! - Declare the permitted note persistence operations.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Writes check note identity before touching SQL.
//! - Every committed change is followed by a fresh snapshot on `observe_all`.

use crate::db::DbError;
use crate::model::note::{Note, NoteId, NoteValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod live;
mod note_dao;

pub use live::LiveNotes;
pub use note_dao::SqliteNoteDao;

pub type DaoResult<T> = Result<T, DaoError>;

/// Error for note persistence operations.
#[derive(Debug)]
pub enum DaoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<NoteValidationError> for DaoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for DaoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DaoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Note persistence operations.
///
/// Implementations are shared between the write worker and readers, so they
/// must do their own locking.
pub trait NoteDao: Send + Sync {
    /// Inserts an unsaved note and returns the id storage assigned to it.
    fn insert(&self, note: &Note) -> DaoResult<NoteId>;
    /// Replaces every field of the row with `note.id()`.
    fn update(&self, note: &Note) -> DaoResult<()>;
    /// Removes the row with `note.id()`. Returns `false` when it was absent,
    /// including when `note` was never saved.
    fn delete(&self, note: &Note) -> DaoResult<bool>;
    /// Removes every row and returns how many were removed.
    fn delete_all(&self) -> DaoResult<usize>;
    /// One-shot read of all notes, `priority DESC` with insertion order as tie-break.
    fn get_all(&self) -> DaoResult<Vec<Note>>;
    /// Live view of `get_all`, re-emitted after each change to the table.
    fn observe_all(&self) -> LiveNotes;
}
