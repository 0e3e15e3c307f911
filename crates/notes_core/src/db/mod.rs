//! Note database handle and SQLite bootstrap.
//!
//! # Responsibility
//! - Own the single process-wide storage connection.
//! - Bring `note_table` to the expected schema version before first use.
//! - Seed example rows when the table is created for the first time.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A version mismatch never migrates data; the table is rebuilt or the
//!   open is refused, depending on `MigrationPolicy`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod database;
mod open;
pub mod schema;
mod seed;

pub use database::NoteDatabase;
pub use schema::SchemaOutcome;
pub use seed::seed_notes;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    SchemaVersionMismatch { db_version: u32, expected: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::SchemaVersionMismatch {
                db_version,
                expected,
            } => write!(
                f,
                "database schema version {db_version} does not match expected {expected}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::SchemaVersionMismatch { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
