//! Note storage core.
//!
//! A single-table note store: the `Note` entity, the `NoteDao` data-access
//! contract, the process-wide `NoteDatabase` handle and the `NoteRepository`
//! that keeps writes off the calling thread while serving a live read stream.

pub mod context;
pub mod dao;
pub mod db;
pub mod logging;
pub mod model;
pub mod repository;

pub use context::{AppContext, DatabaseConfig, MigrationPolicy, NOTE_SCHEMA_VERSION};
pub use dao::{DaoError, DaoResult, LiveNotes, NoteDao, SqliteNoteDao};
pub use db::{DbError, DbResult, NoteDatabase, SchemaOutcome};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId, NoteValidationError, UNSAVED_NOTE_ID};
pub use repository::NoteRepository;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
