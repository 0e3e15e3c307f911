//! Process-wide note database handle.
//!
//! # Responsibility
//! - Build exactly one `NoteDatabase` per process on first access.
//! - Hand out the data-access contract backed by the shared connection.
//!
//! # Invariants
//! - Concurrent first callers of `get_instance` all observe the same handle.
//! - Seeding is started only when the schema step reports `Created`; the
//!   file counts as initialized once the seed transaction commits.

use super::open::{open_file, open_memory};
use super::schema::{expected_version, SchemaOutcome};
use super::seed::spawn_seed;
use super::DbResult;
use crate::context::{AppContext, DatabaseConfig};
use crate::dao::{NoteDao, SqliteNoteDao};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

static INSTANCE: OnceCell<NoteDatabase> = OnceCell::new();

/// Owner of the storage connection and its note DAO.
pub struct NoteDatabase {
    dao: Arc<SqliteNoteDao>,
    path: Option<PathBuf>,
    schema_outcome: SchemaOutcome,
    seed_task: Mutex<Option<JoinHandle<()>>>,
}

impl NoteDatabase {
    /// Returns the process-wide database, opening it on first call.
    ///
    /// The first successful call fixes the location; `context` is ignored
    /// afterwards. A failed open is not cached, so a later call retries.
    pub fn get_instance(context: &AppContext) -> DbResult<&'static NoteDatabase> {
        Self::get_instance_with_config(context, &DatabaseConfig::default())
    }

    /// Same as `get_instance`, with explicit open settings for the first call.
    pub fn get_instance_with_config(
        context: &AppContext,
        config: &DatabaseConfig,
    ) -> DbResult<&'static NoteDatabase> {
        INSTANCE.get_or_try_init(|| {
            debug!("event=db_instance module=db status=init");
            Self::open(context.database_path(config), config)
        })
    }

    /// Returns the process-wide database if it was already opened.
    pub fn instance() -> Option<&'static NoteDatabase> {
        INSTANCE.get()
    }

    /// Opens a standalone handle on the file at `path`.
    pub fn open(path: impl AsRef<Path>, config: &DatabaseConfig) -> DbResult<Self> {
        let path = path.as_ref();
        let (conn, outcome) = open_file(path, config)?;
        Self::from_connection(conn, outcome, Some(path.to_path_buf()), config)
    }

    /// Opens a standalone handle on a private in-memory database.
    pub fn open_in_memory(config: &DatabaseConfig) -> DbResult<Self> {
        let (conn, outcome) = open_memory(config)?;
        Self::from_connection(conn, outcome, None, config)
    }

    fn from_connection(
        conn: Connection,
        schema_outcome: SchemaOutcome,
        path: Option<PathBuf>,
        config: &DatabaseConfig,
    ) -> DbResult<Self> {
        let dao = Arc::new(SqliteNoteDao::new(conn)?);
        let seed_task = if config.seed_on_create && schema_outcome == SchemaOutcome::Created {
            let seed_dao = Arc::clone(&dao);
            let version = expected_version(config);
            Some(spawn_seed(move |notes| seed_dao.seed_table(notes, version))?)
        } else {
            None
        };

        Ok(Self {
            dao,
            path,
            schema_outcome,
            seed_task: Mutex::new(seed_task),
        })
    }

    /// Data-access contract over `note_table`.
    pub fn note_dao(&self) -> Arc<dyn NoteDao> {
        self.dao.clone()
    }

    /// Backing file, or `None` for in-memory handles.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_outcome(&self) -> SchemaOutcome {
        self.schema_outcome
    }

    /// Blocks until the seed routine has finished, if one was started.
    pub fn wait_for_seed(&self) {
        let task = self
            .seed_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if task.join().is_err() {
                warn!("event=db_seed module=db status=error error=seed_thread_panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NoteDatabase;
    use crate::context::DatabaseConfig;
    use crate::db::schema::{prepare_schema, stored_version};
    use crate::db::SchemaOutcome;
    use rusqlite::Connection;

    #[test]
    fn in_memory_database_is_seeded_once_created() {
        let database = NoteDatabase::open_in_memory(&DatabaseConfig::default()).unwrap();
        assert_eq!(database.schema_outcome(), SchemaOutcome::Created);
        assert!(database.path().is_none());

        database.wait_for_seed();
        let notes = database.note_dao().get_all().unwrap();
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0].title, "title4");
    }

    #[test]
    fn interrupted_seed_is_retried_on_next_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note_database");

        // Table created, process gone before the seed rows committed.
        let mut conn = Connection::open(&path).unwrap();
        prepare_schema(&mut conn, &DatabaseConfig::default()).unwrap();
        drop(conn);

        let database = NoteDatabase::open(&path, &DatabaseConfig::default()).unwrap();
        assert_eq!(database.schema_outcome(), SchemaOutcome::Created);
        database.wait_for_seed();
        assert_eq!(database.note_dao().get_all().unwrap().len(), 4);
        drop(database);

        let conn = Connection::open(&path).unwrap();
        assert_eq!(stored_version(&conn).unwrap(), 1);
    }

    #[test]
    fn seeding_can_be_disabled() {
        let config = DatabaseConfig {
            seed_on_create: false,
            ..DatabaseConfig::default()
        };
        let database = NoteDatabase::open_in_memory(&config).unwrap();
        database.wait_for_seed();
        assert!(database.note_dao().get_all().unwrap().is_empty());
    }
}
