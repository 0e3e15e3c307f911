//! SQLite implementation of `NoteDao`.
//!
//! # Invariants
//! - All statements run under one connection lock.
//! - The live snapshot is refreshed before that lock is released, so
//!   subscribers see snapshots in commit order.
//! - A failed refresh never turns a committed write into an error; the
//!   snapshot is marked stale and refreshed on the next access.

use super::{DaoError, DaoResult, LiveNotes, NoteDao};
use crate::db::schema::write_version;
use crate::db::DbResult;
use crate::model::note::{Note, NoteId};
use log::warn;
use rusqlite::{params, Connection, Row};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

const NOTE_SELECT_ALL_SQL: &str = "SELECT id, title, description, priority
FROM note_table
ORDER BY priority DESC, id ASC;";

const NOTE_INSERT_SQL: &str =
    "INSERT INTO note_table (title, description, priority) VALUES (?1, ?2, ?3);";

/// `NoteDao` over a single shared SQLite connection.
pub struct SqliteNoteDao {
    conn: Mutex<Connection>,
    notes_tx: watch::Sender<Vec<Note>>,
    // Set while `notes_tx` lags behind committed rows; only touched under `conn`.
    stale: AtomicBool,
}

impl SqliteNoteDao {
    /// Wraps a connection whose schema is already prepared.
    pub fn new(conn: Connection) -> DbResult<Self> {
        let initial = select_all(&conn)?;
        let (notes_tx, _) = watch::channel(initial);
        Ok(Self {
            conn: Mutex::new(conn),
            notes_tx,
            stale: AtomicBool::new(false),
        })
    }

    /// Inserts several unsaved notes in one transaction.
    ///
    /// Either every note is written or none is; subscribers see one update.
    pub fn insert_all(&self, notes: &[Note]) -> DaoResult<Vec<NoteId>> {
        self.insert_batch(notes, None)
    }

    /// Inserts the seed rows and stamps the schema version in the same
    /// transaction, so an unseeded table is never marked initialized.
    pub(crate) fn seed_table(&self, notes: &[Note], schema_version: u32) -> DaoResult<Vec<NoteId>> {
        self.insert_batch(notes, Some(schema_version))
    }

    fn insert_batch(&self, notes: &[Note], stamp_version: Option<u32>) -> DaoResult<Vec<NoteId>> {
        for note in notes {
            note.validate_for_insert()?;
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(notes.len());
        {
            let mut stmt = tx.prepare(NOTE_INSERT_SQL)?;
            for note in notes {
                stmt.execute(params![note.title, note.description, note.priority])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        if let Some(version) = stamp_version {
            write_version(&tx, version)?;
        }
        tx.commit()?;

        self.publish(&conn);
        Ok(ids)
    }

    // A panic mid-statement leaves SQLite consistent, so a poisoned lock is
    // still usable.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-reads the table into the live snapshot after a committed write.
    fn publish(&self, conn: &Connection) {
        match select_all(conn) {
            Ok(snapshot) => self.replace_snapshot(snapshot),
            Err(err) => {
                self.stale.store(true, Ordering::Release);
                warn!("event=live_refresh module=dao status=error stale=true error={err}");
            }
        }
    }

    fn replace_snapshot(&self, snapshot: Vec<Note>) {
        self.stale.store(false, Ordering::Release);
        self.notes_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    fn refresh_if_stale(&self, conn: &Connection) {
        if self.stale.load(Ordering::Acquire) {
            self.publish(conn);
        }
    }
}

impl NoteDao for SqliteNoteDao {
    fn insert(&self, note: &Note) -> DaoResult<NoteId> {
        note.validate_for_insert()?;

        let conn = self.lock();
        conn.execute(
            NOTE_INSERT_SQL,
            params![note.title, note.description, note.priority],
        )?;
        let id = conn.last_insert_rowid();

        self.publish(&conn);
        Ok(id)
    }

    fn update(&self, note: &Note) -> DaoResult<()> {
        let id = note.validate_persisted()?;

        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE note_table
             SET
                title = ?2,
                description = ?3,
                priority = ?4
             WHERE id = ?1;",
            params![id, note.title, note.description, note.priority],
        )?;

        if changed == 0 {
            self.refresh_if_stale(&conn);
            return Err(DaoError::NotFound(id));
        }

        self.publish(&conn);
        Ok(())
    }

    fn delete(&self, note: &Note) -> DaoResult<bool> {
        // An unsaved note matches no row.
        if !note.is_persisted() {
            return Ok(false);
        }

        let conn = self.lock();
        let changed = conn.execute("DELETE FROM note_table WHERE id = ?1;", [note.id()])?;
        if changed > 0 {
            self.publish(&conn);
        } else {
            self.refresh_if_stale(&conn);
        }
        Ok(changed > 0)
    }

    fn delete_all(&self) -> DaoResult<usize> {
        let conn = self.lock();
        let changed = conn.execute("DELETE FROM note_table;", [])?;
        if changed > 0 {
            self.publish(&conn);
        } else {
            self.refresh_if_stale(&conn);
        }
        Ok(changed)
    }

    fn get_all(&self) -> DaoResult<Vec<Note>> {
        let conn = self.lock();
        let notes = select_all(&conn)?;
        if self.stale.load(Ordering::Acquire) {
            self.replace_snapshot(notes.clone());
        }
        Ok(notes)
    }

    fn observe_all(&self) -> LiveNotes {
        let conn = self.lock();
        self.refresh_if_stale(&conn);
        LiveNotes::new(self.notes_tx.subscribe())
    }
}

fn select_all(conn: &Connection) -> DbResult<Vec<Note>> {
    let mut stmt = conn.prepare_cached(NOTE_SELECT_ALL_SQL)?;
    let notes = stmt
        .query_map([], parse_note_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notes)
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note::with_id(
        row.get("id")?,
        row.get::<_, String>("title")?,
        row.get::<_, String>("description")?,
        row.get("priority")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::SqliteNoteDao;
    use crate::context::DatabaseConfig;
    use crate::dao::{DaoError, NoteDao};
    use crate::db::schema::{prepare_schema, stored_version};
    use crate::model::note::{Note, NoteValidationError};
    use rusqlite::Connection;

    fn empty_dao() -> SqliteNoteDao {
        let config = DatabaseConfig {
            seed_on_create: false,
            ..DatabaseConfig::default()
        };
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, &config).unwrap();
        SqliteNoteDao::new(conn).unwrap()
    }

    #[test]
    fn insert_rejects_note_with_id() {
        let dao = empty_dao();
        let err = dao.insert(&Note::with_id(3, "t", "d", 1)).unwrap_err();
        assert!(matches!(
            err,
            DaoError::Validation(NoteValidationError::IdAlreadyAssigned(3))
        ));
        assert!(dao.get_all().unwrap().is_empty());
    }

    #[test]
    fn update_requires_existing_row() {
        let dao = empty_dao();
        let err = dao.update(&Note::with_id(42, "t", "d", 1)).unwrap_err();
        assert!(matches!(err, DaoError::NotFound(42)));

        let err = dao.update(&Note::new("t", "d", 1)).unwrap_err();
        assert!(matches!(
            err,
            DaoError::Validation(NoteValidationError::MissingId)
        ));
    }

    #[test]
    fn delete_of_unsaved_note_is_a_noop() {
        let dao = empty_dao();
        dao.insert(&Note::new("kept", "", 1)).unwrap();
        let live = dao.observe_all();

        assert!(matches!(dao.delete(&Note::new("ghost", "", 1)), Ok(false)));
        assert_eq!(dao.get_all().unwrap().len(), 1);
        assert!(!live.has_changed());
    }

    #[test]
    fn insert_all_is_atomic_on_validation_failure() {
        let dao = empty_dao();
        let batch = vec![Note::new("a", "a", 1), Note::with_id(9, "b", "b", 2)];
        assert!(dao.insert_all(&batch).is_err());
        assert!(dao.get_all().unwrap().is_empty());
    }

    #[test]
    fn seed_table_stamps_schema_version_with_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, &DatabaseConfig::default()).unwrap();
        assert_eq!(stored_version(&conn).unwrap(), 0);
        let dao = SqliteNoteDao::new(conn).unwrap();

        dao.seed_table(&[Note::new("a", "", 1)], 1).unwrap();
        assert_eq!(stored_version(&dao.lock()).unwrap(), 1);
        assert_eq!(dao.get_all().unwrap().len(), 1);
    }

    #[test]
    fn noop_mutations_do_not_emit() {
        let dao = empty_dao();
        let live = dao.observe_all();
        assert!(!dao.delete(&Note::with_id(5, "t", "d", 1)).unwrap());
        assert_eq!(dao.delete_all().unwrap(), 0);
        assert!(!live.has_changed());
    }

    #[test]
    fn failed_refresh_keeps_write_result_and_recovers_later() {
        let dao = empty_dao();
        // Pushes the stored priority out of `i32` range so the re-read fails.
        dao.lock()
            .execute_batch(
                "CREATE TRIGGER widen_priority AFTER INSERT ON note_table
                 WHEN NEW.title = 'wide'
                 BEGIN
                    UPDATE note_table SET priority = 9999999999 WHERE id = NEW.id;
                 END;",
            )
            .unwrap();
        let live = dao.observe_all();

        let id = dao.insert(&Note::new("wide", "", 1)).unwrap();
        assert!(id > 0);
        assert!(live.snapshot().is_empty());
        assert!(dao.get_all().is_err());

        dao.lock()
            .execute("UPDATE note_table SET priority = 2 WHERE id = ?1;", [id])
            .unwrap();
        let notes = dao.get_all().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(live.snapshot(), notes);
        assert!(live.has_changed());
    }
}
