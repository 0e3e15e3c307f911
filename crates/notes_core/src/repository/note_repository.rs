//! Note repository facade.

use super::worker::{WriteJob, WriteWorker};
use crate::dao::{LiveNotes, NoteDao};
use crate::db::NoteDatabase;
use crate::model::note::Note;
use log::{trace, warn};
use std::io;
use std::sync::mpsc;
use std::sync::Arc;

/// Sole entry point for UI-facing note reads and writes.
///
/// Mutations are fire-and-forget: they return as soon as the job is queued
/// and report nothing back. Reads go through `get_all_notes`.
///
/// Two calls do block: `flush`, and dropping the repository, which waits
/// for queued mutations to finish. Keep the repository alive for the
/// lifetime of the UI and drop it off the UI thread.
pub struct NoteRepository {
    all_notes: LiveNotes,
    worker: WriteWorker,
}

impl NoteRepository {
    /// Creates a repository over the database's note DAO.
    pub fn new(database: &NoteDatabase) -> io::Result<Self> {
        Self::with_dao(database.note_dao())
    }

    /// Creates a repository over any `NoteDao` implementation.
    ///
    /// # Errors
    /// - Returns an error when the writer thread cannot be spawned.
    pub fn with_dao(dao: Arc<dyn NoteDao>) -> io::Result<Self> {
        let all_notes = dao.observe_all();
        let worker = WriteWorker::spawn(dao)?;
        Ok(Self { all_notes, worker })
    }

    pub fn insert(&self, note: Note) {
        self.dispatch(WriteJob::Insert(note));
    }

    pub fn update(&self, note: Note) {
        self.dispatch(WriteJob::Update(note));
    }

    pub fn delete(&self, note: Note) {
        self.dispatch(WriteJob::Delete(note));
    }

    pub fn delete_all(&self) {
        self.dispatch(WriteJob::DeleteAll);
    }

    /// Live stream of all notes, `priority` descending.
    pub fn get_all_notes(&self) -> LiveNotes {
        self.all_notes.clone()
    }

    /// Blocks until every mutation submitted before this call has run.
    ///
    /// Meant for tests and shutdown paths; UI code should not call it.
    pub fn flush(&self) {
        let (ack, done) = mpsc::channel();
        if self.worker.submit(WriteJob::Flush(ack)) {
            let _ = done.recv();
        }
    }

    fn dispatch(&self, job: WriteJob) {
        let op = job.label();
        if self.worker.submit(job) {
            trace!("event=repo_dispatch module=repository status=queued op={op}");
        } else {
            warn!("event=repo_dispatch module=repository status=dropped op={op} error=writer_gone");
        }
    }
}
