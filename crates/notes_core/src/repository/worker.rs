//! Single-consumer write queue feeding the note DAO.

use crate::dao::{DaoResult, NoteDao};
use crate::model::note::Note;
use log::{debug, warn};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "note-repo-writer";

/// One unit of background work.
pub(crate) enum WriteJob {
    Insert(Note),
    Update(Note),
    Delete(Note),
    DeleteAll,
    /// Acknowledged once every job queued before it has run.
    Flush(Sender<()>),
}

impl WriteJob {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::DeleteAll => "delete_all",
            Self::Flush(_) => "flush",
        }
    }
}

/// Owns the writer thread and the sending half of its FIFO queue.
pub(crate) struct WriteWorker {
    queue: Option<Sender<WriteJob>>,
    handle: Option<JoinHandle<()>>,
}

impl WriteWorker {
    pub(crate) fn spawn(dao: Arc<dyn NoteDao>) -> io::Result<Self> {
        let (queue, jobs) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || drain(dao.as_ref(), jobs))?;

        Ok(Self {
            queue: Some(queue),
            handle: Some(handle),
        })
    }

    /// Enqueues `job`. Returns `false` when the writer is gone.
    pub(crate) fn submit(&self, job: WriteJob) -> bool {
        match &self.queue {
            Some(queue) => queue.send(job).is_ok(),
            None => false,
        }
    }
}

impl Drop for WriteWorker {
    fn drop(&mut self) {
        // Closing the queue lets the writer finish pending jobs and exit.
        self.queue.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("event=repo_shutdown module=repository status=error error=writer_panicked");
            }
        }
    }
}

fn drain(dao: &dyn NoteDao, jobs: Receiver<WriteJob>) {
    while let Ok(job) = jobs.recv() {
        run_job(dao, job);
    }
    debug!("event=repo_shutdown module=repository status=ok");
}

fn run_job(dao: &dyn NoteDao, job: WriteJob) {
    let op = job.label();
    let started_at = Instant::now();
    let outcome: DaoResult<String> = match job {
        WriteJob::Insert(note) => dao.insert(&note).map(|id| format!("id={id}")),
        WriteJob::Update(note) => dao.update(&note).map(|()| format!("id={}", note.id())),
        WriteJob::Delete(note) => dao
            .delete(&note)
            .map(|removed| format!("id={} removed={removed}", note.id())),
        WriteJob::DeleteAll => dao.delete_all().map(|count| format!("removed={count}")),
        WriteJob::Flush(ack) => {
            // The flusher may have stopped waiting; nothing to report then.
            let _ = ack.send(());
            return;
        }
    };

    match outcome {
        Ok(detail) => debug!(
            "event=repo_mutation module=repository status=ok op={} {} duration_ms={}",
            op,
            detail,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=repo_mutation module=repository status=error op={} duration_ms={} error={}",
            op,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
