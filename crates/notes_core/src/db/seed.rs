//! Example rows written when `note_table` is created for the first time.

use crate::dao::DaoResult;
use crate::db::DbResult;
use crate::model::note::{Note, NoteId};
use log::{error, info};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const SEED_THREAD_NAME: &str = "note-db-seed";

/// Returns the fixed seed set: `title1..title4` with priorities `1..4`.
pub fn seed_notes() -> Vec<Note> {
    (1..=4)
        .map(|n| Note::new(format!("title{n}"), format!("desc{n}"), n))
        .collect()
}

/// Runs `write` with the seed set on a dedicated background thread.
///
/// Failures are logged and dropped. `write` is expected to stamp the schema
/// version together with the rows, so a failed seed is retried on next open.
pub(crate) fn spawn_seed<F>(write: F) -> DbResult<JoinHandle<()>>
where
    F: FnOnce(&[Note]) -> DaoResult<Vec<NoteId>> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(SEED_THREAD_NAME.to_string())
        .spawn(move || {
            let started_at = Instant::now();
            match write(&seed_notes()) {
                Ok(ids) => info!(
                    "event=db_seed module=db status=ok rows={} duration_ms={}",
                    ids.len(),
                    started_at.elapsed().as_millis()
                ),
                Err(err) => error!(
                    "event=db_seed module=db status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                ),
            }
        })?;
    Ok(handle)
}
