//! Live, push-updated view over all notes.
//!
//! # Invariants
//! - A snapshot is always the full table in read order, never a diff.
//! - Slow subscribers may skip intermediate snapshots; the latest one is
//!   never lost.

use crate::model::note::Note;
use tokio::sync::watch;

/// Subscription to the sorted contents of `note_table`.
///
/// The first `next()` yields the current snapshot immediately; later calls
/// wait for the table to change. Cloning creates an independent subscriber
/// that starts again from the current snapshot.
#[derive(Debug)]
pub struct LiveNotes {
    rx: watch::Receiver<Vec<Note>>,
    primed: bool,
}

impl LiveNotes {
    /// Wraps the receiving half of a snapshot channel.
    ///
    /// `NoteDao` implementations own the sender and publish full snapshots.
    pub fn new(rx: watch::Receiver<Vec<Note>>) -> Self {
        Self { rx, primed: false }
    }

    /// Latest committed snapshot. Never blocks and does not mark the
    /// change as seen; only `next()` does.
    pub fn snapshot(&self) -> Vec<Note> {
        self.rx.borrow().clone()
    }

    /// Returns whether the table changed since the last `next()` on this
    /// subscriber (or since it was created). `snapshot()` leaves it set.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Yields the next snapshot, or `None` once the store has shut down.
    pub async fn next(&mut self) -> Option<Vec<Note>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits until a snapshot satisfies `predicate` and returns it.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<Vec<Note>>
    where
        F: FnMut(&[Note]) -> bool,
    {
        loop {
            let notes = self.next().await?;
            if predicate(&notes) {
                return Some(notes);
            }
        }
    }
}

impl Clone for LiveNotes {
    fn clone(&self) -> Self {
        Self::new(self.rx.clone())
    }
}
