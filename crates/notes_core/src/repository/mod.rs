//! Caller-facing note repository.
//!
//! # Responsibility
//! - Keep storage mutations off the calling thread.
//! - Republish the DAO's live note stream unchanged.
//!
//! # Invariants
//! - Mutations run one at a time, in the order they were submitted.
//! - Mutation failures are logged, never returned to the caller.

mod note_repository;
mod worker;

pub use note_repository::NoteRepository;
