//! jot-core - Core library for Jot
//!
//! This crate contains the offline-first note synchronization core:
//! shared models, the local durable store and mutation queue, the
//! remote-store boundary, the sync engine, and the notes facade that
//! every Jot interface goes through.

pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod service;
pub mod sync;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
pub use models::{extract_tags, LocalNote, Note, NoteId, NotePatch};
pub use service::NotesService;
