//! Local durable storage for Jot
//!
//! Notes and the mutation queue live in one SQLite database so a single
//! process crash can never leave them on different devices' worth of
//! state. Everything here works without network access.

mod connection;
mod migrations;
mod note_store;
mod queue;

pub use connection::Database;
pub use note_store::NoteStore;
pub use queue::MutationQueue;
