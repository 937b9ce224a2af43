//! Data models for Jot

mod mutation;
mod note;

pub use mutation::{Mutation, MutationEntry, MutationKind};
pub use note::{extract_tags, LocalNote, Note, NoteId, NotePatch, DEFAULT_TITLE};
