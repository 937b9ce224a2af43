//! Remote store boundary
//!
//! The remote store is an external collaborator reached over an
//! unreliable network. Every operation returns an explicit
//! `Result<T, RemoteError>`; the facade pattern-matches on it and
//! treats any error variant uniformly as "unavailable - fall back to
//! the local store". No remote-specific types leak past this module.

mod http;

pub use http::HttpRemoteStore;

use thiserror::Error;

use crate::models::{Note, NoteId, NotePatch};

/// Page size used when listing remote notes
pub const REMOTE_PAGE_LIMIT: usize = 100;

/// Errors from the remote store boundary
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Remote API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Asynchronous client for the remote note store.
///
/// Injected into the facade and sync engine so tests can swap in an
/// in-memory double with a controllable online/offline switch.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Create a note remotely. The note's id travels with it: the
    /// remote store adopts the caller-supplied id, so a note created
    /// offline keeps its locally generated identity once replayed.
    async fn create_note(&self, note: &Note) -> RemoteResult<Note>;

    /// Apply a partial update remotely and return the stored record.
    /// Soft deletion goes through here as `is_deleted = true`.
    async fn update_note(&self, note_id: NoteId, patch: &NotePatch) -> RemoteResult<Note>;

    /// List an owner's notes, most recently updated first, bounded to
    /// `limit` records.
    async fn list_notes(&self, owner_id: &str, limit: usize) -> RemoteResult<Vec<Note>>;
}
