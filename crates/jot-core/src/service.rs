//! Notes facade
//!
//! Single entry point for note operations. Callers never see the
//! online/offline branching: every mutation tries the remote store
//! first and falls back to the local store plus the mutation queue
//! when the remote is unavailable, so note mutations always succeed
//! optimistically from the caller's perspective.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, MutationQueue, NoteStore};
use crate::error::{Error, Result};
use crate::models::{extract_tags, Mutation, Note, NoteId, NotePatch};
use crate::remote::RemoteStore;
use crate::sync::{SyncEngine, SyncOutcome};
use crate::util::{clamp_chars, Clock, SystemClock};

/// Field limits applied at the facade boundary, matching the remote
/// store's document schema.
const MAX_OWNER_CHARS: usize = 255;
const MAX_TITLE_CHARS: usize = 500;
const MAX_CONTENT_CHARS: usize = 10_000;

/// Source of locally generated note ids, injectable for tests.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> NoteId;
}

/// UUID v7 id source used everywhere outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_id(&self) -> NoteId {
        NoteId::new()
    }
}

/// Thread-safe facade over the local store, mutation queue, sync
/// engine, and remote client.
///
/// Explicitly constructed with its collaborators; there is no global
/// instance anywhere in the crate.
#[derive(Clone)]
pub struct NotesService<R> {
    db: Arc<Mutex<Database>>,
    remote: R,
    ids: Arc<dyn IdSource>,
    clock: Arc<dyn Clock>,
}

impl<R: RemoteStore> NotesService<R> {
    /// Build a service over an already opened database.
    pub fn new(db: Database, remote: R) -> Self {
        Self::with_sources(db, remote, Arc::new(UuidIdSource), Arc::new(SystemClock))
    }

    /// Build a service with explicit id and clock sources.
    pub fn with_sources(
        db: Database,
        remote: R,
        ids: Arc<dyn IdSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            remote,
            ids,
            clock,
        }
    }

    /// Open the database at the given filesystem path and build a
    /// service over it, creating parent directories as needed.
    pub async fn open_path(db_path: impl Into<PathBuf>, remote: R) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(&db_path).await?;
        Ok(Self::new(db, remote))
    }

    /// Create a note, online when possible.
    ///
    /// Tags are derived from the content. On remote success the remote
    /// record is written through to the local store; on any remote
    /// failure the note is built locally with a generated id, saved,
    /// and a `create` mutation is queued. Both paths return a fully
    /// formed note - the caller cannot tell them apart.
    pub async fn create_note(&self, owner_id: &str, title: &str, content: &str) -> Result<Note> {
        let owner_id = clamp_chars(owner_id.trim(), MAX_OWNER_CHARS);
        if owner_id.is_empty() {
            return Err(Error::InvalidInput("owner id must not be empty".into()));
        }

        let now = self.clock.now_ms();
        let candidate = Note::new(
            self.ids.next_id(),
            owner_id,
            clamp_chars(title, MAX_TITLE_CHARS),
            clamp_chars(content, MAX_CONTENT_CHARS),
            now,
        );

        match self.remote.create_note(&candidate).await {
            Ok(note) => {
                let db = self.db.lock().await;
                NoteStore::new(db.connection()).save_note(&note, now).await?;
                Ok(note)
            }
            Err(error) => {
                tracing::debug!(note_id = %candidate.id, %error, "creating note offline");
                let db = self.db.lock().await;
                let conn = db.connection();
                // Local write happens-before the enqueue: a crash in
                // between leaves the data correct and the entry missing.
                NoteStore::new(conn).save_note(&candidate, now).await?;
                MutationQueue::new(conn)
                    .enqueue(
                        &Mutation::Create {
                            note: candidate.clone(),
                        },
                        now,
                    )
                    .await?;
                Ok(candidate)
            }
        }
    }

    /// Apply a partial update to a note, online when possible.
    ///
    /// A content change re-derives the tags, overriding any tags the
    /// patch carried. Returns `None` only when the note exists neither
    /// remotely nor locally.
    pub async fn update_note(&self, note_id: NoteId, mut patch: NotePatch) -> Result<Option<Note>> {
        if let Some(content) = patch.content.take() {
            let content = clamp_chars(&content, MAX_CONTENT_CHARS);
            patch.tags = Some(extract_tags(&content));
            patch.content = Some(content);
        }
        if let Some(title) = patch.title.take() {
            patch.title = Some(clamp_chars(&title, MAX_TITLE_CHARS));
        }

        let now = self.clock.now_ms();
        match self.remote.update_note(note_id, &patch).await {
            Ok(note) => {
                let db = self.db.lock().await;
                NoteStore::new(db.connection()).save_note(&note, now).await?;
                Ok(Some(note))
            }
            Err(error) => {
                tracing::debug!(%note_id, %error, "updating note offline");
                let db = self.db.lock().await;
                let conn = db.connection();
                let store = NoteStore::new(conn);

                let Some(local) = store.get_note(note_id).await? else {
                    return Ok(None);
                };

                let mut note = local.note;
                note.apply(&patch);
                note.updated_at = now;
                store.save_note(&note, now).await?;
                MutationQueue::new(conn)
                    .enqueue(&Mutation::Update { note_id, patch }, now)
                    .await?;
                Ok(Some(note))
            }
        }
    }

    /// Soft-delete a note - the only delete mechanism.
    ///
    /// Never surfaces a remote failure: the flag is applied locally and
    /// queued instead. Only a local store fault can error.
    pub async fn delete_note(&self, note_id: NoteId) -> Result<bool> {
        let now = self.clock.now_ms();
        match self
            .remote
            .update_note(note_id, &NotePatch::soft_delete())
            .await
        {
            Ok(note) => {
                let db = self.db.lock().await;
                NoteStore::new(db.connection()).save_note(&note, now).await?;
                Ok(true)
            }
            Err(error) => {
                tracing::debug!(%note_id, %error, "deleting note offline");
                let db = self.db.lock().await;
                let conn = db.connection();
                let store = NoteStore::new(conn);

                if let Some(local) = store.get_note(note_id).await? {
                    let mut note = local.note;
                    note.is_deleted = true;
                    note.updated_at = now;
                    store.save_note(&note, now).await?;
                    MutationQueue::new(conn)
                        .enqueue(&Mutation::Delete { note_id }, now)
                        .await?;
                }
                Ok(true)
            }
        }
    }

    /// Merged remote and local view of an owner's notes, newest first.
    pub async fn get_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        SyncEngine::new(db.connection(), &self.remote, self.clock.as_ref())
            .merged_notes(owner_id)
            .await
    }

    /// Run one sync pass: replay the mutation queue against the remote
    /// store.
    pub async fn sync_notes(&self, owner_id: &str) -> Result<SyncOutcome> {
        let db = self.db.lock().await;
        SyncEngine::new(db.connection(), &self.remote, self.clock.as_ref())
            .drain(owner_id)
            .await
    }

    /// Number of queued mutations awaiting remote confirmation.
    pub async fn pending_mutations(&self) -> Result<usize> {
        let db = self.db.lock().await;
        MutationQueue::new(db.connection()).len().await
    }
}
