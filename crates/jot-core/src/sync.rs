//! Sync engine
//!
//! Reconciles the local and remote views of a user's notes and drains
//! the mutation queue. Invocation is caller-driven (a reconnect event,
//! a CLI `sync` run): the engine has no timer, no backoff, and no
//! internal timeout of its own.

use std::collections::HashSet;

use libsql::Connection;
use serde::Serialize;

use crate::db::{MutationQueue, NoteStore};
use crate::error::Result;
use crate::models::{Mutation, Note, NoteId, NotePatch};
use crate::remote::{RemoteStore, REMOTE_PAGE_LIMIT};
use crate::util::Clock;

/// What one sync pass accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Queue entries confirmed by the remote store and removed
    pub applied: usize,
    /// Entries that failed again and stay queued
    pub failed: usize,
    /// Entries still pending after this pass
    pub remaining: usize,
}

/// Reconciliation logic over one connection and one remote client.
pub struct SyncEngine<'a, R> {
    conn: &'a Connection,
    remote: &'a R,
    clock: &'a dyn Clock,
}

impl<'a, R: RemoteStore> SyncEngine<'a, R> {
    pub const fn new(conn: &'a Connection, remote: &'a R, clock: &'a dyn Clock) -> Self {
        Self {
            conn,
            remote,
            clock,
        }
    }

    /// Merge the remote and local views of an owner's notes.
    ///
    /// The remote fetch is authoritative: every note it returns is
    /// written through to the local store and marked synced, so remote
    /// data always overwrites local data for notes that exist remotely
    /// (last-remote-write-wins; concurrent edits from another device
    /// are not reconciled per field). Local notes whose id the fetch
    /// did not return - offline creations not yet replayed - are
    /// appended. Result is sorted by `updated_at` descending.
    pub async fn merged_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        let store = NoteStore::new(self.conn);

        let mut merged: Vec<Note> = Vec::new();
        let mut remote_ids: HashSet<NoteId> = HashSet::new();

        match self.remote.list_notes(owner_id, REMOTE_PAGE_LIMIT).await {
            Ok(remote_notes) => {
                for note in &remote_notes {
                    store.save_note(note, self.clock.now_ms()).await?;
                    store.mark_synced(note.id, self.clock.now_ms()).await?;
                }
                remote_ids = remote_notes.iter().map(|note| note.id).collect();
                merged = remote_notes;
            }
            Err(error) => {
                tracing::debug!(owner_id, %error, "remote list unavailable, serving local notes");
            }
        }

        // The local read happens whether or not the fetch succeeded.
        for local in store.get_notes(owner_id).await? {
            if !remote_ids.contains(&local.note.id) {
                merged.push(local.note);
            }
        }

        merged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(merged)
    }

    /// Replay the mutation queue against the remote store, FIFO.
    ///
    /// A failing entry is left queued with its retry counter bumped and
    /// never blocks the entries behind it. Retries recur only when the
    /// caller invokes another pass.
    pub async fn drain(&self, owner_id: &str) -> Result<SyncOutcome> {
        let store = NoteStore::new(self.conn);
        let queue = MutationQueue::new(self.conn);

        // Informational only; the authoritative work list is the queue.
        let dirty = store.get_dirty_notes(owner_id).await?;
        let entries = queue.entries().await?;
        tracing::debug!(
            owner_id,
            dirty = dirty.len(),
            queued = entries.len(),
            "starting sync pass"
        );

        let mut outcome = SyncOutcome::default();
        for entry in entries {
            let note_id = entry.mutation.note_id();
            let replayed = match &entry.mutation {
                Mutation::Create { note } => self.remote.create_note(note).await,
                Mutation::Update { note_id, patch } => {
                    self.remote.update_note(*note_id, patch).await
                }
                Mutation::Delete { note_id } => {
                    self.remote
                        .update_note(*note_id, &NotePatch::soft_delete())
                        .await
                }
            };

            match replayed {
                Ok(_) => {
                    queue.remove(entry.id).await?;
                    store.mark_synced(note_id, self.clock.now_ms()).await?;
                    outcome.applied += 1;
                }
                Err(error) => {
                    queue.record_failure(entry.id).await?;
                    tracing::warn!(
                        entry_id = entry.id,
                        %note_id,
                        kind = %entry.mutation.kind(),
                        retries = entry.retries + 1,
                        %error,
                        "queued mutation failed to replay, leaving in place"
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome.remaining = queue.len().await?;
        Ok(outcome)
    }
}
