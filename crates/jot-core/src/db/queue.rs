//! Mutation queue
//!
//! Durable FIFO record of operations that could not be applied to the
//! remote store immediately. Entries are appended without backpressure
//! and removed only after the remote store confirms the operation in a
//! later sync pass; unbounded growth is an accepted limitation.

use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{Mutation, MutationEntry};

/// Per-connection handle for the mutation queue
pub struct MutationQueue<'a> {
    conn: &'a Connection,
}

impl<'a> MutationQueue<'a> {
    /// Create a new queue handle over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a mutation with a zero retry counter, returning its
    /// sequence id. Appends never reject.
    pub async fn enqueue(&self, mutation: &Mutation, now_ms: i64) -> Result<i64> {
        let payload = serde_json::to_string(mutation)?;
        self.conn
            .execute(
                "INSERT INTO mutation_queue (kind, note_id, payload, queued_at, retries)
                 VALUES (?, ?, ?, ?, 0)",
                params![
                    mutation.kind().as_str(),
                    mutation.note_id().as_str(),
                    payload,
                    now_ms
                ],
            )
            .await?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All entries in strict enqueue order, oldest first. Read-only:
    /// draining happens entry by entry via [`MutationQueue::remove`].
    ///
    /// Entries for the same note are not coalesced; three queued
    /// updates to one note replay as three remote calls.
    pub async fn entries(&self) -> Result<Vec<MutationEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, payload, queued_at, retries FROM mutation_queue ORDER BY id ASC",
                (),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let payload: String = row.get(1)?;
            entries.push(MutationEntry {
                id: row.get(0)?,
                mutation: serde_json::from_str(&payload)?,
                queued_at: row.get(2)?,
                retries: row.get(3)?,
            });
        }
        Ok(entries)
    }

    /// Delete a single entry once its operation is confirmed applied
    /// remotely.
    pub async fn remove(&self, entry_id: i64) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM mutation_queue WHERE id = ?",
                params![entry_id],
            )
            .await?;
        Ok(())
    }

    /// Increment the retry counter of an entry that failed to replay.
    /// The entry stays queued for the next sync pass; there is no
    /// retry cap.
    pub async fn record_failure(&self, entry_id: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE mutation_queue SET retries = retries + 1 WHERE id = ?",
                params![entry_id],
            )
            .await?;
        Ok(())
    }

    /// Empty the queue. For resets and tests only, never during a
    /// normal sync pass.
    pub async fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM mutation_queue", ()).await?;
        Ok(())
    }

    /// Number of pending entries.
    pub async fn len(&self) -> Result<usize> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM mutation_queue", ())
            .await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// True when nothing is pending.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
