//! Local note store
//!
//! Durable, queryable storage of notes with their local-only sync
//! fields. Store operations carry no network dependency: any failure
//! here is a fatal local error, never retried.

use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{LocalNote, Note, NoteId};

/// Per-connection handle for note storage operations
pub struct NoteStore<'a> {
    conn: &'a Connection,
}

impl<'a> NoteStore<'a> {
    /// Create a new store handle over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Upsert a note by its public id, returning the local store key.
    ///
    /// An existing record has all of its fields replaced and `dirty`
    /// set; a missing one is inserted, also dirty. `updated_at` is
    /// stamped with `now_ms` in both paths. The dirty flag is only ever
    /// cleared by [`NoteStore::mark_synced`].
    pub async fn save_note(&self, note: &Note, now_ms: i64) -> Result<i64> {
        let tags = serde_json::to_string(&note.tags)?;
        let attachments = serde_json::to_string(&note.attachments)?;

        let existing = self.find_local_key(note.id).await?;
        if let Some(local_key) = existing {
            self.conn
                .execute(
                    "UPDATE notes SET
                        owner_id = ?, title = ?, content = ?, tags = ?,
                        pinned = ?, archived = ?, attachments = ?, version = ?,
                        is_deleted = ?, created_at = ?, updated_at = ?, dirty = 1
                     WHERE local_key = ?",
                    params![
                        note.owner_id.clone(),
                        note.title.clone(),
                        note.content.clone(),
                        tags,
                        i32::from(note.pinned),
                        i32::from(note.archived),
                        attachments,
                        note.version,
                        i32::from(note.is_deleted),
                        note.created_at,
                        now_ms,
                        local_key
                    ],
                )
                .await?;
            Ok(local_key)
        } else {
            self.conn
                .execute(
                    "INSERT INTO notes (
                        id, owner_id, title, content, tags, pinned, archived,
                        attachments, version, is_deleted, created_at, updated_at, dirty
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
                    params![
                        note.id.as_str(),
                        note.owner_id.clone(),
                        note.title.clone(),
                        note.content.clone(),
                        tags,
                        i32::from(note.pinned),
                        i32::from(note.archived),
                        attachments,
                        note.version,
                        i32::from(note.is_deleted),
                        note.created_at,
                        now_ms
                    ],
                )
                .await?;
            Ok(self.conn.last_insert_rowid())
        }
    }

    /// Fetch the oldest local record for a public id, deleted or not.
    pub async fn get_note(&self, id: NoteId) -> Result<Option<LocalNote>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM notes WHERE id = ? ORDER BY local_key LIMIT 1"
                ),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_local_note(&row)?)),
            None => Ok(None),
        }
    }

    /// All non-soft-deleted notes for an owner, unordered.
    ///
    /// Ordering, filtering, and sorting are the caller's concern.
    pub async fn get_notes(&self, owner_id: &str) -> Result<Vec<LocalNote>> {
        self.query_notes(
            &format!("SELECT {COLUMNS} FROM notes WHERE owner_id = ? AND is_deleted = 0"),
            owner_id,
        )
        .await
    }

    /// All dirty notes for an owner - the candidate set for the next
    /// sync pass.
    pub async fn get_dirty_notes(&self, owner_id: &str) -> Result<Vec<LocalNote>> {
        self.query_notes(
            &format!("SELECT {COLUMNS} FROM notes WHERE owner_id = ? AND dirty = 1"),
            owner_id,
        )
        .await
    }

    /// Clear the dirty flag and stamp `last_synced`.
    ///
    /// A no-op when the note has no local record.
    pub async fn mark_synced(&self, id: NoteId, now_ms: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE notes SET dirty = 0, last_synced = ? WHERE id = ?",
                params![now_ms, id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn find_local_key(&self, id: NoteId) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query(
                "SELECT local_key FROM notes WHERE id = ? ORDER BY local_key LIMIT 1",
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    async fn query_notes(&self, sql: &str, owner_id: &str) -> Result<Vec<LocalNote>> {
        let mut rows = self.conn.query(sql, params![owner_id]).await?;

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(parse_local_note(&row)?);
        }
        Ok(notes)
    }
}

const COLUMNS: &str = "local_key, id, owner_id, title, content, tags, pinned, archived, \
                       attachments, version, is_deleted, created_at, updated_at, dirty, last_synced";

fn parse_local_note(row: &libsql::Row) -> Result<LocalNote> {
    let id: String = row.get(1)?;
    let tags: String = row.get(5)?;
    let attachments: String = row.get(8)?;
    let last_synced = match row.get_value(14)? {
        libsql::Value::Integer(ms) => Some(ms),
        _ => None,
    };

    Ok(LocalNote {
        local_key: row.get(0)?,
        note: Note {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid note id in store: {id}")))?,
            owner_id: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            tags: serde_json::from_str(&tags)?,
            pinned: row.get::<i32>(6)? != 0,
            archived: row.get::<i32>(7)? != 0,
            attachments: serde_json::from_str(&attachments)?,
            version: row.get(9)?,
            is_deleted: row.get::<i32>(10)? != 0,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        },
        dirty: row.get::<i32>(13)? != 0,
        last_synced,
    })
}
