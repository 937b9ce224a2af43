//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: notes plus the mutation queue
async fn migrate_v1(conn: &Connection) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    // inside a transaction for atomicity.

    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Notes table. `local_key` is the store key; the public `id` is
        // indexed but intentionally NOT unique, so a record can coexist
        // briefly with its reconciled twin during id reassignment.
        "CREATE TABLE IF NOT EXISTS notes (
            local_key INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT 'Untitled',
            content TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            pinned INTEGER NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            attachments TEXT NOT NULL DEFAULT '[]',
            version INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            dirty INTEGER NOT NULL DEFAULT 0,
            last_synced INTEGER
        )",
        "CREATE INDEX IF NOT EXISTS idx_notes_public_id ON notes(id)",
        "CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_notes_updated ON notes(updated_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_notes_dirty ON notes(owner_id, dirty)",
        // Durable FIFO of operations awaiting remote confirmation.
        // Replay order is ascending id; entries are only ever removed
        // after the remote store confirms the operation.
        "CREATE TABLE IF NOT EXISTS mutation_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK (kind IN ('create', 'update', 'delete')),
            note_id TEXT NOT NULL,
            payload TEXT NOT NULL,
            queued_at INTEGER NOT NULL,
            retries INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_mutation_queue_note ON mutation_queue(note_id)",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn setup() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_idempotent() {
        let conn = setup().await;
        run(&conn).await.unwrap();
        run(&conn).await.unwrap(); // Should not fail

        let version = get_version(&conn).await.unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_public_note_id_is_not_unique() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        // Two records sharing a public id must be representable while an
        // offline-created note is reconciled with a server-assigned id.
        for _ in 0..2 {
            conn.execute(
                "INSERT INTO notes (id, owner_id, title, content, created_at, updated_at)
                 VALUES ('dup', 'user-1', 't', 'c', 0, 0)",
                (),
            )
            .await
            .unwrap();
        }

        let mut rows = conn
            .query("SELECT COUNT(*) FROM notes WHERE id = 'dup'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mutation_queue_rejects_unknown_kind() {
        let conn = setup().await;
        run(&conn).await.unwrap();

        let result = conn
            .execute(
                "INSERT INTO mutation_queue (kind, note_id, payload, queued_at)
                 VALUES ('upsert', 'n', '{}', 0)",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}
