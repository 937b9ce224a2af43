//! Shared test doubles for the sync core.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::models::{Note, NoteId, NotePatch};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::util::Clock;

/// In-memory remote store with an online/offline switch and a call log.
///
/// Cloning shares the underlying state, so a test can keep a handle
/// while the service owns another.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<MemoryRemoteInner>,
}

struct MemoryRemoteInner {
    online: AtomicBool,
    now_ms: AtomicI64,
    notes: Mutex<HashMap<NoteId, Note>>,
    calls: Mutex<Vec<String>>,
}

impl Default for MemoryRemoteInner {
    fn default() -> Self {
        Self {
            online: AtomicBool::new(true),
            now_ms: AtomicI64::new(1_000_000),
            notes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
    }

    /// Every invocation of the trait, online or not, in order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn note(&self, id: NoteId) -> Option<Note> {
        self.inner.notes.lock().unwrap().get(&id).cloned()
    }

    pub fn note_count(&self) -> usize {
        self.inner.notes.lock().unwrap().len()
    }

    /// Seed a note directly, bypassing the call log.
    pub fn insert(&self, note: Note) {
        self.inner.notes.lock().unwrap().insert(note.id, note);
    }

    fn record(&self, call: String) -> RemoteResult<()> {
        self.inner.calls.lock().unwrap().push(call);
        if self.inner.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Api {
                status: 503,
                message: "remote unreachable".to_string(),
            })
        }
    }

    fn tick(&self) -> i64 {
        self.inner.now_ms.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl RemoteStore for MemoryRemote {
    async fn create_note(&self, note: &Note) -> RemoteResult<Note> {
        self.record(format!("create:{}", note.id))?;

        let mut notes = self.inner.notes.lock().unwrap();
        if notes.contains_key(&note.id) {
            return Err(RemoteError::Api {
                status: 409,
                message: "note already exists".to_string(),
            });
        }
        let mut stored = note.clone();
        stored.updated_at = self.tick();
        notes.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_note(&self, note_id: NoteId, patch: &NotePatch) -> RemoteResult<Note> {
        self.record(format!("update:{note_id}"))?;

        let mut notes = self.inner.notes.lock().unwrap();
        let Some(note) = notes.get_mut(&note_id) else {
            return Err(RemoteError::Api {
                status: 404,
                message: "note not found".to_string(),
            });
        };
        note.apply(patch);
        note.updated_at = self.tick();
        Ok(note.clone())
    }

    async fn list_notes(&self, owner_id: &str, limit: usize) -> RemoteResult<Vec<Note>> {
        self.record(format!("list:{owner_id}"))?;

        let notes = self.inner.notes.lock().unwrap();
        let mut owned: Vec<Note> = notes
            .values()
            .filter(|note| note.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned.truncate(limit);
        Ok(owned)
    }
}

/// Manually advanced clock for deterministic timestamps.
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub const fn new(start_ms: i64) -> Self {
        Self(AtomicI64::new(start_ms))
    }

    pub fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
