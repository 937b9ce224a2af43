//! Note model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Title applied when a note is created without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A unique identifier for a note, using UUID v7 (time-sortable)
///
/// Ids are assigned once and never reassigned: either generated locally
/// when a note is created while the remote store is unreachable, or
/// taken from the remote store's response on a successful online create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note as both the remote store and the local store see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Owning user
    pub owner_id: String,
    /// Title, defaults to "Untitled"
    pub title: String,
    /// Markdown content
    pub content: String,
    /// Tags derived from content (`#word` markers); never set independently
    pub tags: Vec<String>,
    /// Pinned to the top of listings
    pub pinned: bool,
    /// Archived away from the default view
    pub archived: bool,
    /// Ordered opaque attachment references
    pub attachments: Vec<String>,
    /// Monotonic version, starts at 1
    pub version: i64,
    /// Soft delete flag - the only delete mechanism
    pub is_deleted: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Create a new note with default metadata, stamped at `now_ms`.
    ///
    /// Tags are derived from the content; the id must be supplied by the
    /// caller (remote-assigned or locally generated).
    #[must_use]
    pub fn new(
        id: NoteId,
        owner_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        let content = content.into();
        let title = title.into();
        let tags = extract_tags(&content);
        Self {
            id,
            owner_id: owner_id.into(),
            title: if title.trim().is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            },
            content,
            tags,
            pinned: false,
            archived: false,
            attachments: Vec::new(),
            version: 1,
            is_deleted: false,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Apply a partial update in place.
    ///
    /// Only fields present in the patch are replaced. A content change
    /// does NOT re-derive tags here; that is the facade's job so the
    /// derivation also covers the remote path.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(tags) = &patch.tags {
            self.tags.clone_from(tags);
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
        if let Some(attachments) = &patch.attachments {
            self.attachments.clone_from(attachments);
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(is_deleted) = patch.is_deleted {
            self.is_deleted = is_deleted;
        }
    }
}

/// A partial note update; `None` fields are left untouched.
///
/// Queued mutation payloads serialize only the fields that changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl NotePatch {
    /// Patch that soft-deletes a note.
    #[must_use]
    pub fn soft_delete() -> Self {
        Self {
            is_deleted: Some(true),
            ..Self::default()
        }
    }

    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.pinned.is_none()
            && self.archived.is_none()
            && self.attachments.is_none()
            && self.version.is_none()
            && self.is_deleted.is_none()
    }
}

/// A note plus its local-only sync fields.
///
/// `local_key` is the store's auto-increment key, distinct from the
/// public id so that duplicate records can exist transiently while an
/// offline-created note is reconciled with a server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNote {
    /// Store-assigned auto-increment key
    pub local_key: i64,
    /// The note itself
    pub note: Note,
    /// True if local state has unconfirmed changes relative to the remote store
    pub dirty: bool,
    /// When this note was last confirmed synced (Unix ms)
    pub last_synced: Option<i64>,
}

/// Extract `#tags` from text.
///
/// Every token matching `#\w+` is returned with its case as written,
/// in document order, without deduplication. Tags are always re-derived
/// from content on every content update, so they can never drift from
/// the markers embedded in the text.
#[must_use]
pub fn extract_tags(text: &str) -> Vec<String> {
    let re = Regex::new(r"#(\w+)").expect("Invalid regex");
    re.captures_iter(text).map(|cap| cap[1].to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_note_id_unique() {
        let id1 = NoteId::new();
        let id2 = NoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_note_id_parse() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_note_new_defaults() {
        let note = Note::new(NoteId::new(), "user-1", "Groceries", "Buy milk #errands", 1_000);
        assert_eq!(note.owner_id, "user-1");
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.tags, vec!["errands"]);
        assert_eq!(note.version, 1);
        assert!(!note.pinned);
        assert!(!note.archived);
        assert!(!note.is_deleted);
        assert!(note.attachments.is_empty());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_note_new_blank_title_falls_back() {
        let note = Note::new(NoteId::new(), "user-1", "  ", "content", 1_000);
        assert_eq!(note.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_apply_patch_partial() {
        let mut note = Note::new(NoteId::new(), "user-1", "Title", "Body", 1_000);
        note.apply(&NotePatch {
            pinned: Some(true),
            ..NotePatch::default()
        });
        assert!(note.pinned);
        assert_eq!(note.title, "Title");
        assert_eq!(note.content, "Body");
    }

    #[test]
    fn test_apply_soft_delete() {
        let mut note = Note::new(NoteId::new(), "user-1", "Title", "Body", 1_000);
        note.apply(&NotePatch::soft_delete());
        assert!(note.is_deleted);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(NotePatch::default().is_empty());
        assert!(!NotePatch::soft_delete().is_empty());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = NotePatch {
            pinned: Some(true),
            ..NotePatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"pinned":true}"#);
    }

    #[test]
    fn test_extract_tags_basic() {
        let tags = extract_tags("Hello #world");
        assert_eq!(tags, vec!["world"]);
    }

    #[test]
    fn test_extract_tags_document_order() {
        let tags = extract_tags("#beta then #alpha then #beta");
        assert_eq!(tags, vec!["beta", "alpha", "beta"]);
    }

    #[test]
    fn test_extract_tags_preserves_case() {
        let tags = extract_tags("#Hello #WORLD");
        assert_eq!(tags, vec!["Hello", "WORLD"]);
    }

    #[test]
    fn test_extract_tags_none() {
        assert!(extract_tags("no markers here").is_empty());
    }
}
