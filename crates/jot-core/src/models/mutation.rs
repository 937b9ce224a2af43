//! Queued mutation model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Note, NoteId, NotePatch};

/// Operation kind for a queued mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown mutation kind: {other}")),
        }
    }
}

/// One pending operation against the remote store.
///
/// A `Create` carries the full note (the locally generated id included,
/// so the remote store adopts it); an `Update` carries only the changed
/// fields; a `Delete` is replayed as an update setting `is_deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Mutation {
    Create { note: Note },
    Update { note_id: NoteId, patch: NotePatch },
    Delete { note_id: NoteId },
}

impl Mutation {
    /// The note this mutation targets.
    #[must_use]
    pub const fn note_id(&self) -> NoteId {
        match self {
            Self::Create { note } => note.id,
            Self::Update { note_id, .. } | Self::Delete { note_id } => *note_id,
        }
    }

    /// Operation kind, for queue bookkeeping and status output.
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }
}

/// A mutation as stored in the queue, with its durable bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEntry {
    /// Auto-incrementing sequence id; replay order is ascending id
    pub id: i64,
    /// The pending operation
    pub mutation: Mutation,
    /// Enqueue timestamp (Unix ms)
    pub queued_at: i64,
    /// Failed replay attempts so far
    pub retries: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [MutationKind::Create, MutationKind::Update, MutationKind::Delete] {
            let parsed: MutationKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("upsert".parse::<MutationKind>().is_err());
    }

    #[test]
    fn mutation_serializes_with_op_tag() {
        let note_id = NoteId::new();
        let mutation = Mutation::Update {
            note_id,
            patch: NotePatch {
                pinned: Some(true),
                ..NotePatch::default()
            },
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["op"], "update");
        assert_eq!(json["patch"]["pinned"], true);

        let back: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(back, mutation);
    }

    #[test]
    fn mutation_reports_target_note() {
        let note = Note::new(NoteId::new(), "user-1", "t", "c", 0);
        let id = note.id;
        assert_eq!(Mutation::Create { note }.note_id(), id);
        assert_eq!(Mutation::Delete { note_id: id }.note_id(), id);
    }
}
