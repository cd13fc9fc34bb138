//! Payload entities and the ledger envelopes that carry them.

use crate::codec;
use crate::error::CodecError;
use crate::identity::{ActionHash, AgentKey, EntryHash, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// PAYLOADS
// ============================================================================

/// A short text note. Immutable once written; edits produce a new revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            created_at,
        }
    }

    /// Title and content are both non-blank.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }
}

/// Per-agent display profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub nickname: String,
}

/// Application entry type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Note,
    Profile,
}

// ============================================================================
// ACTIONS
// ============================================================================

/// What an action does to the chain it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionKind {
    Create,
    Update {
        original_action_hash: ActionHash,
        previous_action_hash: ActionHash,
    },
    Delete {
        deletes_action_hash: ActionHash,
    },
}

/// An immutable unit of ledger history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub author: AgentKey,
    /// Local-ordering sequence number assigned by the substrate.
    pub seq: u64,
    pub timestamp: Timestamp,
    pub kind: ActionKind,
    pub entry_type: Option<EntryType>,
    pub entry_hash: Option<EntryHash>,
}

impl Action {
    pub fn is_create(&self) -> bool {
        matches!(self.kind, ActionKind::Create)
    }

    pub fn is_update(&self) -> bool {
        matches!(self.kind, ActionKind::Update { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self.kind, ActionKind::Delete { .. })
    }

    /// Create and Update actions carry an entry; Delete does not.
    pub fn creates_entry(&self) -> bool {
        !self.is_delete()
    }

    pub fn original_action_hash(&self) -> Option<ActionHash> {
        match self.kind {
            ActionKind::Update {
                original_action_hash,
                ..
            } => Some(original_action_hash),
            _ => None,
        }
    }

    pub fn previous_action_hash(&self) -> Option<ActionHash> {
        match self.kind {
            ActionKind::Update {
                previous_action_hash,
                ..
            } => Some(previous_action_hash),
            _ => None,
        }
    }

    pub fn deletes_action_hash(&self) -> Option<ActionHash> {
        match self.kind {
            ActionKind::Delete {
                deletes_action_hash,
            } => Some(deletes_action_hash),
            _ => None,
        }
    }
}

/// An action together with its content-derived hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAction {
    pub hash: ActionHash,
    pub action: Action,
}

impl SignedAction {
    /// Hash the canonical encoding of `action`.
    pub fn from_action(action: Action) -> Result<Self, CodecError> {
        let bytes = codec::canonical_action_bytes(&action)?;
        Ok(Self {
            hash: ActionHash::digest(&bytes),
            action,
        })
    }
}

/// Entry slot of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordEntry {
    Present(Vec<u8>),
    NotApplicable,
}

impl RecordEntry {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Present(bytes) => Some(bytes),
            Self::NotApplicable => None,
        }
    }
}

/// A signed action and the entry it carries, as returned by ledger reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub signed_action: SignedAction,
    pub entry: RecordEntry,
}

impl Record {
    pub fn action_hash(&self) -> ActionHash {
        self.signed_action.hash
    }

    pub fn action(&self) -> &Action {
        &self.signed_action.action
    }
}

// ============================================================================
// LINKS
// ============================================================================

/// Link types declared by the notes and profile zomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// `list_notes` anchor to each created note.
    ListNotes,
    /// Original note action to each of its updates.
    NoteUpdates,
    /// Agent key to the agent's profile.
    AgentToProfile,
}

/// Base address a link hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkBase {
    Anchor(String),
    Action(ActionHash),
    Agent(AgentKey),
}

/// A directed, typed discovery edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub base: LinkBase,
    pub target: ActionHash,
    pub link_type: LinkType,
    pub timestamp: Timestamp,
    pub seq: u64,
    pub create_link_hash: ActionHash,
}

/// Payload of the `update_note` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteInput {
    pub original_note_hash: ActionHash,
    pub previous_note_hash: ActionHash,
    pub updated_note: Note,
}
