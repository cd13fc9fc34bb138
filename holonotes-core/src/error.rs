//! Error types for holonotes operations

use crate::entities::EntryType;
use crate::identity::ActionHash;
use thiserror::Error;

/// Entry encoding and decoding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode {entry_type:?} entry: {reason}")]
    Encode { entry_type: EntryType, reason: String },

    #[error("Payload does not match the {expected:?} shape: {reason}")]
    Decode { expected: EntryType, reason: String },

    #[error("Record {hash} carries no entry")]
    MissingEntry { hash: ActionHash },
}

/// Faults reported by the ledger substrate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No action found for {hash}")]
    NotFound { hash: ActionHash },

    #[error("Rejected by validation: {reason}")]
    Invalid { reason: String },

    #[error("Substrate unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type alias for substrate calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Client-facing error taxonomy.
///
/// Every variant is distinct from an empty result, so a caller can tell
/// "no notes exist" apart from "notes could not be loaded".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotesError {
    #[error("{what} not found for {hash}")]
    NotFound { what: &'static str, hash: ActionHash },

    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("Transport fault: {0}")]
    Transport(StoreError),

    #[error("Decode fault: {0}")]
    Decode(#[from] CodecError),

    #[error("Broken revision chain at {hash}: {reason}")]
    BrokenChain { hash: ActionHash, reason: String },
}

impl NotesError {
    pub fn not_found(what: &'static str, hash: ActionHash) -> Self {
        Self::NotFound { what, hash }
    }

    pub fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for NotesError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { hash } => Self::NotFound {
                what: "action",
                hash,
            },
            StoreError::Codec(codec) => Self::Decode(codec),
            other => Self::Transport(other),
        }
    }
}

/// Result type alias for client operations.
pub type NotesResult<T> = Result<T, NotesError>;

// =============================================================================
// TESTS
// =============================================================================
