//! holonotes core - entity types
//!
//! Pure data structures shared by the ledger substrate and the client:
//! hash value types, the Note payload, the action/record/link envelopes,
//! push-signal shapes, the entry codec and the error taxonomy.

pub mod codec;
pub mod entities;
pub mod error;
pub mod identity;
pub mod signal;

pub use codec::{decode_entry, decode_record_entry, encode_entry, NoteCodec};
pub use entities::{
    Action, ActionKind, EntryType, Link, LinkBase, LinkType, Note, Profile, Record, RecordEntry,
    SignedAction, UpdateNoteInput,
};
pub use error::{CodecError, NotesError, NotesResult, StoreError, StoreResult};
pub use identity::{
    compute_digest, ActionHash, AgentKey, EntryHash, HashParseError, Timestamp, HASH_LEN,
};
pub use signal::{AppEntry, HashedAction, NotesSignal, Signal, SignalAction, NOTES_ZOME};

/// Anchor the list of all notes hangs off.
pub const LIST_NOTES_ANCHOR: &str = "list_notes";
