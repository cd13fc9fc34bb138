//! holonotes test utilities
//!
//! Shared test infrastructure for the holonotes workspace:
//! - Fixtures for notes and signals
//! - Proptest generators for hashes and notes
//! - A two-agent ledger for multi-peer scenarios

pub use holonotes_core::{
    ActionHash, Note, NotesSignal, Signal, SignalAction, Timestamp, NOTES_ZOME,
};
pub use holonotes_store::{InMemoryLedger, LedgerCell, RecordStore};

use holonotes_core::{AppEntry, LinkType, Profile};
use proptest::prelude::*;

// ============================================================================
// FIXTURES
// ============================================================================

/// 2023-01-18 14:48:54 UTC, a fixed creation time for deterministic notes.
pub const FIXED_MICROS: i64 = 1_674_053_334_548_000;

pub fn fixed_timestamp() -> Timestamp {
    Timestamp::from_micros(FIXED_MICROS)
}

pub fn sample_note(title: &str, content: &str) -> Note {
    Note::new(title, content, fixed_timestamp())
}

/// Hash derived from a label, for tests that never touch a ledger.
pub fn hash_of(label: &str) -> ActionHash {
    ActionHash::digest(label.as_bytes())
}

/// An `EntryCreated` signal for a Note, as the notes zome emits it.
pub fn note_created_signal(hash: ActionHash) -> Signal {
    app_signal(
        NOTES_ZOME,
        NotesSignal::EntryCreated {
            action: SignalAction::new(hash, None),
            app_entry: AppEntry::Note(sample_note("t", "c")),
        },
    )
}

/// Signals that carry `hash` but must not add it to a note list.
pub fn non_matching_signals(hash: ActionHash) -> Vec<Signal> {
    vec![
        app_signal(
            "profile",
            NotesSignal::EntryCreated {
                action: SignalAction::new(hash, None),
                app_entry: AppEntry::Note(sample_note("t", "c")),
            },
        ),
        app_signal(
            NOTES_ZOME,
            NotesSignal::EntryCreated {
                action: SignalAction::new(hash, None),
                app_entry: AppEntry::Profile(Profile {
                    nickname: "al".to_string(),
                }),
            },
        ),
        app_signal(
            NOTES_ZOME,
            NotesSignal::LinkCreated {
                action: SignalAction::new(hash, None),
                link_type: LinkType::ListNotes,
            },
        ),
        Signal::App {
            zome_name: NOTES_ZOME.to_string(),
            payload: serde_json::json!({ "type": "EntryCreated", "garbage": true }),
        },
        Signal::System {
            payload: serde_json::Value::Null,
        },
    ]
}

fn app_signal(zome: &str, payload: NotesSignal) -> Signal {
    Signal::App {
        zome_name: zome.to_string(),
        payload: serde_json::to_value(payload).unwrap_or_default(),
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// Two agents sharing one ledger.
pub struct TwoAgents {
    pub ledger: InMemoryLedger,
    pub alice: LedgerCell,
    pub bob: LedgerCell,
}

pub fn two_agents() -> TwoAgents {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");
    let bob = ledger.agent_cell("bob");
    TwoAgents { ledger, alice, bob }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub fn arb_action_hash() -> impl Strategy<Value = ActionHash> {
    any::<[u8; 32]>().prop_map(ActionHash::from_raw)
}

pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (0i64..4_102_444_800_000_000).prop_map(Timestamp::from_micros)
}

/// Notes with non-blank title and content.
pub fn arb_note() -> impl Strategy<Value = Note> {
    ("[a-zA-Z][a-zA-Z0-9 ]{0,24}", "[a-zA-Z][a-zA-Z0-9 .,]{0,120}", arb_timestamp())
        .prop_map(|(title, content, created_at)| Note::new(title, content, created_at))
}
