//! Push-signal shapes.
//!
//! Signals arrive out-of-band from request/response calls. The outer
//! [`Signal`] is kept loose (`payload` is raw JSON) so a single malformed or
//! foreign payload never fails decoding of the envelope; [`NotesSignal`] is
//! the typed view a consumer opts into.

use crate::entities::{Action, LinkType, Note, Profile};
use crate::identity::ActionHash;
use serde::{Deserialize, Serialize};

/// Zome name the notes coordinator emits signals under.
pub const NOTES_ZOME: &str = "notes";

/// Envelope delivered on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    App {
        zome_name: String,
        payload: serde_json::Value,
    },
    System {
        #[serde(default)]
        payload: serde_json::Value,
    },
}

/// Typed entry carried inside a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AppEntry {
    Note(Note),
    Profile(Profile),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedAction {
    pub hash: ActionHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalAction {
    pub hashed: HashedAction,
}

impl SignalAction {
    pub fn new(hash: ActionHash, content: Option<Action>) -> Self {
        Self {
            hashed: HashedAction { hash, content },
        }
    }

    pub fn hash(&self) -> ActionHash {
        self.hashed.hash
    }
}

/// Post-commit events emitted by the notes and profile zomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotesSignal {
    EntryCreated {
        action: SignalAction,
        app_entry: AppEntry,
    },
    EntryUpdated {
        action: SignalAction,
        app_entry: AppEntry,
        original_app_entry: AppEntry,
    },
    EntryDeleted {
        action: SignalAction,
        original_app_entry: AppEntry,
    },
    LinkCreated {
        action: SignalAction,
        link_type: LinkType,
    },
    LinkDeleted {
        action: SignalAction,
        link_type: LinkType,
    },
}

impl NotesSignal {
    /// Wrap into an app signal for `zome_name`.
    pub fn into_signal(self, zome_name: &str) -> Result<Signal, serde_json::Error> {
        Ok(Signal::App {
            zome_name: zome_name.to_string(),
            payload: serde_json::to_value(self)?,
        })
    }
}

impl Signal {
    /// Typed notes payload, if this is an app signal from `zome`.
    pub fn notes_payload(&self, zome: &str) -> Option<NotesSignal> {
        match self {
            Self::App { zome_name, payload } if zome_name == zome => {
                serde_json::from_value(payload.clone()).ok()
            }
            _ => None,
        }
    }

    /// Hash of a newly created Note, if and only if this signal is an
    /// `EntryCreated` from `zome` whose entry is tagged `Note`. Only the tags
    /// and the action hash are read; the entry body is not decoded.
    pub fn created_note_hash(&self, zome: &str) -> Option<ActionHash> {
        let Self::App { zome_name, payload } = self else {
            return None;
        };
        if zome_name != zome
            || payload.get("type")?.as_str()? != "EntryCreated"
            || payload.get("app_entry")?.get("type")?.as_str()? != "Note"
        {
            return None;
        }
        let hash = payload.get("action")?.get("hashed")?.get("hash")?;
        ActionHash::deserialize(hash).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Timestamp;
    use serde_json::json;

    fn created(hash: ActionHash) -> Signal {
        NotesSignal::EntryCreated {
            action: SignalAction::new(hash, None),
            app_entry: AppEntry::Note(Note::new("t", "c", Timestamp::from_micros(5))),
        }
        .into_signal(NOTES_ZOME)
        .unwrap()
    }

    #[test]
    fn test_created_note_hash_accepts_exact_shape() {
        let hash = ActionHash::digest(b"n1");
        assert_eq!(created(hash).created_note_hash(NOTES_ZOME), Some(hash));
    }

    #[test]
    fn test_created_note_hash_from_wire_json() {
        let hash = ActionHash::digest(b"wire");
        let raw = json!({
            "type": "app",
            "zome_name": "notes",
            "payload": {
                "type": "EntryCreated",
                "app_entry": {
                    "type": "Note",
                    "title": "t",
                    "content": "c",
                    "created_at": 1674053334548000_i64
                },
                "action": { "hashed": { "hash": hash.as_bytes().to_vec() } }
            }
        });
        let signal: Signal = serde_json::from_value(raw).unwrap();
        assert_eq!(signal.created_note_hash("notes"), Some(hash));
    }

    #[test]
    fn test_created_note_hash_reads_only_tags() {
        let bytes: Vec<u8> = (1..=32).collect();
        let hash = ActionHash::from_slice(&bytes).unwrap();
        let raw = json!({
            "type": "app",
            "zome_name": "notes",
            "payload": {
                "type": "EntryCreated",
                "app_entry": { "type": "Note" },
                "action": { "hashed": { "hash": bytes } }
            }
        });
        let signal: Signal = serde_json::from_value(raw).unwrap();
        assert_eq!(signal.created_note_hash(NOTES_ZOME), Some(hash));
    }

    #[test]
    fn test_other_zome_is_ignored() {
        let hash = ActionHash::digest(b"n1");
        assert_eq!(created(hash).created_note_hash("profile"), None);
    }

    #[test]
    fn test_profile_entry_is_ignored() {
        let signal = NotesSignal::EntryCreated {
            action: SignalAction::new(ActionHash::digest(b"p"), None),
            app_entry: AppEntry::Profile(Profile {
                nickname: "bob".into(),
            }),
        }
        .into_signal(NOTES_ZOME)
        .unwrap();
        assert_eq!(signal.created_note_hash(NOTES_ZOME), None);
    }

    #[test]
    fn test_link_and_update_signals_are_ignored() {
        let link = NotesSignal::LinkCreated {
            action: SignalAction::new(ActionHash::digest(b"l"), None),
            link_type: LinkType::ListNotes,
        }
        .into_signal(NOTES_ZOME)
        .unwrap();
        assert_eq!(link.created_note_hash(NOTES_ZOME), None);
    }

    #[test]
    fn test_malformed_payload_is_ignored() {
        let signal = Signal::App {
            zome_name: "notes".into(),
            payload: json!({ "type": "EntryCreated", "action": { "hashed": { "hash": [1, 2] } } }),
        };
        assert_eq!(signal.created_note_hash(NOTES_ZOME), None);
    }

    #[test]
    fn test_system_signal_is_ignored() {
        let signal: Signal = serde_json::from_value(json!({ "type": "system" })).unwrap();
        assert_eq!(signal.created_note_hash(NOTES_ZOME), None);
    }
}
