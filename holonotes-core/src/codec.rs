//! Entry codec.
//!
//! Entries travel as MessagePack maps keyed by field name, so field order
//! does not matter on decode but the names `title`, `content` and
//! `created_at` are fixed.

use crate::entities::{Action, EntryType, Note, Record};
use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode an entry payload of the given type.
pub fn encode_entry<T: Serialize>(entry_type: EntryType, value: &T) -> Result<Vec<u8>, CodecError> {
    rmp_serde::to_vec_named(value).map_err(|e| CodecError::Encode {
        entry_type,
        reason: e.to_string(),
    })
}

/// Decode an entry payload, failing if the bytes do not match `T`'s shape.
pub fn decode_entry<T: DeserializeOwned>(expected: EntryType, bytes: &[u8]) -> Result<T, CodecError> {
    rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode {
        expected,
        reason: e.to_string(),
    })
}

/// Decode the entry carried by a record.
pub fn decode_record_entry<T: DeserializeOwned>(
    expected: EntryType,
    record: &Record,
) -> Result<T, CodecError> {
    let bytes = record
        .entry
        .as_bytes()
        .ok_or(CodecError::MissingEntry {
            hash: record.action_hash(),
        })?;
    decode_entry(expected, bytes)
}

/// Bytes an action hash is computed over.
pub(crate) fn canonical_action_bytes(action: &Action) -> Result<Vec<u8>, CodecError> {
    rmp_serde::to_vec(action).map_err(|e| CodecError::Encode {
        entry_type: action.entry_type.unwrap_or(EntryType::Note),
        reason: e.to_string(),
    })
}

/// Serializes and deserializes [`Note`] payloads.
pub struct NoteCodec;

impl NoteCodec {
    pub fn encode(note: &Note) -> Result<Vec<u8>, CodecError> {
        encode_entry(EntryType::Note, note)
    }

    pub fn decode(bytes: &[u8]) -> Result<Note, CodecError> {
        decode_entry(EntryType::Note, bytes)
    }

    pub fn decode_record(record: &Record) -> Result<Note, CodecError> {
        decode_record_entry(EntryType::Note, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ActionKind, Profile, RecordEntry, SignedAction};
    use crate::identity::{AgentKey, Timestamp};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn sample() -> Note {
        Note::new("Groceries", "milk, eggs", Timestamp::from_micros(1_674_053_334_548_000))
    }

    #[test]
    fn test_decode_ignores_field_order() {
        let mut map = BTreeMap::new();
        map.insert("created_at", rmpv_like::Int(1_674_053_334_548_000));
        map.insert("content", rmpv_like::Str("milk, eggs".into()));
        map.insert("title", rmpv_like::Str("Groceries".into()));
        let bytes = rmp_serde::to_vec_named(&map).unwrap();
        assert_eq!(NoteCodec::decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_encoding_uses_field_names() {
        let bytes = NoteCodec::encode(&sample()).unwrap();
        let as_map: BTreeMap<String, rmpv_like::Value> = rmp_serde::from_slice(&bytes).unwrap();
        let keys: Vec<_> = as_map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["content", "created_at", "title"]);
    }

    #[test]
    fn test_decode_rejects_profile_payload() {
        let bytes = encode_entry(EntryType::Profile, &Profile { nickname: "al".into() }).unwrap();
        let err = NoteCodec::decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Decode { expected: EntryType::Note, .. }));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(NoteCodec::decode(&[0xc1, 0x00, 0xff]).is_err());
    }

    #[test]
    fn test_decode_record_without_entry() {
        let signed = SignedAction::from_action(Action {
            author: AgentKey::from_seed("a"),
            seq: 1,
            timestamp: Timestamp::from_micros(1),
            kind: ActionKind::Delete {
                deletes_action_hash: crate::ActionHash::digest(b"t"),
            },
            entry_type: None,
            entry_hash: None,
        })
        .unwrap();
        let hash = signed.hash;
        let record = Record {
            signed_action: signed,
            entry: RecordEntry::NotApplicable,
        };
        assert_eq!(
            NoteCodec::decode_record(&record).unwrap_err(),
            CodecError::MissingEntry { hash }
        );
    }

    proptest! {
        #[test]
        fn decode_recovers_any_encoded_note(
            title in "\\PC{0,40}",
            content in "\\PC{0,200}",
            micros in any::<i64>(),
        ) {
            let note = Note::new(title, content, Timestamp::from_micros(micros));
            let bytes = NoteCodec::encode(&note).unwrap();
            prop_assert_eq!(NoteCodec::decode(&bytes).unwrap(), note);
        }
    }

    /// Minimal untyped value so tests can build maps without the codec.
    mod rmpv_like {
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize)]
        #[serde(untagged)]
        pub enum Value {
            Int(i64),
            Str(String),
        }

        pub use Value::{Int, Str};
    }
}
