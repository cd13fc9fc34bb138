//! Identity types for ledger actions, entries and agents.
//!
//! Every hash is a 32-byte SHA-256 digest wrapped in its own value type so a
//! note's identity can never be confused with its entry hash or its author.
//! Equality, ordering and hashing are structural over the raw bytes, which is
//! what lets the list controller keep them in ordinary sets.

use chrono::{DateTime, Utc};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length in bytes of every hash type.
pub const HASH_LEN: usize = 32;

/// Compute the SHA-256 digest of `content`.
pub fn compute_digest(content: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; HASH_LEN];
    hash.copy_from_slice(&result);
    hash
}

/// Error returned when parsing a hash from its hex form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

macro_rules! define_hash_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; HASH_LEN]);

        impl $name {
            pub const fn from_raw(bytes: [u8; HASH_LEN]) -> Self {
                Self(bytes)
            }

            /// Build from a slice, `None` unless it is exactly [`HASH_LEN`] bytes.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; HASH_LEN]>::try_from(bytes).ok().map(Self)
            }

            /// Hash arbitrary content.
            pub fn digest(content: &[u8]) -> Self {
                Self(compute_digest(content))
            }

            pub const fn as_bytes(&self) -> &[u8; HASH_LEN] {
                &self.0
            }

            /// The all-zero hash is never produced by the ledger and marks a
            /// missing identity.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// First eight hex characters, for logs.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short())
            }
        }

        impl FromStr for $name {
            type Err = HashParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hex(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_bytes(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_bytes(HashBytesVisitor).map(Self)
            }
        }
    };
}

define_hash_type!(
    /// Identity of a ledger action (Create, Update or Delete).
    ActionHash
);

define_hash_type!(
    /// Content hash of an entry payload.
    EntryHash
);

define_hash_type!(
    /// Public key of an agent authoring actions.
    AgentKey
);

impl AgentKey {
    /// Deterministic key derived from a seed, used for local agents.
    pub fn from_seed(seed: &str) -> Self {
        Self::digest(seed.as_bytes())
    }
}

fn parse_hex(s: &str) -> Result<[u8; HASH_LEN], HashParseError> {
    let bytes = hex::decode(s.trim()).map_err(|e| HashParseError::Hex(e.to_string()))?;
    let len = bytes.len();
    <[u8; HASH_LEN]>::try_from(bytes).map_err(|_| HashParseError::Length(len))
}

/// Accepts raw bytes (binary formats), an array of numbers (JSON) or a hex
/// string.
struct HashBytesVisitor;

impl<'de> Visitor<'de> for HashBytesVisitor {
    type Value = [u8; HASH_LEN];

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HASH_LEN} hash bytes")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        <[u8; HASH_LEN]>::try_from(v).map_err(|_| E::invalid_length(v.len(), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse_hex(v).map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(HASH_LEN);
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        let len = bytes.len();
        <[u8; HASH_LEN]>::try_from(bytes).map_err(|_| de::Error::invalid_length(len, &self))
    }
}

// ============================================================================
// TIMESTAMP
// ============================================================================

/// Microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros())
    }

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_micros(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}us", self.0),
        }
    }
}
