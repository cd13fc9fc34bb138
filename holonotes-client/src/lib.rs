//! holonotes client
//!
//! Turns ledger records into a live view of the user's notes:
//! [`RevisionChain`] answers lineage queries, [`LiveNoteListController`]
//! keeps the visible note set in sync with pushed signals and
//! [`NoteDetailSession`] mediates viewing and editing one note. Every
//! component receives an explicit [`ConnectionContext`].

pub mod chain;
pub mod composer;
pub mod config;
pub mod connection;
pub mod detail;
pub mod error;
pub mod events;
pub mod list;
pub mod profile;
pub mod realtime;
pub mod telemetry;

pub use chain::{Revision, RevisionChain};
pub use composer::{NoteComposer, NoteDraft};
pub use config::{ClientConfig, ClientSettings, ConfigError, DeletePolicy, ReconnectConfig};
pub use connection::{ConnectionContext, ConnectionState};
pub use detail::{EditDraft, FetchTicket, LoadedNote, NoteDetailSession, SessionState};
pub use error::ClientError;
pub use events::ClientEvent;
pub use list::{ListHandle, LiveNoteListController};
pub use profile::ProfileDirectory;
