//! Per-note view model.
//!
//! ```text
//! Loading -> Loaded | NotFound | Errored
//! Loaded  -> Editing -> Loaded      (save or cancel)
//! Editing -> Errored -> Editing     (failed save, retry_edit)
//! Loaded  -> Deleted                (terminal)
//! ```
//!
//! Fetches are split into [`NoteDetailSession::begin_fetch`] and
//! [`NoteDetailSession::apply_fetch`] so a result can arrive after the
//! session moved on. Each ticket carries a generation number; results for an
//! older generation, or for a discarded session, are dropped.

use crate::chain::{Revision, RevisionChain};
use crate::connection::ConnectionContext;
use crate::list::{optimistic_delete, ListHandle};
use holonotes_core::{ActionHash, Note, NotesError, NotesResult, Timestamp};

/// Note currently shown by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedNote {
    pub original: ActionHash,
    /// Tip the session last observed; used as the previous hash on save.
    pub tip: ActionHash,
    pub note: Note,
}

impl From<Revision> for LoadedNote {
    fn from(revision: Revision) -> Self {
        Self {
            original: revision.original(),
            tip: revision.hash,
            note: revision.note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
}

impl EditDraft {
    fn snapshot(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
        }
    }

    fn validate(&self) -> NotesResult<Note> {
        if self.title.trim().is_empty() {
            return Err(NotesError::invalid_argument("title", "must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(NotesError::invalid_argument("content", "must not be empty"));
        }
        Ok(Note::new(&self.title, &self.content, self.created_at))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Loaded(LoadedNote),
    NotFound,
    /// A fetch or save failed. A failed save keeps the note and draft so
    /// the edit can be retried.
    Errored {
        fault: NotesError,
        last: Option<LoadedNote>,
        draft: Option<EditDraft>,
    },
    Editing {
        current: LoadedNote,
        draft: EditDraft,
    },
    Deleted,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Loaded(_) => "loaded",
            Self::NotFound => "not_found",
            Self::Errored { .. } => "errored",
            Self::Editing { .. } => "editing",
            Self::Deleted => "deleted",
        }
    }
}

/// Proof that a fetch was started for a particular generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    hash: ActionHash,
}

impl FetchTicket {
    pub fn hash(&self) -> ActionHash {
        self.hash
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct NoteDetailSession {
    hash: ActionHash,
    chain: RevisionChain,
    list: Option<ListHandle>,
    state: SessionState,
    generation: u64,
    discarded: bool,
}

fn wrong_state(expected: &str, state: &SessionState) -> NotesError {
    NotesError::invalid_argument(
        "session",
        format!("expected {expected}, session is {}", state.name()),
    )
}

impl NoteDetailSession {
    /// Bind a session to `hash`. A zero hash is not an identity.
    pub fn open(
        ctx: &ConnectionContext,
        hash: ActionHash,
        list: Option<ListHandle>,
    ) -> NotesResult<Self> {
        if hash.is_zero() {
            return Err(NotesError::invalid_argument(
                "hash",
                "a note identity is required",
            ));
        }
        Ok(Self {
            hash,
            chain: RevisionChain::new(ctx),
            list,
            state: SessionState::Loading,
            generation: 0,
            discarded: false,
        })
    }

    pub fn hash(&self) -> ActionHash {
        self.hash
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn chain(&self) -> &RevisionChain {
        &self.chain
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Fetch the latest revision and settle the state.
    pub async fn load(&mut self) -> NotesResult<()> {
        let ticket = self.begin_fetch();
        let result = self.chain.get_latest_record(ticket.hash).await;
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.apply_fetch(ticket, result);
        match outcome {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Enter `Loading` and issue a ticket for the result.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        if !matches!(self.state, SessionState::Deleted) {
            self.state = SessionState::Loading;
        }
        FetchTicket {
            generation: self.generation,
            hash: self.hash,
        }
    }

    /// Settle a fetch. Returns `false` when the result was stale and
    /// dropped.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, result: NotesResult<Revision>) -> bool {
        if self.discarded || ticket.generation != self.generation {
            tracing::debug!(
                hash = %self.hash.short(),
                ticket = ticket.generation,
                current = self.generation,
                "stale fetch result dropped"
            );
            return false;
        }
        if matches!(self.state, SessionState::Deleted) {
            return false;
        }
        self.state = match result {
            Ok(revision) => SessionState::Loaded(revision.into()),
            Err(err) if err.is_not_found() => SessionState::NotFound,
            Err(fault) => {
                tracing::warn!(hash = %self.hash.short(), error = %fault, "note fetch failed");
                SessionState::Errored {
                    fault,
                    last: None,
                    draft: None,
                }
            }
        };
        true
    }

    /// Stop accepting results. Pending fetches resolve into nothing.
    pub fn discard(&mut self) {
        self.discarded = true;
    }

    /// Snapshot the loaded note into an edit draft.
    pub fn start_edit(&mut self) -> NotesResult<()> {
        let SessionState::Loaded(current) = &self.state else {
            return Err(wrong_state("loaded", &self.state));
        };
        let current = current.clone();
        let draft = EditDraft::snapshot(&current.note);
        self.state = SessionState::Editing { current, draft };
        Ok(())
    }

    pub fn edit_draft(&mut self) -> Option<&mut EditDraft> {
        match &mut self.state {
            SessionState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn cancel_edit(&mut self) -> NotesResult<()> {
        let SessionState::Editing { current, .. } = &self.state else {
            return Err(wrong_state("editing", &self.state));
        };
        self.state = SessionState::Loaded(current.clone());
        Ok(())
    }

    /// Publish the draft as a new revision on top of the known tip, then
    /// refetch.
    ///
    /// An invalid draft stays in `Editing`. A rejected update moves to
    /// `Errored` with the draft preserved.
    pub async fn save(&mut self) -> NotesResult<ActionHash> {
        let SessionState::Editing { current, draft } = &self.state else {
            return Err(wrong_state("editing", &self.state));
        };
        let note = draft.validate()?;
        let (current, draft) = (current.clone(), draft.clone());

        match self.chain.update(current.original, current.tip, note).await {
            Ok(new_hash) => {
                tracing::info!(
                    original = %current.original.short(),
                    previous = %current.tip.short(),
                    revision = %new_hash.short(),
                    "note revision saved"
                );
                // The revision exists even if the refetch fails; the state
                // reflects the fetch outcome.
                if let Err(err) = self.load().await {
                    tracing::warn!(error = %err, "refetch after save failed");
                }
                Ok(new_hash)
            }
            Err(fault) => {
                tracing::warn!(hash = %self.hash.short(), error = %fault, "save failed, draft kept");
                self.state = SessionState::Errored {
                    fault: fault.clone(),
                    last: Some(current),
                    draft: Some(draft),
                };
                Err(fault)
            }
        }
    }

    /// Return to `Editing` with the draft a failed save preserved.
    pub fn retry_edit(&mut self) -> NotesResult<()> {
        let SessionState::Errored {
            last: Some(current),
            draft: Some(draft),
            ..
        } = &self.state
        else {
            return Err(wrong_state("errored with a draft", &self.state));
        };
        self.state = SessionState::Editing {
            current: current.clone(),
            draft: draft.clone(),
        };
        Ok(())
    }

    /// Tombstone the note's original and remove it from the owning list.
    pub async fn delete(&mut self) -> NotesResult<ActionHash> {
        let SessionState::Loaded(current) = &self.state else {
            return Err(wrong_state("loaded", &self.state));
        };
        let original = current.original;
        let delete_hash = optimistic_delete(&self.chain, self.list.as_ref(), original).await?;
        tracing::info!(hash = %original.short(), delete = %delete_hash.short(), "note deleted");
        self.state = SessionState::Deleted;
        Ok(delete_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientSettings;
    use holonotes_store::InMemoryLedger;
    use std::sync::Arc;

    fn context(ledger: &InMemoryLedger) -> ConnectionContext {
        ConnectionContext::ready(ClientSettings::default(), Arc::new(ledger.agent_cell("alice")))
            .unwrap()
    }

    fn note(content: &str) -> Note {
        Note::new("title", content, Timestamp::from_micros(1_674_053_334_548_000))
    }

    #[test]
    fn test_open_requires_identity() {
        let ledger = InMemoryLedger::new();
        let err = NoteDetailSession::open(&context(&ledger), ActionHash::from_raw([0; 32]), None)
            .err()
            .unwrap();
        assert!(matches!(err, NotesError::InvalidArgument { field: "hash", .. }));
    }

    #[tokio::test]
    async fn test_load_unknown_is_not_found_state() {
        let ledger = InMemoryLedger::new();
        let mut session =
            NoteDetailSession::open(&context(&ledger), ActionHash::digest(b"x"), None).unwrap();
        session.load().await.unwrap();
        assert_eq!(session.state(), &SessionState::NotFound);
    }

    #[tokio::test]
    async fn test_stale_ticket_is_dropped() {
        let ledger = InMemoryLedger::new();
        let ctx = context(&ledger);
        let chain = RevisionChain::new(&ctx);
        let hash = chain.create(note("v1")).await.unwrap();
        let mut session = NoteDetailSession::open(&ctx, hash, None).unwrap();

        let first = session.begin_fetch();
        let second = session.begin_fetch();
        let latest = chain.get_latest_record(hash).await.unwrap();

        assert!(session.apply_fetch(second, Ok(latest.clone())));
        assert!(!session.apply_fetch(first, Err(NotesError::not_found("note", hash))));
        assert!(matches!(session.state(), SessionState::Loaded(_)));
    }

    #[tokio::test]
    async fn test_discarded_session_ignores_results() {
        let ledger = InMemoryLedger::new();
        let ctx = context(&ledger);
        let chain = RevisionChain::new(&ctx);
        let hash = chain.create(note("v1")).await.unwrap();
        let mut session = NoteDetailSession::open(&ctx, hash, None).unwrap();

        let ticket = session.begin_fetch();
        session.discard();
        let latest = chain.get_latest_record(hash).await.unwrap();
        assert!(!session.apply_fetch(ticket, Ok(latest)));
        assert_eq!(session.state(), &SessionState::Loading);
    }

    #[tokio::test]
    async fn test_edit_cancel_returns_to_loaded() {
        let ledger = InMemoryLedger::new();
        let ctx = context(&ledger);
        let hash = RevisionChain::new(&ctx).create(note("v1")).await.unwrap();
        let mut session = NoteDetailSession::open(&ctx, hash, None).unwrap();
        session.load().await.unwrap();
        let loaded = session.state().clone();

        session.start_edit().unwrap();
        session.edit_draft().unwrap().content = "changed".to_string();
        session.cancel_edit().unwrap();
        assert_eq!(session.state(), &loaded);
        assert_eq!(ledger.action_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_draft_stays_editing() {
        let ledger = InMemoryLedger::new();
        let ctx = context(&ledger);
        let hash = RevisionChain::new(&ctx).create(note("v1")).await.unwrap();
        let mut session = NoteDetailSession::open(&ctx, hash, None).unwrap();
        session.load().await.unwrap();
        session.start_edit().unwrap();
        session.edit_draft().unwrap().title = "   ".to_string();

        let err = session.save().await.unwrap_err();
        assert!(matches!(err, NotesError::InvalidArgument { field: "title", .. }));
        assert_eq!(session.state().name(), "editing");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_draft_for_retry() {
        let ledger = InMemoryLedger::new();
        let ctx = context(&ledger);
        let hash = RevisionChain::new(&ctx).create(note("v1")).await.unwrap();
        let mut session = NoteDetailSession::open(&ctx, hash, None).unwrap();
        session.load().await.unwrap();
        session.start_edit().unwrap();
        session.edit_draft().unwrap().content = "v2".to_string();

        ledger.set_available(false);
        assert!(matches!(session.save().await, Err(NotesError::Transport(_))));
        let SessionState::Errored { draft: Some(draft), .. } = session.state() else {
            panic!("expected errored state with draft");
        };
        assert_eq!(draft.content, "v2");

        ledger.set_available(true);
        session.retry_edit().unwrap();
        session.save().await.unwrap();
        let SessionState::Loaded(loaded) = session.state() else {
            panic!("expected loaded state");
        };
        assert_eq!(loaded.note.content, "v2");
        assert_ne!(loaded.tip, hash);
    }

    #[tokio::test]
    async fn test_delete_requires_loaded() {
        let ledger = InMemoryLedger::new();
        let mut session =
            NoteDetailSession::open(&context(&ledger), ActionHash::digest(b"x"), None).unwrap();
        assert!(session.delete().await.is_err());
    }
}
