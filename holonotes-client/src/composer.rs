//! Create-note form model.

use crate::chain::RevisionChain;
use crate::connection::ConnectionContext;
use holonotes_core::{ActionHash, Note, NotesError, NotesResult, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    /// Defaults to the submit time when unset.
    pub created_at: Option<Timestamp>,
}

pub struct NoteComposer {
    chain: RevisionChain,
    draft: NoteDraft,
}

impl NoteComposer {
    pub fn new(ctx: &ConnectionContext) -> Self {
        Self {
            chain: RevisionChain::new(ctx),
            draft: NoteDraft::default(),
        }
    }

    pub fn draft(&self) -> &NoteDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut NoteDraft {
        &mut self.draft
    }

    pub fn is_valid(&self) -> bool {
        !self.draft.title.trim().is_empty() && !self.draft.content.trim().is_empty()
    }

    /// Create the note and reset the form.
    pub async fn submit(&mut self) -> NotesResult<ActionHash> {
        if self.draft.title.trim().is_empty() {
            return Err(NotesError::invalid_argument("title", "must not be empty"));
        }
        if self.draft.content.trim().is_empty() {
            return Err(NotesError::invalid_argument("content", "must not be empty"));
        }
        let note = Note::new(
            &self.draft.title,
            &self.draft.content,
            self.draft.created_at.unwrap_or_else(Timestamp::now),
        );
        let hash = self.chain.create(note).await?;
        tracing::info!(hash = %hash.short(), "note created");
        self.draft = NoteDraft::default();
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientSettings;
    use holonotes_store::InMemoryLedger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_submit_creates_and_resets() {
        let ledger = InMemoryLedger::new();
        let ctx =
            ConnectionContext::ready(ClientSettings::default(), Arc::new(ledger.agent_cell("alice")))
                .unwrap();
        let mut composer = NoteComposer::new(&ctx);
        assert!(!composer.is_valid());
        assert!(composer.submit().await.is_err());

        composer.draft_mut().title = "Groceries".to_string();
        composer.draft_mut().content = "milk, eggs".to_string();
        assert!(composer.is_valid());

        let hash = composer.submit().await.unwrap();
        assert_eq!(composer.draft(), &NoteDraft::default());

        let note = RevisionChain::new(&ctx).get_original(hash).await.unwrap();
        assert_eq!(note.title, "Groceries");
        assert!(note.created_at.as_micros() > 0);
    }
}
