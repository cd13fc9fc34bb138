//! Revision chain queries and mutations.
//!
//! A chain is every action reachable from one original Create: Updates
//! superseding it and Delete tombstones targeting any of its members. The
//! ledger is the source of truth for what supersedes what; this type decodes
//! what it returns and turns absent results into typed faults.

use crate::config::DeletePolicy;
use crate::connection::ConnectionContext;
use holonotes_core::{
    Action, ActionHash, EntryType, Note, NoteCodec, NotesError, NotesResult, Record, SignedAction,
    UpdateNoteInput,
};
use std::collections::HashSet;

/// One decoded Create or Update of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub hash: ActionHash,
    pub action: Action,
    pub note: Note,
}

impl Revision {
    fn from_record(record: &Record) -> NotesResult<Self> {
        Ok(Self {
            hash: record.action_hash(),
            action: record.action().clone(),
            note: NoteCodec::decode_record(record)?,
        })
    }

    /// Hash of the chain's original Create.
    pub fn original(&self) -> ActionHash {
        self.action.original_action_hash().unwrap_or(self.hash)
    }
}

/// Lineage operations over the connection's store.
#[derive(Debug, Clone)]
pub struct RevisionChain {
    ctx: ConnectionContext,
}

impl RevisionChain {
    pub fn new(ctx: &ConnectionContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    pub fn context(&self) -> &ConnectionContext {
        &self.ctx
    }

    pub async fn create(&self, note: Note) -> NotesResult<ActionHash> {
        let record = self.ctx.store()?.create_note(note).await?;
        Ok(record.action_hash())
    }

    /// Payload of the Create at `original_hash`.
    pub async fn get_original(&self, original_hash: ActionHash) -> NotesResult<Note> {
        let record = self
            .ctx
            .store()?
            .get_original_note(original_hash)
            .await?
            .ok_or(NotesError::not_found("note", original_hash))?;
        let action = record.action();
        if !action.is_create() || action.entry_type != Some(EntryType::Note) {
            return Err(NotesError::not_found("original note", original_hash));
        }
        Ok(NoteCodec::decode_record(&record)?)
    }

    /// Tip revision of the chain containing `hash`.
    ///
    /// Under [`DeletePolicy::Absent`] a chain with any Delete reads as
    /// `NotFound`.
    pub async fn get_latest_record(&self, hash: ActionHash) -> NotesResult<Revision> {
        let store = self.ctx.store()?;
        let record = store
            .get_latest_note(hash)
            .await?
            .ok_or(NotesError::not_found("note", hash))?;
        if self.ctx.settings().delete_policy == DeletePolicy::Absent {
            let deleted = store
                .get_all_deletes_for_note(hash)
                .await?
                .is_some_and(|deletes| !deletes.is_empty());
            if deleted {
                tracing::debug!(hash = %hash.short(), "chain deleted, reading as absent");
                return Err(NotesError::not_found("note", hash));
            }
        }
        Revision::from_record(&record)
    }

    pub async fn get_latest(&self, hash: ActionHash) -> NotesResult<Note> {
        Ok(self.get_latest_record(hash).await?.note)
    }

    /// Append `note` as superseding `previous_hash`. The caller supplies the
    /// tip it last observed; concurrent updates both succeed and branch.
    pub async fn update(
        &self,
        original_hash: ActionHash,
        previous_hash: ActionHash,
        note: Note,
    ) -> NotesResult<ActionHash> {
        let record = self
            .ctx
            .store()?
            .update_note(UpdateNoteInput {
                original_note_hash: original_hash,
                previous_note_hash: previous_hash,
                updated_note: note,
            })
            .await?;
        Ok(record.action_hash())
    }

    /// Tombstone `target_hash`. History is kept.
    pub async fn delete(&self, target_hash: ActionHash) -> NotesResult<ActionHash> {
        Ok(self.ctx.store()?.delete_note(target_hash).await?)
    }

    /// Every revision payload, oldest first.
    pub async fn get_all_revisions(&self, original_hash: ActionHash) -> NotesResult<Vec<Note>> {
        Ok(self
            .revisions(original_hash)
            .await?
            .into_iter()
            .map(|revision| revision.note)
            .collect())
    }

    async fn revisions(&self, original_hash: ActionHash) -> NotesResult<Vec<Revision>> {
        let records = self
            .ctx
            .store()?
            .get_all_revisions_for_note(original_hash)
            .await?;
        if records.is_empty() {
            return Err(NotesError::not_found("note", original_hash));
        }
        records.iter().map(Revision::from_record).collect()
    }

    pub async fn get_all_deletes(&self, hash: ActionHash) -> NotesResult<Vec<SignedAction>> {
        self.ctx
            .store()?
            .get_all_deletes_for_note(hash)
            .await?
            .ok_or(NotesError::not_found("note", hash))
    }

    pub async fn get_oldest_delete(&self, hash: ActionHash) -> NotesResult<SignedAction> {
        self.ctx
            .store()?
            .get_oldest_delete_for_note(hash)
            .await?
            .ok_or(NotesError::not_found("delete", hash))
    }

    /// Revisions of the chain after checking it is well formed: a single
    /// Create at `original_hash` followed by Updates whose previous hash
    /// points at an earlier member.
    pub async fn lineage(&self, original_hash: ActionHash) -> NotesResult<Vec<Revision>> {
        let revisions = self.revisions(original_hash).await?;
        verify_lineage(original_hash, &revisions)?;
        Ok(revisions)
    }
}

fn broken(hash: ActionHash, reason: impl Into<String>) -> NotesError {
    NotesError::BrokenChain {
        hash,
        reason: reason.into(),
    }
}

pub(crate) fn verify_lineage(original_hash: ActionHash, revisions: &[Revision]) -> NotesResult<()> {
    let Some((root, rest)) = revisions.split_first() else {
        return Err(NotesError::not_found("note", original_hash));
    };
    if root.hash != original_hash || !root.action.is_create() {
        return Err(broken(root.hash, "chain must start at its original Create"));
    }
    let mut seen: HashSet<ActionHash> = HashSet::from([root.hash]);
    for revision in rest {
        if revision.action.original_action_hash() != Some(original_hash) {
            return Err(broken(revision.hash, "update belongs to another chain"));
        }
        match revision.action.previous_action_hash() {
            Some(previous) if seen.contains(&previous) => {}
            Some(previous) => {
                return Err(broken(
                    revision.hash,
                    format!("previous {previous} is not an earlier revision"),
                ))
            }
            None => return Err(broken(revision.hash, "update without previous hash")),
        }
        seen.insert(revision.hash);
    }
    Ok(())
}
