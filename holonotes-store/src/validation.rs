//! Integrity rules the ledger enforces before appending an action.
//!
//! Lookups happen in the caller; these functions only judge what was found,
//! so they stay pure and cheap to test.

use holonotes_core::{Action, ActionHash, ActionKind, EntryType, Profile, StoreError, StoreResult};

fn invalid(reason: impl Into<String>) -> StoreError {
    StoreError::Invalid {
        reason: reason.into(),
    }
}

/// An update must extend a Note chain: the original is a Note Create and the
/// previous action is the original itself or an Update of the same chain.
pub fn validate_update(
    original_hash: ActionHash,
    original: Option<&Action>,
    previous_hash: ActionHash,
    previous: Option<&Action>,
) -> StoreResult<()> {
    let original = original.ok_or(StoreError::NotFound {
        hash: original_hash,
    })?;
    if !original.is_create() {
        return Err(invalid(format!(
            "original {original_hash} must be a Create action"
        )));
    }
    if original.entry_type != Some(EntryType::Note) {
        return Err(invalid("only Note entries can be updated"));
    }

    let previous = previous.ok_or(StoreError::NotFound {
        hash: previous_hash,
    })?;
    let in_chain = match previous.kind {
        ActionKind::Create => previous_hash == original_hash,
        ActionKind::Update {
            original_action_hash,
            ..
        } => original_action_hash == original_hash,
        ActionKind::Delete { .. } => false,
    };
    if !in_chain {
        return Err(invalid(format!(
            "previous {previous_hash} is not part of the chain rooted at {original_hash}"
        )));
    }
    Ok(())
}

/// A delete must target an existing Create or Update of a Note.
pub fn validate_delete(target_hash: ActionHash, target: Option<&Action>) -> StoreResult<()> {
    let target = target.ok_or(StoreError::NotFound { hash: target_hash })?;
    if !target.creates_entry() {
        return Err(invalid(
            "original action for a delete must be a Create or Update action",
        ));
    }
    match target.entry_type {
        Some(EntryType::Note) => Ok(()),
        Some(EntryType::Profile) => Err(invalid("Profiles cannot be deleted")),
        None => Err(invalid("original record for a delete must contain an entry")),
    }
}

/// One non-empty profile per agent.
pub fn validate_create_profile(already_has_profile: bool, profile: &Profile) -> StoreResult<()> {
    if profile.nickname.trim().is_empty() {
        return Err(invalid("nickname must not be empty"));
    }
    if already_has_profile {
        return Err(invalid("Profiles cannot be updated"));
    }
    Ok(())
}
