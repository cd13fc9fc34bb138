//! The ledger call contract.
//!
//! One method per coordinator function of the `notes` and `profile` zomes,
//! plus the push-signal channel. Implementations own action persistence and
//! hash assignment; callers never mutate an action in place.

use crate::subscription::SignalSubscription;
use ::async_trait::async_trait;
use holonotes_core::{
    ActionHash, AgentKey, Link, Note, Profile, Record, SignedAction, StoreResult,
    UpdateNoteInput,
};

/// Async interface to the ledger substrate.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Agent this store authors actions as.
    fn agent(&self) -> AgentKey;

    /// Acquire a subscription to the push-signal channel.
    fn subscribe(&self) -> SignalSubscription;

    // ========================================================================
    // NOTE OPERATIONS
    // ========================================================================

    /// Create a note and link it from the `list_notes` anchor.
    async fn create_note(&self, note: Note) -> StoreResult<Record>;

    /// Append a revision superseding `previous_note_hash`.
    async fn update_note(&self, input: UpdateNoteInput) -> StoreResult<Record>;

    /// Tombstone the target action. Returns the hash of the Delete action.
    async fn delete_note(&self, original_note_hash: ActionHash) -> StoreResult<ActionHash>;

    /// The record stored at exactly this hash.
    async fn get_original_note(&self, original_note_hash: ActionHash)
        -> StoreResult<Option<Record>>;

    /// The tip revision of the chain containing `note_hash`.
    async fn get_latest_note(&self, note_hash: ActionHash) -> StoreResult<Option<Record>>;

    /// Every Create/Update of the chain, oldest first.
    async fn get_all_revisions_for_note(
        &self,
        original_note_hash: ActionHash,
    ) -> StoreResult<Vec<Record>>;

    /// Delete with the lowest substrate sequence number, if any.
    async fn get_oldest_delete_for_note(
        &self,
        note_hash: ActionHash,
    ) -> StoreResult<Option<SignedAction>>;

    /// All deletes of the chain, `None` when the hash is unknown.
    async fn get_all_deletes_for_note(
        &self,
        note_hash: ActionHash,
    ) -> StoreResult<Option<Vec<SignedAction>>>;

    /// Live links from the `list_notes` anchor, in creation order.
    async fn get_list_notes(&self) -> StoreResult<Vec<Link>>;

    // ========================================================================
    // PROFILE OPERATIONS
    // ========================================================================

    /// Create this agent's profile and link it from the agent key.
    async fn create_profile(&self, profile: Profile) -> StoreResult<Record>;

    async fn get_profile(&self, profile_hash: ActionHash) -> StoreResult<Option<Record>>;

    /// Profile linked from this store's agent, if any.
    async fn get_my_profile(&self) -> StoreResult<Option<Record>>;
}
