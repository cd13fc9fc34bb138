//! Live note list.
//!
//! Keeps the set of visible note identities in insertion order, reconciling
//! a bulk fetch of the `list_notes` anchor with pushed creation signals and
//! local removals. Insertion is idempotent: a hash already visible is never
//! added twice, whichever path observed it first.

use crate::chain::RevisionChain;
use crate::connection::{ConnectionContext, ConnectionState};
use holonotes_core::{ActionHash, NotesResult, Signal};
use holonotes_store::{SignalRecv, SignalSubscription};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct VisibleSet {
    order: Vec<ActionHash>,
    members: HashSet<ActionHash>,
    /// Hashes removed locally; late creation signals for them are ignored.
    removed: HashSet<ActionHash>,
}

impl VisibleSet {
    fn insert(&mut self, hash: ActionHash) -> bool {
        if !self.members.insert(hash) {
            return false;
        }
        self.order.push(hash);
        true
    }

    fn remove(&mut self, hash: &ActionHash) -> Option<usize> {
        self.removed.insert(*hash);
        if !self.members.remove(hash) {
            return None;
        }
        let position = self.order.iter().position(|h| h == hash)?;
        self.order.remove(position);
        Some(position)
    }

    fn restore(&mut self, hash: ActionHash, position: usize) {
        self.removed.remove(&hash);
        if self.members.insert(hash) {
            let position = position.min(self.order.len());
            self.order.insert(position, hash);
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Reset to an authoritative listing. Local removals are forgotten
    /// since the listing already reflects every committed delete.
    fn replace(&mut self, hashes: impl IntoIterator<Item = ActionHash>) {
        self.clear();
        self.removed.clear();
        for hash in hashes {
            self.insert(hash);
        }
    }
}

/// Cloneable writer on a controller's visible set, handed to detail
/// sessions so their deletes show up in the list immediately.
#[derive(Debug, Clone)]
pub struct ListHandle {
    visible: Arc<RwLock<VisibleSet>>,
}

impl ListHandle {
    fn write(&self) -> RwLockWriteGuard<'_, VisibleSet> {
        // The set stays consistent after every mutation, so a poisoned lock
        // is still usable.
        self.visible.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> RwLockReadGuard<'_, VisibleSet> {
        self.visible.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Remove `hash`, returning the position it held.
    pub fn on_local_delete(&self, hash: &ActionHash) -> Option<usize> {
        let position = self.write().remove(hash);
        tracing::debug!(hash = %hash.short(), ?position, "removed from list");
        position
    }

    /// Put `hash` back where it was before a failed delete.
    pub fn restore(&self, hash: ActionHash, position: usize) {
        self.write().restore(hash, position);
        tracing::debug!(hash = %hash.short(), position, "restored to list");
    }

    pub fn contains(&self, hash: &ActionHash) -> bool {
        self.read().members.contains(hash)
    }

    pub fn current_view(&self) -> Vec<ActionHash> {
        self.read().order.clone()
    }
}

/// Owner of the live note list. Dropping it releases its signal
/// subscription.
pub struct LiveNoteListController {
    ctx: ConnectionContext,
    chain: RevisionChain,
    handle: ListHandle,
    subscription: SignalSubscription,
}

impl LiveNoteListController {
    /// Subscribe to the push channel and start with an empty list.
    pub fn mount(ctx: &ConnectionContext) -> NotesResult<Self> {
        let subscription = ctx.store()?.subscribe();
        tracing::debug!("note list mounted");
        Ok(Self {
            ctx: ctx.clone(),
            chain: RevisionChain::new(ctx),
            handle: ListHandle {
                visible: Arc::new(RwLock::new(VisibleSet::default())),
            },
            subscription,
        })
    }

    /// Replace the list with the targets of the `list_notes` anchor.
    ///
    /// On failure the list is left empty and the fault is returned. Never
    /// retried here.
    pub async fn bootstrap(&self) -> NotesResult<()> {
        let links = match self.fetch_links().await {
            Ok(links) => links,
            Err(err) => {
                self.handle.write().clear();
                tracing::warn!(error = %err, "note list bootstrap failed");
                return Err(err);
            }
        };
        let mut visible = self.handle.write();
        visible.replace(links);
        tracing::info!(count = visible.order.len(), "note list bootstrapped");
        Ok(())
    }

    async fn fetch_links(&self) -> NotesResult<Vec<ActionHash>> {
        let links = self.ctx.store()?.get_list_notes().await?;
        Ok(links.into_iter().map(|link| link.target).collect())
    }

    /// Apply a pushed signal. Returns `true` if the list changed.
    ///
    /// Only `EntryCreated` signals for a Note from the configured zome are
    /// considered; everything else is ignored without error.
    pub fn on_signal(&self, signal: &Signal) -> bool {
        let Some(hash) = signal.created_note_hash(&self.ctx.settings().zome_name) else {
            tracing::trace!("signal ignored");
            return false;
        };
        let mut visible = self.handle.write();
        if visible.removed.contains(&hash) {
            tracing::debug!(hash = %hash.short(), "creation signal for removed note ignored");
            return false;
        }
        let added = visible.insert(hash);
        if added {
            tracing::debug!(hash = %hash.short(), "note added from signal");
        }
        added
    }

    pub fn on_local_delete(&self, hash: &ActionHash) -> Option<usize> {
        self.handle.on_local_delete(hash)
    }

    /// Remove `hash` immediately, then delete it on the ledger. A failed
    /// delete puts the hash back at its original position and returns the
    /// fault.
    pub async fn delete_note(&self, hash: &ActionHash) -> NotesResult<ActionHash> {
        optimistic_delete(&self.chain, Some(&self.handle), *hash).await
    }

    pub fn current_view(&self) -> Vec<ActionHash> {
        self.handle.current_view()
    }

    /// Wait for the next pushed signal and apply it.
    ///
    /// Returns `None` once the channel is closed.
    pub async fn next_signal(&mut self) -> Option<bool> {
        match self.subscription.recv().await {
            SignalRecv::Signal(signal) => Some(self.on_signal(&signal)),
            SignalRecv::Lagged(skipped) => {
                tracing::warn!(skipped, "signal subscription lagged; refresh to resync");
                Some(false)
            }
            SignalRecv::Closed => None,
        }
    }

    pub fn handle(&self) -> ListHandle {
        self.handle.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.ctx.state()
    }
}

/// Delete with local removal first and reconciliation on failure.
pub(crate) async fn optimistic_delete(
    chain: &RevisionChain,
    list: Option<&ListHandle>,
    hash: ActionHash,
) -> NotesResult<ActionHash> {
    let position = list.and_then(|list| list.on_local_delete(&hash));
    match chain.delete(hash).await {
        Ok(delete_hash) => Ok(delete_hash),
        Err(err) => {
            tracing::warn!(hash = %hash.short(), error = %err, "delete failed, restoring note");
            if let Some(list) = list {
                match position {
                    Some(position) => list.restore(hash, position),
                    None => {
                        list.write().removed.remove(&hash);
                    }
                }
            }
            Err(err)
        }
    }
}
