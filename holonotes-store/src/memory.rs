//! In-memory reference ledger.
//!
//! A single shared history that every [`LedgerCell`] reads and writes, so all
//! agents observe each other's actions immediately (a fully synced network).
//! It honours the same call contract as a real substrate: content-addressed
//! action hashes, substrate-assigned sequence numbers, discovery links and
//! post-commit signals broadcast to every subscriber.

use crate::record_store::RecordStore;
use crate::subscription::SignalSubscription;
use crate::validation::{validate_create_profile, validate_delete, validate_update};
use ::async_trait::async_trait;
use holonotes_core::{
    encode_entry, Action, ActionHash, ActionKind, AgentKey, AppEntry, EntryHash, EntryType, Link,
    LinkBase, LinkType, Note, NoteCodec, NotesSignal, Profile, Record, RecordEntry, Signal,
    SignalAction, SignedAction, StoreError, StoreResult, Timestamp, UpdateNoteInput,
    LIST_NOTES_ANCHOR, NOTES_ZOME,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Default buffer of the push channel.
pub const DEFAULT_SIGNAL_CAPACITY: usize = 256;

const PROFILE_ZOME: &str = "profile";

#[derive(Debug, Clone)]
struct StoredAction {
    signed: SignedAction,
    entry: Option<Vec<u8>>,
}

impl StoredAction {
    fn record(&self) -> Record {
        Record {
            signed_action: self.signed.clone(),
            entry: match &self.entry {
                Some(bytes) => RecordEntry::Present(bytes.clone()),
                None => RecordEntry::NotApplicable,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct StoredLink {
    link: Link,
    deleted: bool,
}

#[derive(Debug, Default)]
struct LedgerState {
    actions: HashMap<ActionHash, StoredAction>,
    links: Vec<StoredLink>,
    next_seq: u64,
}

impl LedgerState {
    fn action(&self, hash: &ActionHash) -> Option<&Action> {
        self.actions.get(hash).map(|stored| &stored.signed.action)
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn append(
        &mut self,
        author: AgentKey,
        kind: ActionKind,
        entry: Option<(EntryType, Vec<u8>)>,
    ) -> StoreResult<StoredAction> {
        let seq = self.next_seq();
        let (entry_type, entry_hash, bytes) = match entry {
            Some((entry_type, bytes)) => {
                (Some(entry_type), Some(EntryHash::digest(&bytes)), Some(bytes))
            }
            None => (None, None, None),
        };
        let signed = SignedAction::from_action(Action {
            author,
            seq,
            timestamp: Timestamp::now(),
            kind,
            entry_type,
            entry_hash,
        })?;
        let stored = StoredAction {
            signed,
            entry: bytes,
        };
        self.actions.insert(stored.signed.hash, stored.clone());
        Ok(stored)
    }

    fn create_link(
        &mut self,
        author: AgentKey,
        base: LinkBase,
        target: ActionHash,
        link_type: LinkType,
    ) -> Link {
        let seq = self.next_seq();
        let material = format!("{base:?}|{target}|{link_type:?}|{seq}|{author}");
        let link = Link {
            base,
            target,
            link_type,
            timestamp: Timestamp::now(),
            seq,
            create_link_hash: ActionHash::digest(material.as_bytes()),
        };
        self.links.push(StoredLink {
            link: link.clone(),
            deleted: false,
        });
        link
    }

    fn live_links(&self, base: &LinkBase, link_type: LinkType) -> Vec<&Link> {
        self.links
            .iter()
            .filter(|l| !l.deleted && l.link.link_type == link_type && &l.link.base == base)
            .map(|l| &l.link)
            .collect()
    }

    /// Mark live links to `target` deleted, returning them.
    fn delete_links_to(&mut self, base: &LinkBase, link_type: LinkType, target: ActionHash) -> Vec<Link> {
        let mut removed = Vec::new();
        for stored in self.links.iter_mut() {
            if !stored.deleted
                && stored.link.link_type == link_type
                && &stored.link.base == base
                && stored.link.target == target
            {
                stored.deleted = true;
                removed.push(stored.link.clone());
            }
        }
        removed
    }

    /// Original Create hash of the note chain `hash` belongs to. Chains
    /// rooted at a non-Note Create resolve to nothing.
    fn resolve_original(&self, hash: ActionHash) -> Option<ActionHash> {
        let mut current = hash;
        // Delete -> target -> original: at most two hops.
        for _ in 0..3 {
            let action = self.action(&current)?;
            match action.kind {
                ActionKind::Create if action.entry_type == Some(EntryType::Note) => {
                    return Some(current)
                }
                ActionKind::Create => return None,
                ActionKind::Update {
                    original_action_hash,
                    ..
                } => return Some(original_action_hash),
                ActionKind::Delete {
                    deletes_action_hash,
                } => current = deletes_action_hash,
            }
        }
        None
    }

    /// Update actions of the chain, ordered by substrate sequence number.
    fn updates_of(&self, original: ActionHash) -> Vec<&StoredAction> {
        let mut updates: Vec<&StoredAction> = self
            .live_links(&LinkBase::Action(original), LinkType::NoteUpdates)
            .into_iter()
            .filter_map(|link| self.actions.get(&link.target))
            .collect();
        updates.sort_by_key(|stored| stored.signed.action.seq);
        updates
    }

    /// Delete actions targeting any member of the chain, oldest first.
    fn deletes_of(&self, original: ActionHash) -> Vec<SignedAction> {
        let mut members: Vec<ActionHash> = vec![original];
        members.extend(self.updates_of(original).iter().map(|s| s.signed.hash));
        let mut deletes: Vec<SignedAction> = self
            .actions
            .values()
            .filter(|stored| {
                stored
                    .signed
                    .action
                    .deletes_action_hash()
                    .is_some_and(|target| members.contains(&target))
            })
            .map(|stored| stored.signed.clone())
            .collect();
        deletes.sort_by_key(|signed| signed.action.seq);
        deletes
    }
}

struct LedgerInner {
    state: RwLock<LedgerState>,
    signals: broadcast::Sender<Signal>,
    available: AtomicBool,
}

/// Shared in-memory ledger. Cloning yields another handle on the same history.
#[derive(Clone)]
pub struct InMemoryLedger {
    inner: Arc<LedgerInner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_signal_capacity(DEFAULT_SIGNAL_CAPACITY)
    }

    pub fn with_signal_capacity(capacity: usize) -> Self {
        let (signals, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(LedgerInner {
                state: RwLock::new(LedgerState::default()),
                signals,
                available: AtomicBool::new(true),
            }),
        }
    }

    /// A cell authoring actions as `agent`.
    pub fn cell(&self, agent: AgentKey) -> LedgerCell {
        LedgerCell {
            ledger: self.clone(),
            agent,
        }
    }

    /// A cell for a locally named agent.
    pub fn agent_cell(&self, name: &str) -> LedgerCell {
        self.cell(AgentKey::from_seed(name))
    }

    /// Simulate the substrate becoming unreachable (or reachable again).
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Number of live push-channel subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.signals.receiver_count()
    }

    /// Total actions appended, including deletes.
    pub fn action_count(&self) -> usize {
        self.inner
            .state
            .read()
            .map(|state| state.actions.len())
            .unwrap_or(0)
    }

    /// Push a raw signal to every subscriber, as a remote peer would.
    pub fn inject_signal(&self, signal: Signal) {
        // No subscribers is not an error for a broadcast.
        let _ = self.inner.signals.send(signal);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                reason: "ledger unreachable".to_string(),
            })
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, LedgerState>> {
        self.ensure_available()?;
        self.inner.state.read().map_err(|_| StoreError::Unavailable {
            reason: "ledger lock poisoned".to_string(),
        })
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, LedgerState>> {
        self.ensure_available()?;
        self.inner.state.write().map_err(|_| StoreError::Unavailable {
            reason: "ledger lock poisoned".to_string(),
        })
    }

    fn emit(&self, zome: &str, signals: Vec<NotesSignal>) {
        for signal in signals {
            match signal.into_signal(zome) {
                Ok(signal) => self.inject_signal(signal),
                Err(err) => tracing::warn!(error = %err, "failed to encode signal"),
            }
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// One agent's view of an [`InMemoryLedger`].
#[derive(Clone)]
pub struct LedgerCell {
    ledger: InMemoryLedger,
    agent: AgentKey,
}

impl LedgerCell {
    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }
}

fn signal_action(stored: &StoredAction) -> SignalAction {
    SignalAction::new(stored.signed.hash, Some(stored.signed.action.clone()))
}

fn link_signal(link: &Link, created: bool) -> NotesSignal {
    let action = SignalAction::new(link.create_link_hash, None);
    if created {
        NotesSignal::LinkCreated {
            action,
            link_type: link.link_type,
        }
    } else {
        NotesSignal::LinkDeleted {
            action,
            link_type: link.link_type,
        }
    }
}

fn stored_note(stored: &StoredAction) -> StoreResult<Note> {
    let bytes = stored.entry.as_deref().ok_or(StoreError::NotFound {
        hash: stored.signed.hash,
    })?;
    Ok(NoteCodec::decode(bytes)?)
}

#[async_trait]
impl RecordStore for LedgerCell {
    fn agent(&self) -> AgentKey {
        self.agent
    }

    fn subscribe(&self) -> SignalSubscription {
        SignalSubscription::new(self.ledger.inner.signals.subscribe())
    }

    async fn create_note(&self, note: Note) -> StoreResult<Record> {
        let bytes = NoteCodec::encode(&note)?;
        let (stored, link) = {
            let mut state = self.ledger.write()?;
            let stored = state.append(self.agent, ActionKind::Create, Some((EntryType::Note, bytes)))?;
            let link = state.create_link(
                self.agent,
                LinkBase::Anchor(LIST_NOTES_ANCHOR.to_string()),
                stored.signed.hash,
                LinkType::ListNotes,
            );
            (stored, link)
        };
        tracing::debug!(hash = %stored.signed.hash.short(), seq = stored.signed.action.seq, "note created");

        self.ledger.emit(
            NOTES_ZOME,
            vec![
                NotesSignal::EntryCreated {
                    action: signal_action(&stored),
                    app_entry: AppEntry::Note(note),
                },
                link_signal(&link, true),
            ],
        );
        Ok(stored.record())
    }

    async fn update_note(&self, input: UpdateNoteInput) -> StoreResult<Record> {
        let bytes = NoteCodec::encode(&input.updated_note)?;
        let (stored, previous_note) = {
            let mut state = self.ledger.write()?;
            validate_update(
                input.original_note_hash,
                state.action(&input.original_note_hash),
                input.previous_note_hash,
                state.action(&input.previous_note_hash),
            )?;
            let previous_note = match state.actions.get(&input.previous_note_hash) {
                Some(previous) => stored_note(previous)?,
                None => {
                    return Err(StoreError::NotFound {
                        hash: input.previous_note_hash,
                    })
                }
            };
            let stored = state.append(
                self.agent,
                ActionKind::Update {
                    original_action_hash: input.original_note_hash,
                    previous_action_hash: input.previous_note_hash,
                },
                Some((EntryType::Note, bytes)),
            )?;
            state.create_link(
                self.agent,
                LinkBase::Action(input.original_note_hash),
                stored.signed.hash,
                LinkType::NoteUpdates,
            );
            (stored, previous_note)
        };
        tracing::debug!(
            hash = %stored.signed.hash.short(),
            previous = %input.previous_note_hash.short(),
            seq = stored.signed.action.seq,
            "note updated"
        );

        self.ledger.emit(
            NOTES_ZOME,
            vec![NotesSignal::EntryUpdated {
                action: signal_action(&stored),
                app_entry: AppEntry::Note(input.updated_note),
                original_app_entry: AppEntry::Note(previous_note),
            }],
        );
        Ok(stored.record())
    }

    async fn delete_note(&self, original_note_hash: ActionHash) -> StoreResult<ActionHash> {
        let (stored, deleted_note, removed_links) = {
            let mut state = self.ledger.write()?;
            validate_delete(original_note_hash, state.action(&original_note_hash))?;
            let deleted_note = match state.actions.get(&original_note_hash) {
                Some(target) => stored_note(target)?,
                None => {
                    return Err(StoreError::NotFound {
                        hash: original_note_hash,
                    })
                }
            };
            let stored = state.append(
                self.agent,
                ActionKind::Delete {
                    deletes_action_hash: original_note_hash,
                },
                None,
            )?;
            let removed_links = match state.resolve_original(original_note_hash) {
                Some(original) => state.delete_links_to(
                    &LinkBase::Anchor(LIST_NOTES_ANCHOR.to_string()),
                    LinkType::ListNotes,
                    original,
                ),
                None => Vec::new(),
            };
            (stored, deleted_note, removed_links)
        };
        tracing::debug!(
            target_hash = %original_note_hash.short(),
            delete = %stored.signed.hash.short(),
            "note deleted"
        );

        let mut signals = vec![NotesSignal::EntryDeleted {
            action: signal_action(&stored),
            original_app_entry: AppEntry::Note(deleted_note),
        }];
        signals.extend(removed_links.iter().map(|link| link_signal(link, false)));
        self.ledger.emit(NOTES_ZOME, signals);
        Ok(stored.signed.hash)
    }

    async fn get_original_note(
        &self,
        original_note_hash: ActionHash,
    ) -> StoreResult<Option<Record>> {
        let state = self.ledger.read()?;
        Ok(state
            .actions
            .get(&original_note_hash)
            .filter(|stored| stored.signed.action.entry_type == Some(EntryType::Note))
            .map(StoredAction::record))
    }

    async fn get_latest_note(&self, note_hash: ActionHash) -> StoreResult<Option<Record>> {
        let state = self.ledger.read()?;
        let Some(original) = state.resolve_original(note_hash) else {
            return Ok(None);
        };
        // Highest substrate sequence number wins when the chain has branched.
        let latest = state
            .updates_of(original)
            .last()
            .copied()
            .or_else(|| state.actions.get(&original));
        Ok(latest.map(StoredAction::record))
    }

    async fn get_all_revisions_for_note(
        &self,
        original_note_hash: ActionHash,
    ) -> StoreResult<Vec<Record>> {
        let state = self.ledger.read()?;
        let Some(original) = state.resolve_original(original_note_hash) else {
            return Ok(Vec::new());
        };
        let Some(first) = state.actions.get(&original) else {
            return Ok(Vec::new());
        };
        let mut revisions = vec![first.record()];
        revisions.extend(state.updates_of(original).into_iter().map(StoredAction::record));
        Ok(revisions)
    }

    async fn get_oldest_delete_for_note(
        &self,
        note_hash: ActionHash,
    ) -> StoreResult<Option<SignedAction>> {
        Ok(self
            .get_all_deletes_for_note(note_hash)
            .await?
            .and_then(|deletes| deletes.into_iter().next()))
    }

    async fn get_all_deletes_for_note(
        &self,
        note_hash: ActionHash,
    ) -> StoreResult<Option<Vec<SignedAction>>> {
        let state = self.ledger.read()?;
        Ok(state
            .resolve_original(note_hash)
            .map(|original| state.deletes_of(original)))
    }

    async fn get_list_notes(&self) -> StoreResult<Vec<Link>> {
        let state = self.ledger.read()?;
        Ok(state
            .live_links(
                &LinkBase::Anchor(LIST_NOTES_ANCHOR.to_string()),
                LinkType::ListNotes,
            )
            .into_iter()
            .cloned()
            .collect())
    }

    async fn create_profile(&self, profile: Profile) -> StoreResult<Record> {
        let bytes = encode_entry(EntryType::Profile, &profile)?;
        let stored = {
            let mut state = self.ledger.write()?;
            let base = LinkBase::Agent(self.agent);
            let has_profile = !state.live_links(&base, LinkType::AgentToProfile).is_empty();
            validate_create_profile(has_profile, &profile)?;
            let stored =
                state.append(self.agent, ActionKind::Create, Some((EntryType::Profile, bytes)))?;
            state.create_link(self.agent, base, stored.signed.hash, LinkType::AgentToProfile);
            stored
        };
        tracing::debug!(hash = %stored.signed.hash.short(), "profile created");

        self.ledger.emit(
            PROFILE_ZOME,
            vec![NotesSignal::EntryCreated {
                action: signal_action(&stored),
                app_entry: AppEntry::Profile(profile),
            }],
        );
        Ok(stored.record())
    }

    async fn get_profile(&self, profile_hash: ActionHash) -> StoreResult<Option<Record>> {
        let state = self.ledger.read()?;
        Ok(state
            .actions
            .get(&profile_hash)
            .filter(|stored| stored.signed.action.entry_type == Some(EntryType::Profile))
            .map(StoredAction::record))
    }

    async fn get_my_profile(&self) -> StoreResult<Option<Record>> {
        let state = self.ledger.read()?;
        let links = state.live_links(&LinkBase::Agent(self.agent), LinkType::AgentToProfile);
        Ok(links
            .first()
            .and_then(|link| state.actions.get(&link.target))
            .map(StoredAction::record))
    }
}
