use holonotes_core::{
    ActionHash, Note, NoteCodec, Signal, StoreError, Timestamp, UpdateNoteInput, NOTES_ZOME,
};
use holonotes_store::{InMemoryLedger, RecordStore, SignalRecv};

fn note(title: &str, content: &str) -> Note {
    Note::new(title, content, Timestamp::from_micros(1_674_053_334_548_000))
}

fn drain(subscription: &mut holonotes_store::SignalSubscription) -> Vec<Signal> {
    let mut out = Vec::new();
    while let Some(SignalRecv::Signal(signal)) = subscription.try_recv() {
        out.push(signal);
    }
    out
}

#[tokio::test]
async fn create_then_read_back_from_another_agent() {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");
    let bob = ledger.agent_cell("bob");

    let created = alice.create_note(note("Groceries", "milk")).await.unwrap();
    let hash = created.action_hash();

    let fetched = bob.get_original_note(hash).await.unwrap().unwrap();
    assert_eq!(NoteCodec::decode_record(&fetched).unwrap().title, "Groceries");

    let listed = bob.get_list_notes().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].target, hash);
}

#[tokio::test]
async fn update_chain_latest_and_revisions() {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");
    let bob = ledger.agent_cell("bob");

    let original = alice.create_note(note("t", "v1")).await.unwrap().action_hash();
    let first = alice
        .update_note(UpdateNoteInput {
            original_note_hash: original,
            previous_note_hash: original,
            updated_note: note("t", "v2"),
        })
        .await
        .unwrap();
    assert_eq!(first.action().original_action_hash(), Some(original));
    assert_eq!(first.action().previous_action_hash(), Some(original));

    let second = bob
        .update_note(UpdateNoteInput {
            original_note_hash: original,
            previous_note_hash: first.action_hash(),
            updated_note: note("t", "v3"),
        })
        .await
        .unwrap();

    // Latest is reachable from any member of the chain.
    for hash in [original, first.action_hash(), second.action_hash()] {
        let latest = alice.get_latest_note(hash).await.unwrap().unwrap();
        assert_eq!(latest.action_hash(), second.action_hash());
    }

    let contents: Vec<String> = bob
        .get_all_revisions_for_note(original)
        .await
        .unwrap()
        .iter()
        .map(|record| NoteCodec::decode_record(record).unwrap().content)
        .collect();
    assert_eq!(contents, vec!["v1", "v2", "v3"]);

    // Updates do not add list links.
    assert_eq!(alice.get_list_notes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_list_link_but_keeps_history() {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");
    let bob = ledger.agent_cell("bob");

    let keep = alice.create_note(note("keep", "k")).await.unwrap().action_hash();
    let gone = alice.create_note(note("gone", "g")).await.unwrap().action_hash();

    let delete_hash = bob.delete_note(gone).await.unwrap();

    let targets: Vec<ActionHash> = alice
        .get_list_notes()
        .await
        .unwrap()
        .into_iter()
        .map(|link| link.target)
        .collect();
    assert_eq!(targets, vec![keep]);

    // The record remains retrievable.
    assert!(alice.get_original_note(gone).await.unwrap().is_some());
    let oldest = alice.get_oldest_delete_for_note(gone).await.unwrap().unwrap();
    assert_eq!(oldest.hash, delete_hash);
    assert_eq!(oldest.action.deletes_action_hash(), Some(gone));
    assert!(alice
        .get_all_deletes_for_note(keep)
        .await
        .unwrap()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn deleting_an_update_is_visible_from_the_original() {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");

    let original = alice.create_note(note("t", "v1")).await.unwrap().action_hash();
    let update = alice
        .update_note(UpdateNoteInput {
            original_note_hash: original,
            previous_note_hash: original,
            updated_note: note("t", "v2"),
        })
        .await
        .unwrap()
        .action_hash();

    alice.delete_note(update).await.unwrap();
    let deletes = alice.get_all_deletes_for_note(original).await.unwrap().unwrap();
    assert_eq!(deletes.len(), 1);
    assert!(alice.get_list_notes().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_of_unknown_original_is_not_found() {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");
    let missing = ActionHash::digest(b"nothing here");

    let err = alice
        .update_note(UpdateNoteInput {
            original_note_hash: missing,
            previous_note_hash: missing,
            updated_note: note("t", "c"),
        })
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound { hash: missing });
    assert!(alice.get_latest_note(missing).await.unwrap().is_none());
    assert!(alice.get_all_revisions_for_note(missing).await.unwrap().is_empty());
}

#[tokio::test]
async fn signals_follow_the_commit_order() {
    let ledger = InMemoryLedger::new();
    let alice = ledger.agent_cell("alice");
    let bob = ledger.agent_cell("bob");
    let mut subscription = bob.subscribe();

    let hash = alice.create_note(note("t", "v1")).await.unwrap().action_hash();
    alice
        .update_note(UpdateNoteInput {
            original_note_hash: hash,
            previous_note_hash: hash,
            updated_note: note("t", "v2"),
        })
        .await
        .unwrap();
    alice.delete_note(hash).await.unwrap();

    let signals = drain(&mut subscription);
    let kinds: Vec<String> = signals
        .iter()
        .filter_map(|signal| signal.notes_payload(NOTES_ZOME))
        .map(|payload| {
            serde_json::to_value(&payload).unwrap()["type"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "EntryCreated",
            "LinkCreated",
            "EntryUpdated",
            "EntryDeleted",
            "LinkDeleted"
        ]
    );
    let created: Vec<ActionHash> = signals
        .iter()
        .filter_map(|signal| signal.created_note_hash(NOTES_ZOME))
        .collect();
    assert_eq!(created, vec![hash]);
}
