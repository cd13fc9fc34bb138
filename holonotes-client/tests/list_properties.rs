use holonotes_client::{ClientSettings, ConnectionContext, LiveNoteListController, RevisionChain};
use holonotes_core::{ActionHash, NotesError};
use holonotes_store::{InMemoryLedger, RecordStore};
use holonotes_test_utils::{
    arb_action_hash, arb_note, hash_of, non_matching_signals, note_created_signal, sample_note,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn mounted(ledger: &InMemoryLedger) -> (ConnectionContext, LiveNoteListController) {
    let ctx = ConnectionContext::ready(
        ClientSettings::default(),
        Arc::new(ledger.agent_cell("alice")),
    )
    .unwrap();
    let list = LiveNoteListController::mount(&ctx).unwrap();
    (ctx, list)
}

/// One step of a list's life.
#[derive(Debug, Clone)]
enum Step {
    Signal(usize),
    Bootstrap,
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0usize..4).prop_map(Step::Signal),
            1 => Just(Step::Bootstrap),
        ],
        0..24,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn repeated_signals_keep_a_hash_once(hash in arb_action_hash(), repeats in 1usize..8) {
        let ledger = InMemoryLedger::new();
        let (_ctx, list) = mounted(&ledger);
        let signal = note_created_signal(hash);

        let changed: Vec<bool> = (0..repeats).map(|_| list.on_signal(&signal)).collect();
        prop_assert!(changed[0]);
        prop_assert!(changed[1..].iter().all(|c| !c));
        prop_assert_eq!(list.current_view(), vec![hash]);
    }

    #[test]
    fn signals_and_bootstrap_commute(steps in arb_steps(), notes in prop::collection::vec(arb_note(), 4)) {
        runtime().block_on(async {
            let ledger = InMemoryLedger::new();
            let (ctx, list) = mounted(&ledger);
            let chain = RevisionChain::new(&ctx);
            let mut hashes = Vec::new();
            for note in notes {
                hashes.push(chain.create(note).await.unwrap());
            }

            let mut signalled = HashSet::new();
            let mut bootstrapped = false;
            for step in &steps {
                match step {
                    Step::Signal(i) => {
                        list.on_signal(&note_created_signal(hashes[*i]));
                        signalled.insert(hashes[*i]);
                    }
                    Step::Bootstrap => {
                        list.bootstrap().await.unwrap();
                        bootstrapped = true;
                    }
                }
            }

            let view = list.current_view();
            let unique: HashSet<ActionHash> = view.iter().copied().collect();
            prop_assert_eq!(unique.len(), view.len());

            let expected: HashSet<ActionHash> = if bootstrapped {
                hashes.iter().copied().collect()
            } else {
                signalled
            };
            prop_assert_eq!(unique, expected);
            Ok(())
        })?;
    }

    #[test]
    fn non_matching_signals_never_change_the_view(hash in arb_action_hash()) {
        let ledger = InMemoryLedger::new();
        let (_ctx, list) = mounted(&ledger);
        for signal in non_matching_signals(hash) {
            prop_assert!(!list.on_signal(&signal));
        }
        prop_assert!(list.current_view().is_empty());
    }

    #[test]
    fn local_delete_excludes_hash(
        hashes in prop::collection::vec(arb_action_hash(), 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let ledger = InMemoryLedger::new();
        let (_ctx, list) = mounted(&ledger);
        for hash in &hashes {
            list.on_signal(&note_created_signal(*hash));
        }
        let target = *pick.get(&hashes);
        list.on_local_delete(&target);
        list.on_signal(&note_created_signal(target));
        prop_assert!(!list.current_view().contains(&target));
    }

    #[test]
    fn failed_delete_restores_position(count in 2usize..6, pick in any::<prop::sample::Index>()) {
        runtime().block_on(async {
            let ledger = InMemoryLedger::new();
            let (ctx, list) = mounted(&ledger);
            let chain = RevisionChain::new(&ctx);
            for i in 0..count {
                chain.create(sample_note(&format!("n{i}"), "c")).await.unwrap();
            }
            list.bootstrap().await.unwrap();
            let before = list.current_view();
            let target = *pick.get(&before);

            ledger.set_available(false);
            let result = list.delete_note(&target).await;
            prop_assert!(matches!(result, Err(NotesError::Transport(_))));
            prop_assert_eq!(list.current_view(), before);
            Ok(())
        })?;
    }
}

#[test]
fn dropping_the_controller_releases_its_subscription() {
    let ledger = InMemoryLedger::new();
    let (_ctx, list) = mounted(&ledger);
    assert_eq!(ledger.subscriber_count(), 1);
    drop(list);
    assert_eq!(ledger.subscriber_count(), 0);
}

#[test]
fn unknown_delete_restores_and_reports_not_found() {
    runtime().block_on(async {
        let ledger = InMemoryLedger::new();
        let (_ctx, list) = mounted(&ledger);
        let ghost = hash_of("never created");
        list.on_signal(&note_created_signal(ghost));

        let err = list.delete_note(&ghost).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(list.current_view(), vec![ghost]);
        assert!(ledger.agent_cell("alice").get_list_notes().await.unwrap().is_empty());
    });
}
