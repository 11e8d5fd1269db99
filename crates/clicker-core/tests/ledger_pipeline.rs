//! End-to-end runs of the load -> normalize -> act -> store pipeline.

use std::sync::Arc;
use std::thread;

use clicker_core::codec;
use clicker_core::engine::Action;
use clicker_core::error::EngineError;
use clicker_core::ledger::{Ledger, LedgerError};
use clicker_core::state::GameState;
use clicker_core::store::{FileStore, MemoryStore, PLAYER_KEY, StateStore};
use clicker_core::test_utils::*;

#[test]
fn ten_idle_seconds_pay_ten() {
    let mut state = fresh_state();
    state.last_update = T0 - secs(10);
    let ledger = ledger_with_state(&state);

    let state = ledger.snapshot(T0).unwrap();
    assert_eq!(state.balance, 10.0);
    assert!(state.is_unlocked("b_10"));
}

#[test]
fn buying_without_funds_changes_nothing_but_time() {
    let ledger = ledger_with_state(&state_with_balance(100.0));

    let err = ledger.perform(Action::Buy(2), T0).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Engine(EngineError::InsufficientBalance { required, available })
            if required == 200.0 && available == 100.0
    ));

    let state = ledger.snapshot(T0).unwrap();
    assert_eq!(state.balance, 100.0);
    assert!(!state.generator(2).unwrap().purchased);
}

#[test]
fn a_full_session() {
    let ledger = Ledger::new(MemoryStore::new());
    ledger.snapshot(T0).unwrap();

    // Idle for five minutes, then buy the second generator.
    let now = T0 + secs(300);
    let state = ledger.perform(Action::Buy(2), now).unwrap();
    assert_eq!(state.balance, 100.0);
    assert_eq!(state.total_income_per_second(), 3.0);

    // Tap a few times and upgrade generator 2: round(1 * 2 * 5) = 10.
    for _ in 0..3 {
        ledger.perform(Action::Tap, now).unwrap();
    }
    let state = ledger.perform(Action::Upgrade(2), now).unwrap();
    assert_eq!(state.balance, 99.0);
    assert_eq!(state.generator(2).unwrap().income_base, 1.15);
    assert_eq!(state.global_level, 1);
    assert_eq!(state.generator(2).unwrap().upgrade_cost, 14.0);

    // Achievements earned along the way stay after spending.
    let unlocked: Vec<&str> = state
        .unlocked_achievements
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(unlocked, vec!["b_10", "b_100", "b_250", "b_50"]);
    assert!(state.check_invariants().is_empty());
}

#[test]
fn tier_up_through_the_ledger() {
    let mut state = state_with_balance(1_000.0);
    state.global_level = 19;
    let ledger = ledger_with_state(&state);

    let state = ledger.perform(Action::Upgrade(1), T0).unwrap();
    assert_eq!(state.tier, 2);
    assert_eq!(state.global_level, 0);
    assert_eq!(state.n, 5);
}

#[test]
fn legacy_blob_without_derived_fields_loads() {
    let blob = format!(
        r#"{{"balance":612,"tier":1,"globalLevel":4,"lastUpdate":{T0},
            "generators":[{{"index":1,"incomeBase":1.749,"level":4,"purchased":true}},
                          {{"index":2,"incomeBase":1,"level":0,"purchased":false}}],
            "unlockedAchievements":["b_10","b_50","b_100","b_250","b_500"]}}"#
    );
    let ledger = ledger_with_blob(&blob);

    let state = ledger.snapshot(T0).unwrap();
    assert_eq!(state.generators.len(), 5);
    assert_eq!(state.n, 9);
    // round(1.749 * 1 * 9) = round(15.741) = 16
    assert_eq!(state.generator(1).unwrap().upgrade_cost, 16.0);
    assert_eq!(state.generator(5).unwrap().buy_cost, 500.0);
}

#[test]
fn file_store_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ledger = Ledger::new(FileStore::new(dir.path()));
        ledger.snapshot(T0).unwrap();
        ledger.perform(Action::Tap, T0).unwrap();
    }

    let ledger = Ledger::new(FileStore::new(dir.path()));
    let state = ledger.snapshot(T0 + secs(2)).unwrap();
    assert_eq!(state.balance, 3.0);
}

#[test]
fn corrupt_file_is_a_fresh_start() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    store.store(PLAYER_KEY, "\u{0}garbage").unwrap();

    let ledger = Ledger::new(store);
    let state = ledger.snapshot(T0).unwrap();
    assert_eq!(state.balance, 0.0);
    assert_eq!(state.last_update, T0);

    let blob = ledger.store().load(PLAYER_KEY).unwrap().unwrap();
    assert!(codec::decode(&blob).is_ok());
}

#[test]
fn concurrent_taps_are_never_lost() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Arc::new(Ledger::new(FileStore::new(dir.path())));
    ledger.snapshot(T0).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..25 {
                    ledger.perform(Action::Tap, T0).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let state: GameState = ledger.snapshot(T0).unwrap();
    assert_eq!(state.balance, 200.0);
}

#[test]
fn separate_keys_are_separate_players() {
    let store = Arc::new(MemoryStore::new());
    let alice = Ledger::with_key(Arc::clone(&store), "alice");
    let bob = Ledger::with_key(Arc::clone(&store), "bob");

    alice.snapshot(T0).unwrap();
    bob.snapshot(T0).unwrap();
    alice.perform(Action::Tap, T0).unwrap();

    assert_eq!(alice.snapshot(T0).unwrap().balance, 1.0);
    assert_eq!(bob.snapshot(T0).unwrap().balance, 0.0);
}
