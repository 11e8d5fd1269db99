//! Fixtures for the economy: pinned timestamps, prepared states, and
//! ledgers preloaded with a stored blob.
//!
//! Compiled for this crate's own tests and, through the `test-utils`
//! feature, for the integration tests, the server crate, and the benches.

use crate::engine;
use crate::ledger::Ledger;
use crate::money::{Millis, Money};
use crate::state::GameState;
use crate::store::{MemoryStore, PLAYER_KEY, StateStore};

/// A fixed epoch timestamp so tests never read the real clock.
pub const T0: Millis = 1_700_000_000_000;

/// Milliseconds in `secs` seconds.
pub fn secs(secs: u64) -> Millis {
    secs * 1_000
}

/// A normalized fresh state anchored at [`T0`].
pub fn fresh_state() -> GameState {
    let mut state = GameState::new(T0);
    engine::normalize(&mut state, T0);
    state
}

/// A normalized state anchored at [`T0`] holding `balance`.
///
/// Achievements are not applied, so callers can observe unlocks.
pub fn state_with_balance(balance: Money) -> GameState {
    let mut state = fresh_state();
    state.balance = balance;
    state
}

/// Mark the generators at `indices` as owned.
pub fn own(state: &mut GameState, indices: &[u32]) {
    for &index in indices {
        if let Some(g) = state.generator_mut(index) {
            g.purchased = true;
        }
    }
    engine::recalc_costs(state);
}

/// An in-memory ledger preloaded with `blob` under the default key.
pub fn ledger_with_blob(blob: &str) -> Ledger<MemoryStore> {
    let store = MemoryStore::new();
    store
        .store(PLAYER_KEY, blob)
        .expect("memory store accepts writes");
    Ledger::new(store)
}

/// An in-memory ledger preloaded with `state`.
pub fn ledger_with_state(state: &GameState) -> Ledger<MemoryStore> {
    let blob = crate::codec::encode(state).expect("state encodes");
    ledger_with_blob(&blob)
}
