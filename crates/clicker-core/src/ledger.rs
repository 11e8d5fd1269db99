//! The request pipeline around the engine: load, normalize, act, store.
//!
//! A [`Ledger`] pairs a [`StateStore`] with the key it manages and a gate
//! that admits one pipeline at a time. Two concurrent actions can therefore
//! never interleave their load/store pairs and drop each other's effect.
//! The engine itself stays synchronous and lock-free.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::catalog;
use crate::codec::{self, EncodeError};
use crate::engine::{self, Action};
use crate::error::EngineError;
use crate::money::{Millis, Money};
use crate::state::GameState;
use crate::store::{PLAYER_KEY, StateStore, StoreError};

/// Anything that can go wrong in one pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The engine refused the action. The caller is at fault.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("state store failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl LedgerError {
    /// Whether this should be reported to the caller as their mistake.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LedgerError::Engine(e) if e.is_client_error())
    }
}

/// Serialised access to one player's stored state.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    key: String,
    gate: Mutex<()>,
}

impl<S: StateStore> Ledger<S> {
    /// A ledger for the default player key.
    pub fn new(store: S) -> Self {
        Self::with_key(store, PLAYER_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            gate: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load and normalize the state, persist the normalized record, and
    /// return it.
    pub fn snapshot(&self, now: Millis) -> Result<GameState, LedgerError> {
        let _guard = self.enter();
        self.load_normalized(now)
    }

    /// Load and normalize, apply `action`, then finalize and persist.
    ///
    /// When the engine refuses the action the normalized record (accrued
    /// income, anchored `last_update`) is still persisted, and the error is
    /// returned.
    pub fn perform(&self, action: Action, now: Millis) -> Result<GameState, LedgerError> {
        let _guard = self.enter();
        let mut state = self.load_normalized(now)?;

        let outcome = engine::apply(&mut state, action).inspect_err(|err| {
            tracing::debug!(?action, error = %err, "action refused");
        })?;
        tracing::debug!(
            ?action,
            delta = outcome.balance_delta,
            balance = state.balance,
            "action applied"
        );
        if outcome.tier_up {
            tracing::info!(tier = state.tier, "tier up");
        }

        let unlocked = engine::finalize(&mut state);
        log_unlocked(&unlocked, state.balance);
        self.save(&state)?;
        Ok(state)
    }

    /// The gate guards no data, so a pipeline that panicked while holding
    /// it leaves nothing half-written behind and the poison is dropped.
    fn enter(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_normalized(&self, now: Millis) -> Result<GameState, LedgerError> {
        let blob = self.store.load(&self.key)?;
        let mut state = codec::decode_or_fresh(blob.as_deref(), now);

        let normalized = engine::normalize(&mut state, now);
        if normalized.income_granted > 0.0 {
            tracing::debug!(income = normalized.income_granted, "passive income accrued");
        }
        log_unlocked(&normalized.unlocked, state.balance);

        self.save(&state)?;
        Ok(state)
    }

    fn save(&self, state: &GameState) -> Result<(), LedgerError> {
        let violations = state.check_invariants();
        if !violations.is_empty() {
            tracing::warn!(?violations, "storing state that breaks invariants");
        }
        let blob = codec::encode(state)?;
        self.store.store(&self.key, &blob)?;
        Ok(())
    }
}

fn log_unlocked(ids: &[&'static str], balance: Money) {
    if ids.is_empty() {
        return;
    }
    let next = catalog::next_achievement(balance).map(|a| a.id);
    for id in ids {
        tracing::info!(achievement = *id, next = ?next, "achievement unlocked");
    }
}
