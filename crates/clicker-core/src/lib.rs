//! Clicker Core -- the authoritative economy engine for an idle clicker.
//!
//! This crate owns the single source of truth for a player's balance,
//! generators, tier progression, and achievements, and advances that state
//! deterministically across elapsed wall-clock time and discrete actions.
//!
//! # Request Pipeline
//!
//! Every request against the stored record runs:
//!
//! 1. **Load** -- read the blob from the [`store::StateStore`]; absent or
//!    corrupt data becomes a fresh [`state::GameState`].
//! 2. **Normalize** -- accrue passive income, unlock achievements, refresh
//!    costs ([`engine::normalize`]).
//! 3. **Act** -- optionally tap, buy, or upgrade ([`engine::apply`]).
//! 4. **Finalize** -- unlock achievements and refresh costs again.
//! 5. **Store** -- write the record back.
//!
//! [`ledger::Ledger`] runs this pipeline and serialises concurrent runs.
//!
//! # Key Types
//!
//! - [`state::GameState`] / [`state::Generator`] -- the persisted record.
//! - [`engine::Action`] -- tap, buy, upgrade.
//! - [`error::EngineError`] -- why an action was refused.
//! - [`catalog`] -- generator prices and the achievement ladder.
//! - [`money`] -- the rounding rules every price goes through.
//! - [`codec`] -- JSON wire format with lenient decoding.

pub mod catalog;
pub mod codec;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod money;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
