//! The economy engine: every rule that moves a [`GameState`] forward.
//!
//! # Pipeline
//!
//! Each request runs the same sequence against one loaded record:
//!
//! 1. **Accrue** -- grant passive income for the whole seconds elapsed since
//!    `last_update`, then anchor `last_update` at the observation time.
//! 2. **Achievements** -- record every milestone the balance has reached.
//! 3. **Costs** -- refresh `n` and every generator's `upgrade_cost`.
//! 4. **Action** (optional) -- tap, buy, or upgrade.
//! 5. **Finalize** -- steps 2 and 3 again, so the stored record reflects
//!    the action.
//!
//! Steps 1-3 are [`normalize`]; step 5 is [`finalize`]. The engine holds no
//! state and never reads the clock: callers pass `now` explicitly.
//!
//! Every action checks all of its preconditions before touching the state,
//! so a refused action leaves the record bit-for-bit unchanged.

use crate::catalog;
use crate::error::EngineError;
use crate::money::{Millis, Money, elapsed_whole_seconds, grow_income_base, round_half_up};
use crate::state::{GameState, Generator, LEVELS_PER_TIER};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A discrete player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Instantly collect one second of passive income.
    Tap,
    /// Buy the generator at this index.
    Buy(u32),
    /// Upgrade the owned generator at this index.
    Upgrade(u32),
}

/// What a successful action did, for logging and callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Outcome {
    /// Signed change to the balance.
    pub balance_delta: Money,
    /// Set when an upgrade completed a tier.
    pub tier_up: bool,
}

/// What [`normalize`] changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    pub income_granted: Money,
    pub unlocked: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Grant passive income for the whole seconds between `last_update` and
/// `now`. Returns the amount granted.
///
/// `last_update` always moves to `now` afterwards, so a sub-second
/// remainder is measured from the latest observation rather than carried.
/// A clock that went backwards grants nothing and leaves `last_update`
/// where it was. A `last_update` of zero (never set) grants nothing.
pub fn accrue_income(state: &mut GameState, now: Millis) -> Money {
    let last = if state.last_update == 0 {
        now
    } else {
        state.last_update
    };
    let seconds = elapsed_whole_seconds(last, now);

    let mut granted = 0.0;
    if seconds > 0 {
        granted = state.total_income_per_second() * seconds as f64;
        state.balance += granted;
    }
    state.last_update = last.max(now);
    granted
}

/// Price of the next upgrade for `generator`: `round(income_base * index * n)`.
///
/// The single cost formula. Both the upgrade precondition and the persisted
/// `upgrade_cost` go through here, so they can never disagree.
#[inline]
pub fn upgrade_cost(state: &GameState, generator: &Generator) -> Money {
    cost_at(generator, state.cost_multiplier())
}

fn cost_at(generator: &Generator, n: u32) -> Money {
    round_half_up(generator.effective_income() * f64::from(n))
}

/// Refresh `n` and every generator's `upgrade_cost`.
pub fn recalc_costs(state: &mut GameState) {
    state.n = state.cost_multiplier();
    let n = state.n;
    for generator in &mut state.generators {
        generator.upgrade_cost = cost_at(generator, n);
    }
}

/// Record every achievement the current balance has reached. Returns the
/// ids that were newly added. Never removes an id.
pub fn apply_achievements(state: &mut GameState) -> Vec<&'static str> {
    catalog::reached(state.balance)
        .filter(|a| state.unlocked_achievements.insert(a.id.to_string()))
        .map(|a| a.id)
        .collect()
}

/// Load-side normalization: accrue, then achievements, then costs.
///
/// Must run exactly once per load, before any action.
pub fn normalize(state: &mut GameState, now: Millis) -> Normalized {
    let income_granted = accrue_income(state, now);
    let unlocked = apply_achievements(state);
    recalc_costs(state);
    Normalized {
        income_granted,
        unlocked,
    }
}

/// Save-side normalization: achievements, then costs. Returns newly
/// unlocked achievement ids.
pub fn finalize(state: &mut GameState) -> Vec<&'static str> {
    let unlocked = apply_achievements(state);
    recalc_costs(state);
    unlocked
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Collect one second of passive income. Always succeeds.
pub fn tap(state: &mut GameState) -> Money {
    let income = state.total_income_per_second();
    state.balance += income;
    income
}

/// Buy the generator at `index` for its fixed `buy_cost`.
pub fn buy(state: &mut GameState, index: u32) -> Result<Money, EngineError> {
    let available = state.balance;
    let generator = state
        .generator_mut(index)
        .filter(|g| !g.purchased)
        .ok_or(EngineError::GeneratorUnavailable { index })?;

    let cost = generator.buy_cost;
    if available < cost {
        return Err(EngineError::InsufficientBalance {
            required: cost,
            available,
        });
    }

    generator.purchased = true;
    state.balance -= cost;
    Ok(cost)
}

/// Receipt for a completed upgrade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Upgraded {
    /// Price paid, computed from the income base before growth.
    pub cost: Money,
    pub level: u32,
    pub tier_up: bool,
}

/// Upgrade the owned generator at `index`.
///
/// The price is computed from the current `income_base`: the player pays
/// for the level being left. After paying, the income base grows by 15%
/// (kept to 4 decimal places) and the global level advances. Completing
/// [`LEVELS_PER_TIER`] upgrades raises the tier and restarts the level
/// count at zero; any overflow is discarded.
pub fn upgrade(state: &mut GameState, index: u32) -> Result<Upgraded, EngineError> {
    let generator = state
        .generator(index)
        .filter(|g| g.purchased)
        .ok_or(EngineError::GeneratorUnavailable { index })?;

    let cost = upgrade_cost(state, generator);
    if state.balance < cost {
        return Err(EngineError::InsufficientBalance {
            required: cost,
            available: state.balance,
        });
    }

    state.balance -= cost;
    let generator = state
        .generator_mut(index)
        .ok_or(EngineError::GeneratorUnavailable { index })?;
    generator.level = generator.level.saturating_add(1);
    generator.income_base = grow_income_base(generator.income_base);
    let level = generator.level;

    state.global_level += 1;
    let tier_up = state.global_level >= LEVELS_PER_TIER;
    if tier_up {
        state.tier = state.tier.saturating_add(1);
        state.global_level = 0;
    }
    state.n = state.cost_multiplier();

    Ok(Upgraded {
        cost,
        level,
        tier_up,
    })
}

/// Apply one player action.
pub fn apply(state: &mut GameState, action: Action) -> Result<Outcome, EngineError> {
    match action {
        Action::Tap => Ok(Outcome {
            balance_delta: tap(state),
            tier_up: false,
        }),
        Action::Buy(index) => buy(state, index).map(|cost| Outcome {
            balance_delta: -cost,
            tier_up: false,
        }),
        Action::Upgrade(index) => upgrade(state, index).map(|receipt| Outcome {
            balance_delta: -receipt.cost,
            tier_up: receipt.tier_up,
        }),
    }
}
