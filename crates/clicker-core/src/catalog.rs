//! Static game content: the generator lineup and the achievement ladder.
//!
//! Neither table is persisted per player. Saves only record which
//! generators are owned and which achievement ids have been unlocked.

use crate::money::Money;

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Number of generators every state carries, indexed `1..=GENERATOR_COUNT`.
pub const GENERATOR_COUNT: u32 = 5;

/// Index of the free starter generator. It is owned from the first load and
/// can never be sold back.
pub const STARTER_GENERATOR: u32 = 1;

/// Income base every generator starts from before any upgrade.
pub const DEFAULT_INCOME_BASE: f64 = 1.0;

/// One-time purchase price per generator, indexed from generator 1.
const BUY_COSTS: [Money; GENERATOR_COUNT as usize] = [0.0, 200.0, 300.0, 400.0, 500.0];

/// One-time purchase price for the generator at `index`, or `None` if no
/// such generator exists.
pub fn buy_cost(index: u32) -> Option<Money> {
    let slot = index.checked_sub(1)? as usize;
    BUY_COSTS.get(slot).copied()
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// A balance milestone. Unlocks the first time the balance reaches
/// `threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Achievement {
    pub id: &'static str,
    pub threshold: Money,
}

/// The achievement ladder, sorted by ascending threshold.
pub const ACHIEVEMENTS: [Achievement; 20] = [
    Achievement { id: "b_10", threshold: 10.0 },
    Achievement { id: "b_50", threshold: 50.0 },
    Achievement { id: "b_100", threshold: 100.0 },
    Achievement { id: "b_250", threshold: 250.0 },
    Achievement { id: "b_500", threshold: 500.0 },
    Achievement { id: "b_1k", threshold: 1_000.0 },
    Achievement { id: "b_2k5", threshold: 2_500.0 },
    Achievement { id: "b_5k", threshold: 5_000.0 },
    Achievement { id: "b_10k", threshold: 10_000.0 },
    Achievement { id: "b_25k", threshold: 25_000.0 },
    Achievement { id: "b_50k", threshold: 50_000.0 },
    Achievement { id: "b_100k", threshold: 100_000.0 },
    Achievement { id: "b_250k", threshold: 250_000.0 },
    Achievement { id: "b_500k", threshold: 500_000.0 },
    Achievement { id: "b_1m", threshold: 1_000_000.0 },
    Achievement { id: "b_2m5", threshold: 2_500_000.0 },
    Achievement { id: "b_5m", threshold: 5_000_000.0 },
    Achievement { id: "b_10m", threshold: 10_000_000.0 },
    Achievement { id: "b_50m", threshold: 50_000_000.0 },
    Achievement { id: "b_100m", threshold: 100_000_000.0 },
];

/// Achievements whose threshold `balance` has reached.
pub fn reached(balance: Money) -> impl Iterator<Item = &'static Achievement> {
    ACHIEVEMENTS.iter().filter(move |a| balance >= a.threshold)
}

/// The next milestone above `balance`, for progress display. `None` once
/// the whole ladder is behind the player.
pub fn next_achievement(balance: Money) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| balance < a.threshold)
}
