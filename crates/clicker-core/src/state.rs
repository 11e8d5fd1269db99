//! The per-player economy record and its structural invariants.
//!
//! A [`GameState`] is plain data. Every rule that changes it lives in
//! [`crate::engine`]; this module only knows how to build a fresh record,
//! answer read-only questions about it, and put a hand-edited or outdated
//! record back into shape.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::{self, ACHIEVEMENTS, DEFAULT_INCOME_BASE, GENERATOR_COUNT, STARTER_GENERATOR};
use crate::money::{Millis, Money};

/// Upgrades needed within one tier before the tier advances.
pub const LEVELS_PER_TIER: u32 = 20;

/// Cost-scaling multiplier at `global_level == 0`.
pub const BASE_COST_MULTIPLIER: u32 = 5;

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// An income-producing unit. Identity is `index`, which never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generator {
    pub index: u32,
    /// Base income before index scaling. Grows by 15% per upgrade.
    pub income_base: f64,
    pub level: u32,
    pub purchased: bool,
    /// One-time purchase price, fixed when the state was created.
    pub buy_cost: Money,
    /// Derived: `round(income_base * index * n)`. Refreshed on every
    /// load and save, never trusted from storage.
    pub upgrade_cost: Money,
}

impl Generator {
    /// The catalog generator at `index`, unowned unless it is the starter.
    ///
    /// Returns `None` for an index outside the catalog.
    pub fn from_catalog(index: u32) -> Option<Self> {
        let buy_cost = catalog::buy_cost(index)?;
        Some(Self {
            index,
            income_base: DEFAULT_INCOME_BASE,
            level: 0,
            purchased: index == STARTER_GENERATOR,
            buy_cost,
            upgrade_cost: 0.0,
        })
    }

    /// Income per second this generator yields once owned.
    #[inline]
    pub fn effective_income(&self) -> Money {
        self.income_base * f64::from(self.index)
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The single source of truth for one player's economy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub balance: Money,
    /// Prestige rank, starts at 1.
    pub tier: u32,
    /// Upgrades bought in the current tier, always below [`LEVELS_PER_TIER`].
    pub global_level: u32,
    /// Cost multiplier, always `5 + global_level` after a recalculation.
    pub n: u32,
    /// When passive income was last accrued. Zero means "never".
    pub last_update: Millis,
    /// Exactly [`GENERATOR_COUNT`] entries in index order.
    pub generators: Vec<Generator>,
    pub unlocked_achievements: BTreeSet<String>,
}

impl GameState {
    /// A fresh record: empty balance, tier 1, only the starter generator
    /// owned, income anchored at `now`.
    pub fn new(now: Millis) -> Self {
        Self {
            balance: 0.0,
            tier: 1,
            global_level: 0,
            n: BASE_COST_MULTIPLIER,
            last_update: now,
            generators: (1..=GENERATOR_COUNT)
                .filter_map(Generator::from_catalog)
                .collect(),
            unlocked_achievements: BTreeSet::new(),
        }
    }

    /// The multiplier `n` implied by the current `global_level`.
    #[inline]
    pub fn cost_multiplier(&self) -> u32 {
        BASE_COST_MULTIPLIER + self.global_level
    }

    /// Sum of effective income over every owned generator.
    pub fn total_income_per_second(&self) -> Money {
        self.generators
            .iter()
            .filter(|g| g.purchased)
            .fold(0.0, |sum, g| sum + g.effective_income())
    }

    pub fn generator(&self, index: u32) -> Option<&Generator> {
        self.generators.iter().find(|g| g.index == index)
    }

    pub fn generator_mut(&mut self, index: u32) -> Option<&mut Generator> {
        self.generators.iter_mut().find(|g| g.index == index)
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked_achievements.contains(achievement_id)
    }

    /// Bring a record that may predate the current rules back inside the
    /// invariants. Idempotent; a healthy state is left untouched.
    ///
    /// - generators: sorted by index, duplicates and unknown indices
    ///   dropped, missing catalog entries added, starter forced owned
    /// - numbers: non-finite or negative balances become 0, non-positive
    ///   income bases reset to the default, `tier` at least 1
    /// - an out-of-range `global_level` is folded into whole tiers
    /// - `n` recomputed, unknown achievement ids kept (never removed)
    pub fn repair(&mut self) {
        let mut generators: Vec<Generator> = (1..=GENERATOR_COUNT)
            .filter_map(|index| {
                self.generator(index)
                    .cloned()
                    .or_else(|| Generator::from_catalog(index))
            })
            .collect();
        for generator in &mut generators {
            if !generator.income_base.is_finite() || generator.income_base <= 0.0 {
                generator.income_base = DEFAULT_INCOME_BASE;
            }
            if !generator.buy_cost.is_finite() || generator.buy_cost < 0.0 {
                generator.buy_cost = catalog::buy_cost(generator.index).unwrap_or(0.0);
            }
            if generator.index == STARTER_GENERATOR {
                generator.purchased = true;
            }
        }
        self.generators = generators;

        if !self.balance.is_finite() || self.balance < 0.0 {
            self.balance = 0.0;
        }
        self.tier = self.tier.max(1);
        if self.global_level >= LEVELS_PER_TIER {
            self.tier = self
                .tier
                .saturating_add(self.global_level / LEVELS_PER_TIER);
            self.global_level %= LEVELS_PER_TIER;
        }
        self.n = self.cost_multiplier();
    }

    /// Every invariant the record currently breaks. Empty when healthy.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if !self.balance.is_finite() || self.balance < 0.0 {
            violations.push(InvariantViolation::NegativeBalance(self.balance));
        }
        if self.tier < 1 {
            violations.push(InvariantViolation::TierBelowOne);
        }
        if self.global_level >= LEVELS_PER_TIER {
            violations.push(InvariantViolation::GlobalLevelOutOfRange(self.global_level));
        }
        if self.n != self.cost_multiplier() {
            violations.push(InvariantViolation::MultiplierMismatch {
                n: self.n,
                global_level: self.global_level,
            });
        }

        let indices: Vec<u32> = self.generators.iter().map(|g| g.index).collect();
        let expected: Vec<u32> = (1..=GENERATOR_COUNT).collect();
        if indices != expected {
            violations.push(InvariantViolation::GeneratorLayout(indices));
        }
        if !self
            .generator(STARTER_GENERATOR)
            .is_some_and(|g| g.purchased)
        {
            violations.push(InvariantViolation::StarterNotOwned);
        }

        for a in ACHIEVEMENTS.iter() {
            if self.balance >= a.threshold && !self.is_unlocked(a.id) {
                violations.push(InvariantViolation::AchievementMissing(a.id));
            }
        }

        violations
    }
}

/// A broken invariant reported by [`GameState::check_invariants`].
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    NegativeBalance(Money),
    TierBelowOne,
    GlobalLevelOutOfRange(u32),
    MultiplierMismatch { n: u32, global_level: u32 },
    /// Generator indices are not exactly `1..=GENERATOR_COUNT` in order.
    GeneratorLayout(Vec<u32>),
    StarterNotOwned,
    /// Balance is at or above a threshold whose id was never recorded.
    AchievementMissing(&'static str),
}
