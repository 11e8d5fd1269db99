/// Currency amounts: balance, income per second, prices.
///
/// Balances are integer-valued in practice but intermediate values may be
/// fractional, so the wire and the engine both carry `f64`.
pub type Money = f64;

/// Wall-clock milliseconds since the Unix epoch.
pub type Millis = u64;

/// Multiplier applied to a generator's `income_base` on every upgrade.
pub const UPGRADE_GROWTH: f64 = 1.15;

/// Decimal places kept on `income_base` after each growth step.
pub const INCOME_BASE_PLACES: u32 = 4;

/// Round to the nearest integer, sending exact `.5` ties toward +infinity.
///
/// This is the rounding every persisted `upgradeCost` goes through, so it
/// must stay bit-compatible with saves produced by older servers.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to `places` decimal places using the exact value of the double,
/// ties away from zero, and return the nearest double to that decimal.
///
/// Exact decimal ties can only occur on the dyadic grid `k / 2^(places+1)`.
/// On that grid the scaled value is computed without error, so ties are
/// resolved by hand; everywhere else the exact-digit formatter already picks
/// the closest decimal.
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(places as i32);
    let grid = 2f64.powi(places as i32 + 1);
    let exact_limit = 2f64.powi(53) / grid / 5f64.powi(places as i32);

    if (value * grid).fract() == 0.0 && value.abs() < exact_limit {
        let scaled = (value * scale).abs();
        let floor = scaled.floor();
        let rounded = if scaled - floor >= 0.5 { floor + 1.0 } else { floor };
        return rounded.copysign(value) / scale;
    }

    format!("{value:.prec$}", prec = places as usize)
        .parse()
        .unwrap_or(value)
}

/// Apply one upgrade's growth step to an income base.
#[inline]
pub fn grow_income_base(income_base: f64) -> f64 {
    round_to_places(income_base * UPGRADE_GROWTH, INCOME_BASE_PLACES)
}

/// Whole seconds between two timestamps, clamped at zero when the clock
/// went backwards.
#[inline]
pub fn elapsed_whole_seconds(from: Millis, to: Millis) -> u64 {
    to.saturating_sub(from) / 1000
}
