//! Decimal Fixed-Point Arithmetic
//!
//! World coordinates, radii and speeds are unsigned integers scaled by
//! `10^DECIMALS`. All gameplay math is integer-only.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  1 world unit = 10^5 raw units                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  World:      [0, 1000] units  = [0, 100_000_000] raw        │
//! │  Trig:       sin/cos in [-1, 1] = [-100_000, 100_000] raw   │
//! │  Precision:  0.00001 units                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products of two scaled values must be divided by `DECIMAL_SCALE`
//! once; `scale_mul` does that with an `i128` intermediate.

/// Number of decimal digits after the point.
pub const DECIMALS: u32 = 5;

/// 1.0 in fixed-point (100_000).
pub const DECIMAL_SCALE: u64 = 10u64.pow(DECIMALS);

// =============================================================================
// GAME CONSTANTS (All as integer literals - NO float conversion!)
// =============================================================================

/// Side length of the square world: 1000 units.
pub const WORLD_SIZE: u64 = 1_000 * DECIMAL_SCALE;

/// Health of a freshly spawned ship.
pub const INITIAL_SHIP_HEALTH: u64 = 10;

/// Ship collision radius: 10 units.
pub const SHIP_SIZE: u64 = 10 * DECIMAL_SCALE;

/// Ship speed: 30 units per tick.
pub const SHIP_SPEED: u64 = 30 * DECIMAL_SCALE;

/// Angle quanta per full turn (1 quantum = 5 degrees).
pub const QUANTIZATION_LEVEL: u64 = 72;

/// Turn rate given to a freshly spawned ship, in quanta per tick.
pub const MAX_TURN_RATE: u64 = 6;

/// Gold held by a freshly spawned player.
pub const INITIAL_GOLD: u64 = 0;

/// Cannonballs held by a freshly spawned player.
pub const INITIAL_CANNONBALLS: u64 = 10;

/// Health removed by one cannon hit.
pub const CANNON_DAMAGE: u64 = 3;

/// Maximum aim distance.
pub const CANNON_RANGE: u64 = 3_000 * SHIP_SIZE;

/// Ticks between firing and impact; also the reload time.
pub const CANNON_WAIT_TIME: u64 = 5;

/// Radius of a cannonball impact circle.
pub const CANNONBALL_RADIUS: u64 = 1;

/// Minimum gold reward for a loot pickup.
pub const MIN_LOOT: u64 = 1;

/// Maximum gold reward for a loot pickup.
pub const MAX_LOOT: u64 = 10;

/// Loot collision radius (raw units).
pub const LOOT_SIZE: u64 = 10;

/// Loot batches (two loots each) seeded by every spawn.
pub const SPAWN_LOOT_BATCHES: u64 = 5;

// =============================================================================
// CORE OPERATIONS
// =============================================================================

/// Multiply two scaled values and rescale the product.
///
/// Uses an i128 intermediate; truncates toward zero.
#[inline]
pub fn scale_mul(a: i128, b: i128) -> i128 {
    a * b / DECIMAL_SCALE as i128
}

/// Clamp an i128 into the non-negative `u64` coordinate space.
///
/// Negative values fold to their magnitude; oversize values saturate.
#[inline]
pub fn fold_to_u64(value: i128) -> u64 {
    let magnitude = value.unsigned_abs();
    u64::try_from(magnitude).unwrap_or(u64::MAX)
}

/// Convert fixed-point to float for display/rendering.
///
/// # Warning
/// Only use for visual output. NEVER use result in game logic.
#[inline]
pub fn to_float(raw: u64) -> f64 {
    raw as f64 / DECIMAL_SCALE as f64
}

/// Convert world units to fixed-point at initialization time.
#[inline]
pub const fn from_units(units: u64) -> u64 {
    units * DECIMAL_SCALE
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(DECIMAL_SCALE, 100_000);
        assert_eq!(WORLD_SIZE, 100_000_000);
        assert_eq!(SHIP_SIZE, 1_000_000);
        assert_eq!(CANNON_RANGE, 3_000_000_000);
        assert_eq!(QUANTIZATION_LEVEL % 4, 0, "quadrants must be whole quanta");
    }

    #[test]
    fn test_cannon_range_squared_fits() {
        // Range check squares the range; it must fit in u128 with room to spare.
        let range_sq = CANNON_RANGE as u128 * CANNON_RANGE as u128;
        assert!(range_sq < u64::MAX as u128);
    }

    #[test]
    fn test_scale_mul() {
        // 2.0 * 3.0 = 6.0
        let a = from_units(2) as i128;
        let b = from_units(3) as i128;
        assert_eq!(scale_mul(a, b), from_units(6) as i128);

        // Truncates toward zero on negatives
        assert_eq!(scale_mul(-1, 1), 0);
        assert_eq!(scale_mul(-(DECIMAL_SCALE as i128), 7), -7);
    }

    #[test]
    fn test_fold_to_u64() {
        assert_eq!(fold_to_u64(42), 42);
        assert_eq!(fold_to_u64(-42), 42);
        assert_eq!(fold_to_u64(i128::MAX), u64::MAX);
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(DECIMAL_SCALE), 1.0);
        assert_eq!(to_float(SHIP_SIZE / 2), 5.0);
    }
}
