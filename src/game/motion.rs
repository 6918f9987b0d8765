//! Quantized Circular Motion
//!
//! Ships move at constant speed along a circular arc whose curvature is set
//! by the turn rate. Positions are only materialized on demand: given the
//! last stored circle and phase, [`compute_current_position`] extrapolates
//! to any later tick.
//!
//! ```text
//!   turn_rate == 0:  dx = sin(p) * v * t
//!                    dy = cos(p) * v * t
//!
//!   turn_rate != 0:  dx = (cos(w*t + Q - p)       - cos(p)) * v * t / w
//!                    dy = (sin(w*t + Q - p + Q/4) - sin(p)) * v * t / w
//! ```
//!
//! `p` is the phase, `w` the turn rate, `v` = `SHIP_SPEED`, `Q` the
//! quantization level. Trig values carry one `DECIMAL_SCALE` factor that is
//! divided out at the end.

use crate::core::circle::Circle;
use crate::core::fixed::{
    DECIMAL_SCALE, QUANTIZATION_LEVEL, SHIP_SPEED,
    fold_to_u64, scale_mul,
};
use crate::core::trig::{cos, sin};

/// `(a * b) mod QUANTIZATION_LEVEL` without overflow.
#[inline]
fn mul_mod_q(a: u64, b: u64) -> u64 {
    ((a % QUANTIZATION_LEVEL) * (b % QUANTIZATION_LEVEL)) % QUANTIZATION_LEVEL
}

/// Phase after turning at `turn_rate` for `elapsed` ticks.
#[inline]
pub fn advance_phase(phase: u64, turn_rate: u64, elapsed: u64) -> u64 {
    (phase % QUANTIZATION_LEVEL + mul_mod_q(turn_rate, elapsed)) % QUANTIZATION_LEVEL
}

/// Displacement `(dx, dy)` in fixed-point units after `elapsed` ticks.
pub fn displacement(phase: u64, turn_rate: u64, elapsed: u64) -> (i128, i128) {
    let travel = SHIP_SPEED as i128 * elapsed as i128;

    if turn_rate == 0 {
        return (scale_mul(sin(phase) as i128, travel), scale_mul(cos(phase) as i128, travel));
    }

    let p = phase % QUANTIZATION_LEVEL;
    let swept = (mul_mod_q(turn_rate, elapsed) + QUANTIZATION_LEVEL - p) % QUANTIZATION_LEVEL;
    let divisor = turn_rate as i128 * DECIMAL_SCALE as i128;

    let dx = (cos(swept) - cos(p)) as i128 * travel / divisor;
    let dy = (sin(swept + QUANTIZATION_LEVEL / 4) - sin(p)) as i128 * travel / divisor;
    (dx, dy)
}

/// Extrapolate a ship's circle by `elapsed` ticks.
///
/// The radius is carried over unchanged. Coordinates that would go
/// negative fold back to their magnitude.
pub fn compute_current_position(last: &Circle, phase: u64, turn_rate: u64, elapsed: u64) -> Circle {
    if elapsed == 0 {
        return *last;
    }
    let (dx, dy) = displacement(phase, turn_rate, elapsed);
    Circle {
        x: fold_to_u64(last.x as i128 + dx),
        y: fold_to_u64(last.y as i128 + dy),
        r: last.r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{from_units, MAX_TURN_RATE, SHIP_SIZE, WORLD_SIZE};
    use proptest::prelude::*;

    fn center() -> Circle {
        Circle::new(WORLD_SIZE / 2, WORLD_SIZE / 2, SHIP_SIZE)
    }

    #[test]
    fn test_zero_elapsed_is_identity() {
        let c = center();
        assert_eq!(compute_current_position(&c, 7, MAX_TURN_RATE, 0), c);
        assert_eq!(compute_current_position(&c, 7, 0, 0), c);
    }

    #[test]
    fn test_straight_line_heading_north() {
        // phase 0: sin = 0, cos = 1 -> moves along +y only
        let c = center();
        let moved = compute_current_position(&c, 0, 0, 2);
        assert_eq!(moved.x, c.x);
        assert_eq!(moved.y, c.y + 2 * SHIP_SPEED);
        assert_eq!(moved.r, c.r);
    }

    #[test]
    fn test_straight_line_heading_east() {
        // phase Q/4: sin = 1, cos = 0 -> moves along +x only
        let c = center();
        let moved = compute_current_position(&c, QUANTIZATION_LEVEL / 4, 0, 3);
        assert_eq!(moved.x, c.x + 3 * SHIP_SPEED);
        assert_eq!(moved.y, c.y);
    }

    #[test]
    fn test_zero_turn_rate_matches_formula_exactly() {
        let c = center();
        for phase in 0..QUANTIZATION_LEVEL {
            for t in [1u64, 5, 17, 1000] {
                let moved = compute_current_position(&c, phase, 0, t);
                let travel = SHIP_SPEED as i128 * t as i128;
                let dx = sin(phase) as i128 * travel / DECIMAL_SCALE as i128;
                let dy = cos(phase) as i128 * travel / DECIMAL_SCALE as i128;
                assert_eq!(moved.x, fold_to_u64(c.x as i128 + dx));
                assert_eq!(moved.y, fold_to_u64(c.y as i128 + dy));
            }
        }
    }

    #[test]
    fn test_negative_coordinates_fold() {
        // Heading south from the origin row
        let c = Circle::new(from_units(100), 0, SHIP_SIZE);
        let moved = compute_current_position(&c, QUANTIZATION_LEVEL / 2, 0, 1);
        assert_eq!(moved.y, SHIP_SPEED);
    }

    #[test]
    fn test_arc_known_value() {
        // p = 0, w = 18 (quarter turn per tick), t = 1:
        // swept = 18, dx = (cos 18 - cos 0) * v / 18 = -v / 18
        //         dy = (sin 36 - sin 0) * v / 18 = 0
        let (dx, dy) = displacement(0, 18, 1);
        assert_eq!(dx, -(SHIP_SPEED as i128) / 18);
        assert_eq!(dy, 0);
    }

    #[test]
    fn test_advance_phase() {
        assert_eq!(advance_phase(0, MAX_TURN_RATE, 1), 6);
        assert_eq!(advance_phase(70, 6, 1), 4);
        assert_eq!(advance_phase(5, 0, 1_000_000), 5);
        // Large inputs do not overflow
        assert!(advance_phase(u64::MAX, u64::MAX, u64::MAX) < QUANTIZATION_LEVEL);
    }

    proptest! {
        #[test]
        fn prop_motion_is_pure(
            x in 0..WORLD_SIZE, y in 0..WORLD_SIZE,
            phase in 0..QUANTIZATION_LEVEL, rate in 0u64..100, t in 0u64..10_000,
        ) {
            let c = Circle::new(x, y, SHIP_SIZE);
            prop_assert_eq!(
                compute_current_position(&c, phase, rate, t),
                compute_current_position(&c, phase, rate, t)
            );
        }

        #[test]
        fn prop_straight_line_is_linear_in_time(
            phase in 0..QUANTIZATION_LEVEL, t in 0u64..100_000,
        ) {
            let (dx1, dy1) = displacement(phase, 0, t);
            let (dx2, dy2) = displacement(phase, 0, 2 * t);
            // sin/cos * SHIP_SPEED is an exact multiple of DECIMAL_SCALE
            prop_assert_eq!(dx2, 2 * dx1);
            prop_assert_eq!(dy2, 2 * dy1);
        }

        #[test]
        fn prop_never_panics(
            x in any::<u64>(), y in any::<u64>(),
            phase in any::<u64>(), rate in any::<u64>(), t in any::<u64>(),
        ) {
            let c = Circle::new(x, y, SHIP_SIZE);
            let _ = compute_current_position(&c, phase, rate, t);
            prop_assert!(advance_phase(phase, rate, t) < QUANTIZATION_LEVEL);
        }
    }
}
