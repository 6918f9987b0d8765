//! Quantized Trigonometry
//!
//! Sine and cosine over angles measured in quanta, where
//! `QUANTIZATION_LEVEL` quanta make a full turn. Results are scaled by
//! `DECIMAL_SCALE`.
//!
//! Only the first quadrant is tabulated; the other three are reflections:
//!
//! ```text
//!   rest in [0, Q/4]      sin = T[rest]
//!   rest in (Q/4, Q/2]    sin = T[Q/2 - rest]
//!   rest in (Q/2, 3Q/4]   sin = -T[rest - Q/2]
//!   rest in (3Q/4, Q)     sin = -T[Q - rest]
//! ```

use super::fixed::QUANTIZATION_LEVEL;

const QUARTER: u64 = QUANTIZATION_LEVEL / 4;
const HALF: u64 = QUANTIZATION_LEVEL / 2;
const THREE_QUARTERS: u64 = 3 * QUANTIZATION_LEVEL / 4;

/// `SIN_QUADRANT[i] = round(sin(i * 2pi / 72) * 10^5)` for `i` in `0..=18`.
static SIN_QUADRANT: [i64; (QUARTER + 1) as usize] = [
    0, 8716, 17365, 25882, 34202, 42262, 50000, 57358, 64279, 70711,
    76604, 81915, 86603, 90631, 93969, 96593, 98481, 99619, 100000,
];

/// Sine of an angle in quanta, scaled by `DECIMAL_SCALE`.
///
/// Any `u64` is accepted; the angle is reduced mod `QUANTIZATION_LEVEL`.
#[inline]
pub fn sin(quanta: u64) -> i64 {
    let rest = quanta % QUANTIZATION_LEVEL;
    if rest <= QUARTER {
        SIN_QUADRANT[rest as usize]
    } else if rest <= HALF {
        SIN_QUADRANT[(HALF - rest) as usize]
    } else if rest <= THREE_QUARTERS {
        -SIN_QUADRANT[(rest - HALF) as usize]
    } else {
        -SIN_QUADRANT[(QUANTIZATION_LEVEL - rest) as usize]
    }
}

/// Cosine of an angle in quanta, scaled by `DECIMAL_SCALE`.
#[inline]
pub fn cos(quanta: u64) -> i64 {
    sin((quanta % QUANTIZATION_LEVEL) + QUARTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::DECIMAL_SCALE;

    const ONE: i64 = DECIMAL_SCALE as i64;

    #[test]
    fn test_cardinal_angles() {
        assert_eq!(sin(0), 0);
        assert_eq!(sin(QUARTER), ONE);
        assert_eq!(sin(HALF), 0);
        assert_eq!(sin(THREE_QUARTERS), -ONE);

        assert_eq!(cos(0), ONE);
        assert_eq!(cos(QUARTER), 0);
        assert_eq!(cos(HALF), -ONE);
        assert_eq!(cos(THREE_QUARTERS), 0);
    }

    #[test]
    fn test_thirty_degrees() {
        // 6 quanta = 30 degrees
        assert_eq!(sin(6), ONE / 2);
        assert_eq!(cos(12), ONE / 2);
    }

    #[test]
    fn test_periodic() {
        for q in 0..QUANTIZATION_LEVEL {
            assert_eq!(sin(q), sin(q + QUANTIZATION_LEVEL));
            assert_eq!(sin(q), sin(q + 1000 * QUANTIZATION_LEVEL));
            assert_eq!(cos(q), cos(q + QUANTIZATION_LEVEL));
        }
        // No overflow near the top of the domain
        let _ = cos(u64::MAX);
    }

    #[test]
    fn test_odd_symmetry() {
        for q in 1..QUANTIZATION_LEVEL {
            assert_eq!(sin(q), -sin(QUANTIZATION_LEVEL - q), "sin({q})");
            assert_eq!(cos(q), cos(QUANTIZATION_LEVEL - q), "cos({q})");
        }
    }

    #[test]
    fn test_matches_float_within_rounding() {
        for q in 0..QUANTIZATION_LEVEL {
            let angle = q as f64 * std::f64::consts::TAU / QUANTIZATION_LEVEL as f64;
            let expected_sin = (angle.sin() * DECIMAL_SCALE as f64).round() as i64;
            let expected_cos = (angle.cos() * DECIMAL_SCALE as f64).round() as i64;
            assert!((sin(q) - expected_sin).abs() <= 1, "sin({q})");
            assert!((cos(q) - expected_cos).abs() <= 1, "cos({q})");
        }
    }
}
