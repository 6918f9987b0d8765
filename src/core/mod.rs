//! Core deterministic primitives.
//!
//! Everything in this module is integer-only and platform-independent.
//! The engine and every mirror must agree on these bit for bit.

pub mod fixed;
pub mod trig;
pub mod circle;
pub mod rng;
pub mod hash;

// Re-export core types
pub use fixed::{DECIMALS, DECIMAL_SCALE, QUANTIZATION_LEVEL};
pub use circle::Circle;
pub use rng::{DeterministicRng, Seed, derive_seed, random_in_range, randoms_in_range};
pub use hash::{MethodId, StateHash, StateHasher, method_id};
