//! Deterministic Random Number Generator
//!
//! Two layers:
//! - [`derive_seed`] hashes timeline material (network hash, transaction
//!   hash, salts) into a 32-byte [`Seed`].
//! - [`DeterministicRng`] (Xorshift128+) expands a seed into a stream of
//!   bounded integers.
//!
//! Same seed material in, same numbers out, on every platform.

use std::fmt;
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Domain separator for seed derivation.
const SEED_DOMAIN: &[u8] = b"PIRATES_SEED_V1";

/// 32-byte seed derived from timeline material.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Seed(pub [u8; 32]);

impl Seed {
    /// First 8 bytes as a little-endian u64, used to key the PRNG.
    pub fn as_u64(&self) -> u64 {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(head)
    }

    /// Build a generator keyed by this seed.
    pub fn rng(&self) -> DeterministicRng {
        DeterministicRng::new(self.as_u64())
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", hex::encode(&self.0[..8]))
    }
}

/// Derive a seed from verifiable parameters.
///
/// # Parameters
///
/// - `network_hash`: hash of the current timeline step
/// - `tx_hash`: hash of the transaction being executed
/// - `salts`: caller-supplied disambiguators (e.g. a loop index)
pub fn derive_seed(network_hash: &[u8; 32], tx_hash: &[u8; 32], salts: &[u64]) -> Seed {
    let mut hasher = Sha256::new();
    hasher.update(SEED_DOMAIN);
    hasher.update(network_hash);
    hasher.update(tx_hash);
    for salt in salts {
        hasher.update(salt.to_le_bytes());
    }
    Seed(hasher.finalize().into())
}

/// Map a seed to one integer in `[a, b]` (inclusive).
pub fn random_in_range(seed: &Seed, a: u64, b: u64) -> u64 {
    seed.rng().next_in_range(a, b)
}

/// Map a seed to `count` integers in `[a, b]`, drawn from one stream.
pub fn randoms_in_range(seed: &Seed, a: u64, b: u64, count: usize) -> Vec<u64> {
    let mut rng = seed.rng();
    (0..count).map(|_| rng.next_in_range(a, b)).collect()
}

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use pirates_engine::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(12345);
/// let value = rng.next_u64();
/// assert_eq!(value, 6233086606872742541); // Always the same!
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    ///
    /// Plain modulo: slight bias for very large max, acceptable here.
    #[inline]
    pub fn next_below(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }

    /// Generate a random integer in range [min, max].
    #[inline]
    pub fn next_in_range(&mut self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        match (max - min).checked_add(1) {
            Some(span) => min + self.next_below(span),
            // Full u64 domain
            None => self.next_u64(),
        }
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

// =============================================================================
// TESTS
// =============================================================================
