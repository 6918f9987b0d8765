//! Hashing for Verification and Method Identification
//!
//! Provides deterministic hashing of game state for:
//! - Agreement checks between the engine and its mirrors
//! - Identifying which operation a transaction targets

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize, Serializer, Deserializer};
use sha2::{Sha256, Digest};

use super::circle::Circle;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for game types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for engine state.
    pub fn for_game_state() -> Self {
        Self::new(b"PIRATES_STATE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a circle.
    #[inline]
    pub fn update_circle(&mut self, circle: &Circle) {
        self.update_u64(circle.x);
        self.update_u64(circle.y);
        self.update_u64(circle.r);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

// =============================================================================
// METHOD IDENTIFICATION
// =============================================================================

/// Identifier of a `(module, method)` pair inside transaction records.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub [u8; 32]);

/// Encode a string as a single field element.
///
/// Length-prefixed so that `("ab", "c")` and `("a", "bc")` differ.
pub fn string_to_field(s: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"PIRATES_FIELD_V1");
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
    hasher.finalize().into()
}

/// Compute the id of `method` inside `module`.
pub fn method_id(module: &str, method: &str) -> MethodId {
    let mut hasher = Sha256::new();
    hasher.update(b"PIRATES_METHOD_V1");
    hasher.update(string_to_field(module));
    hasher.update(string_to_field(method));
    MethodId(hasher.finalize().into())
}

impl MethodId {
    /// Hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodId({})", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for MethodId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for MethodId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MethodId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================
