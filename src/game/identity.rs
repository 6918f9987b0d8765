//! Player Identity
//!
//! A player is identified by a 32-byte public key, written as base58 in
//! text and JSON. The all-zero key is the ring sentinel and never a real
//! player.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize, Serializer, Deserializer};
use thiserror::Error;

/// Number of `u64` argument fields an identity occupies.
pub const IDENTITY_FIELDS: usize = 4;

/// Opaque, ordered public-key identity.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Identity(pub [u8; 32]);

/// Failure to parse an identity from text or fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Not valid base58.
    #[error("invalid identity encoding: {0}")]
    Encoding(String),

    /// Decoded to the wrong number of bytes.
    #[error("identity must be 32 bytes, got {0}")]
    Length(usize),

    /// Wrong number of argument fields.
    #[error("identity needs {} fields, got {0}", IDENTITY_FIELDS)]
    FieldCount(usize),
}

impl Identity {
    /// The ring sentinel.
    pub const EMPTY: Self = Self([0; 32]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// True for the sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base58 text form, as carried by transaction records.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// Split into big-endian `u64` limbs for argument lists.
    pub fn to_fields(&self) -> [u64; IDENTITY_FIELDS] {
        let mut fields = [0u64; IDENTITY_FIELDS];
        for (field, chunk) in fields.iter_mut().zip(self.0.chunks_exact(8)) {
            let mut limb = [0u8; 8];
            limb.copy_from_slice(chunk);
            *field = u64::from_be_bytes(limb);
        }
        fields
    }

    /// Rebuild from limbs produced by [`Identity::to_fields`].
    pub fn from_fields(fields: &[u64]) -> Result<Self, IdentityError> {
        if fields.len() != IDENTITY_FIELDS {
            return Err(IdentityError::FieldCount(fields.len()));
        }
        let mut bytes = [0u8; 32];
        for (chunk, field) in bytes.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        Ok(Self(bytes))
    }

    /// Short form for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Identity(<sentinel>)")
        } else {
            write!(f, "Identity({})", self.short())
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| IdentityError::Encoding(e.to_string()))?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| IdentityError::Length(v.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_base58())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Identity {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        Identity::new(bytes)
    }

    #[test]
    fn test_sentinel() {
        assert!(Identity::EMPTY.is_empty());
        assert!(Identity::default().is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_ordering() {
        let low = Identity::new([1; 32]);
        let high = Identity::new([2; 32]);
        assert!(Identity::EMPTY < low);
        assert!(low < high);
    }

    #[test]
    fn test_fields_round_trip() {
        let id = sample();
        let fields = id.to_fields();
        assert_eq!(fields[0], 0x0102030405060708);
        assert_eq!(Identity::from_fields(&fields).unwrap(), id);
        assert_eq!(Identity::from_fields(&fields[..3]), Err(IdentityError::FieldCount(3)));
    }

    #[test]
    fn test_base58_parse() {
        let id = sample();
        assert_eq!(id.to_string().parse::<Identity>().unwrap(), id);
        assert_eq!(Identity::EMPTY.to_base58(), "1".repeat(32));
        assert_eq!("1".repeat(32).parse::<Identity>().unwrap(), Identity::EMPTY);

        assert!(matches!("0OIl".parse::<Identity>(), Err(IdentityError::Encoding(_))));
        assert_eq!("2".parse::<Identity>(), Err(IdentityError::Length(1)));
        assert_eq!("1".repeat(33).parse::<Identity>(), Err(IdentityError::Length(33)));
        assert!(hex::encode(id.0).parse::<Identity>().is_err(), "hex is not accepted");
    }

    #[test]
    fn test_short_stays_hex() {
        assert_eq!(sample().short(), "01020304");
    }

    #[test]
    fn test_json_uses_base58() {
        let id = sample();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_base58()));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
