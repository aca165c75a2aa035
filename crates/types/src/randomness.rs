//! Random words delivered by the randomness oracle.

use crate::hash::{decode_fixed, HexError};
use crate::Hash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 256-bit unsigned random value, stored big-endian.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RandomWord([u8; 32]);

impl RandomWord {
    /// Build a word holding a small integer value.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Build a word from big-endian bytes.
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Reinterpret a hash as a word.
    pub fn from_hash(hash: Hash) -> Self {
        Self(*hash.as_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        decode_fixed::<32>(s).map(Self)
    }

    pub fn as_be_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `self mod modulus` over the full 256-bit value.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is zero.
    pub fn reduce(&self, modulus: u64) -> u64 {
        assert!(modulus > 0, "modulus must be non-zero");
        let m = modulus as u128;
        let rem = self
            .0
            .iter()
            .fold(0u128, |acc, &byte| ((acc << 8) | byte as u128) % m);
        rem as u64
    }
}

impl fmt::Display for RandomWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RandomWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomWord({})", self)
    }
}

impl From<u64> for RandomWord {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Serialize for RandomWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RandomWord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_small_values() {
        assert_eq!(RandomWord::from_u64(5).reduce(1), 0);
        assert_eq!(RandomWord::from_u64(5).reduce(4), 1);
        assert_eq!(RandomWord::from_u64(7).reduce(10), 7);
    }

    #[test]
    fn test_reduce_uses_all_256_bits() {
        // 2^255 mod 3 == 2
        let mut bytes = [0u8; 32];
        bytes[0] = 0x80;
        assert_eq!(RandomWord::from_be_bytes(bytes).reduce(3), 2);

        // u64::MAX in the high limb must not be truncated away.
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&u64::MAX.to_be_bytes());
        bytes[31] = 1;
        let word = RandomWord::from_be_bytes(bytes);
        assert_ne!(word.reduce(1_000_003), RandomWord::from_u64(1).reduce(1_000_003));
    }

    #[test]
    #[should_panic(expected = "modulus must be non-zero")]
    fn test_reduce_by_zero_panics() {
        RandomWord::from_u64(1).reduce(0);
    }
}
