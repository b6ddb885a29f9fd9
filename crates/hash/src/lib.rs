//! The hash primitive the Merkle trees are built from: a 20-byte SHA-1
//! digest, plus the `H(left, right)` construction that turns two node
//! hashes into their parent's hash.

use sha1::{Digest, Sha1};
use std::fmt;

/// Size, in bytes, of a hash produced by this crate.
pub const HASH_SIZE: usize = 20;

/// A 20-byte hash tree node value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// The all-zero hash, used to mark "no hash known yet" / padding nodes.
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    /// Wrap a raw digest.
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Hash {
        Hash(bytes)
    }

    /// Hash of a leaf's content bytes.
    pub fn of_data(data: &[u8]) -> Hash {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Hash(hasher.finalize().into())
    }

    /// Hash of an internal node from its two children's hashes, i.e.
    /// `H(left, right) = SHA1(left || right)`.
    pub fn of_pair(left: &Hash, right: &Hash) -> Hash {
        let mut hasher = Sha1::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Hash(hasher.finalize().into())
    }

    /// `true` if this is [`Hash::ZERO`].
    pub fn is_zero(self) -> bool {
        self == Hash::ZERO
    }

    /// The raw bytes.
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse a lowercase (or uppercase) hex string into a hash.
    pub fn from_hex(s: &str) -> Result<Hash, HashParseError> {
        let bytes = hex::decode(s).map_err(|_| HashParseError::InvalidHex)?;
        let bytes: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| HashParseError::WrongLength)?;
        Ok(Hash(bytes))
    }
}

/// Errors parsing a [`Hash`] from its textual form.
#[derive(Debug, thiserror::Error)]
pub enum HashParseError {
    /// The string was not valid hex.
    #[error("invalid hex string")]
    InvalidHex,
    /// The decoded bytes were not exactly [`HASH_SIZE`] long.
    #[error("hash must be exactly {HASH_SIZE} bytes")]
    WrongLength,
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_all_zero_bytes() {
        assert_eq!(Hash::ZERO.as_bytes(), &[0u8; HASH_SIZE]);
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn of_pair_is_deterministic_and_order_sensitive() {
        let a = Hash::of_data(b"left");
        let b = Hash::of_data(b"right");
        let ab = Hash::of_pair(&a, &b);
        let ba = Hash::of_pair(&b, &a);
        assert_eq!(ab, Hash::of_pair(&a, &b));
        assert_ne!(ab, ba);
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash::of_data(b"swift");
        let hex = h.to_hex();
        assert_eq!(Hash::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(matches!(
            Hash::from_hex("aabb"),
            Err(HashParseError::WrongLength)
        ));
    }
}
