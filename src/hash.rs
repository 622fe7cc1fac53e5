//! Deterministic hashing with domain separation.
//!
//! Every digest in this crate flows through `HashValue::hash_with_domain`,
//! which applies a domain tag and a length prefix before hashing, so byte
//! strings from different contexts can never collide by concatenation.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash into elliptic curves" (2009)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 256-bit hash value.
///
/// Wraps a byte array for type safety; equality and ordering are byte-wise.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a raw byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of the given data with domain separation.
    ///
    /// The input is framed as `b"KLD:<domain>:v1" || length_prefix(data) || data`,
    /// where the length prefix is a 64-bit little-endian byte count.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        // Domain tag
        hasher.update(b"KLD:");
        hasher.update(domain);
        hasher.update(b":v1");
        // Length prefix (64-bit little-endian)
        let len = data.len() as u64;
        hasher.update(len.to_le_bytes());
        // Data
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Returns the first 8 bytes as a little-endian `u64`.
    #[inline]
    pub fn truncate64(&self) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(word)
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Computes a 64-bit domain-separated digest of `data`.
///
/// This is the truncation used for node indicator values and the canonical
/// hash, both of which are `u64` by contract.
#[inline]
pub fn hash64_with_domain(domain: &[u8], data: &[u8]) -> u64 {
    HashValue::hash_with_domain(domain, data).truncate64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_separation_distinguishes() {
        let a = HashValue::hash_with_domain(b"A", b"payload");
        let b = HashValue::hash_with_domain(b"B", b"payload");
        assert_ne!(a, b);
    }

    #[test]
    fn length_prefix_blocks_concatenation_collisions() {
        let a = HashValue::hash_with_domain(b"D", b"ab");
        let b = HashValue::hash_with_domain(b"D", b"a");
        assert_ne!(a, b);
    }

    #[test]
    fn hash64_is_stable_across_calls() {
        let x = hash64_with_domain(b"IND", &[1, 2, 3]);
        let y = hash64_with_domain(b"IND", &[1, 2, 3]);
        assert_eq!(x, y);
    }
}
