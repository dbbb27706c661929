//! 64-bit hash sources used to address filter bits.

/// A deterministic, well-distributed, non-cryptographic 64-bit hash.
pub trait HashSource {
    fn hash(&self, input: &[u8]) -> u64;
}

/// XXH3-64 with the default seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Xxh3;

impl HashSource for Xxh3 {
    #[inline]
    fn hash(&self, input: &[u8]) -> u64 { xxhash_rust::xxh3::xxh3_64(input) }
}

impl<F: Fn(&[u8]) -> u64> HashSource for F {
    #[inline]
    fn hash(&self, input: &[u8]) -> u64 { self(input) }
}
