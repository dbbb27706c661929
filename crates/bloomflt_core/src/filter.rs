//! Single-hash bloom-style filter over a flat bit array.
//!
//! One 64-bit hash addresses one bit: `(h >> 3) % size` picks the byte, `h & 7` the bit.
//! This trades a higher false-positive rate per bit of memory for a single hash per
//! operation; it is not a k-hash bloom filter.
//!
//! The filter is not internally synchronized. Concurrent readers are fine once population
//! is done; `add` and `fold` need exclusive access, which `&mut self` enforces.

use crate::bits::BitField;
use crate::errors::{BloomError, Result};
use crate::hash::{HashSource, Xxh3};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct Filter<H = Xxh3> {
    bits: BitField,
    hasher: H,
}

impl Filter<Xxh3> {
    /// `requested_bits` is rounded down to a multiple of 8. Fewer than 8 bits is rejected.
    pub fn new(requested_bits: u64) -> Result<Self> {
        Self::with_hasher(requested_bits, Xxh3)
    }

    pub fn from_bytes(bits: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_hasher(bits, Xxh3)
    }
}

impl<H: HashSource> Filter<H> {
    pub fn with_hasher(requested_bits: u64, hasher: H) -> Result<Self> {
        let size = usize::try_from(requested_bits >> 3)
            .map_err(|_| BloomError::TooLarge(requested_bits >> 3))?;
        Ok(Self { bits: BitField::zeroed(size)?, hasher })
    }

    pub fn from_bytes_with_hasher(bits: Vec<u8>, hasher: H) -> Result<Self> {
        Ok(Self { bits: BitField::from_bytes(bits)?, hasher })
    }

    pub(crate) fn from_parts(bits: BitField, hasher: H) -> Self {
        Self { bits, hasher }
    }

    #[inline]
    fn locate(&self, hash: u64) -> (usize, u8) {
        (((hash >> 3) % self.bits.size() as u64) as usize, (hash & 0x7) as u8)
    }

    #[inline]
    pub fn hash(&self, input: &[u8]) -> u64 { self.hasher.hash(input) }

    #[inline]
    pub fn hash_str(&self, input: &str) -> u64 { self.hash(input.as_bytes()) }

    /// Sets the element's bit and returns the hash used.
    #[inline]
    pub fn add(&mut self, input: &[u8]) -> u64 {
        let hash = self.hash(input);
        let (byte, bit) = self.locate(hash);
        self.bits.set(byte, bit);
        hash
    }

    #[inline]
    pub fn add_str(&mut self, input: &str) -> u64 { self.add(input.as_bytes()) }

    /// `true` if the element may be present; `false` means it was never added.
    #[inline]
    pub fn test(&self, input: &[u8]) -> bool { self.test_hash(input).1 }

    #[inline]
    pub fn test_str(&self, input: &str) -> bool { self.test(input.as_bytes()) }

    /// Like [`Filter::test`], also returning the hash used.
    #[inline]
    pub fn test_hash(&self, input: &[u8]) -> (u64, bool) {
        let hash = self.hash(input);
        let (byte, bit) = self.locate(hash);
        (hash, self.bits.get(byte, bit))
    }

    #[inline]
    pub fn test_str_hash(&self, input: &str) -> (u64, bool) { self.test_hash(input.as_bytes()) }

    /// Shrinks the filter to `size / factor` bytes by OR-combining `factor` equal slices.
    ///
    /// No set bit is lost, so nothing added before the fold stops testing positive. On
    /// error the filter is left untouched.
    pub fn fold(&mut self, factor: usize) -> Result<()> {
        if factor == 1 { return Ok(()); }
        let folded = self.bits.fold(factor)?;
        debug!(factor, from = self.bits.size(), to = folded.size(), "folded filter");
        self.bits = folded;
        Ok(())
    }

    /// Byte count of the backing array.
    pub fn size(&self) -> usize { self.bits.size() }

    pub fn capacity_bits(&self) -> u64 { self.bits.capacity_bits() }

    pub fn as_bytes(&self) -> &[u8] { self.bits.as_bytes() }

    pub fn bit_field(&self) -> &BitField { &self.bits }

    pub fn hasher(&self) -> &H { &self.hasher }

    pub fn count_ones(&self) -> u64 { self.bits.count_ones() }

    /// Fraction of set bits. With a single hash this is the expected false-positive rate
    /// for a random non-member.
    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.capacity_bits() as f64
    }
}
