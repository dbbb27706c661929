//! Flat byte-backed bit array and the fold algebra shared by in-memory folding and
//! fold-on-load.
//!
//! Bits are LSB-first: bit `k` of byte `i` is `1 << k`.

use crate::errors::{BloomError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    bits: Vec<u8>,
}

impl BitField {
    pub fn zeroed(size: usize) -> Result<Self> {
        Ok(Self { bits: zeroed_bytes(size)? })
    }

    pub fn from_bytes(bits: Vec<u8>) -> Result<Self> {
        if bits.is_empty() { return Err(BloomError::EmptyFilter); }
        Ok(Self { bits })
    }

    /// Byte count.
    #[inline]
    pub fn size(&self) -> usize { self.bits.len() }

    #[inline]
    pub fn capacity_bits(&self) -> u64 { self.bits.len() as u64 * 8 }

    #[inline]
    pub fn get(&self, byte: usize, bit: u8) -> bool {
        self.bits[byte] & (1u8 << bit) != 0
    }

    #[inline]
    pub fn set(&mut self, byte: usize, bit: u8) {
        self.bits[byte] |= 1u8 << bit;
    }

    pub fn as_bytes(&self) -> &[u8] { &self.bits }

    pub fn into_bytes(self) -> Vec<u8> { self.bits }

    pub fn count_ones(&self) -> u64 {
        self.bits.iter().map(|b| b.count_ones() as u64).sum()
    }

    /// OR-combine `factor` equal slices into one. `factor == 1` returns a copy.
    pub fn fold(&self, factor: usize) -> Result<BitField> {
        let new_size = folded_size(self.size() as u64, factor)?;
        let mut sink = FoldSink::new(new_size)?;
        sink.absorb(&self.bits);
        Ok(sink.finish())
    }
}

/// Validates a fold factor against `size` and returns the folded byte count.
pub fn folded_size(size: u64, factor: usize) -> Result<usize> {
    if factor == 0 || size % factor as u64 != 0 {
        return Err(BloomError::InvalidFactor { factor, size });
    }
    usize::try_from(size / factor as u64).map_err(|_| BloomError::TooLarge(size / factor as u64))
}

/// Zeroed buffer of `len` bytes; allocation failure is an error, not an abort.
fn zeroed_bytes(len: usize) -> Result<Vec<u8>> {
    if len == 0 { return Err(BloomError::EmptyFilter); }
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| BloomError::TooLarge(len as u64))?;
    out.resize(len, 0);
    Ok(out)
}

/// Streaming fold accumulator: the `i`-th absorbed byte lands at `i mod len`.
#[derive(Debug)]
pub struct FoldSink {
    out: Vec<u8>,
    pos: usize,
    absorbed: u64,
}

impl FoldSink {
    pub fn new(len: usize) -> Result<Self> {
        Ok(Self { out: zeroed_bytes(len)?, pos: 0, absorbed: 0 })
    }

    pub fn absorb(&mut self, mut chunk: &[u8]) {
        self.absorbed += chunk.len() as u64;
        let n = self.out.len();
        while !chunk.is_empty() {
            let take = chunk.len().min(n - self.pos);
            for (dst, src) in self.out[self.pos..self.pos + take].iter_mut().zip(&chunk[..take]) {
                *dst |= *src;
            }
            chunk = &chunk[take..];
            self.pos += take;
            if self.pos == n { self.pos = 0; }
        }
    }

    /// Total bytes absorbed so far.
    pub fn absorbed(&self) -> u64 { self.absorbed }

    pub fn finish(self) -> BitField { BitField { bits: self.out } }
}
