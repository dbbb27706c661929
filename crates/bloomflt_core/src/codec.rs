//! On-disk filter encoding.
//!
//! Canonical form (header is BE, 16 bytes):
//!   magic[8] = "BLOOMFLT"
//!   size[8]  = uncompressed payload length in bytes
//!   payload  = zstd stream of the bit array; decompresses to exactly `size` bytes
//!
//! Legacy raw form: the bare bit array, no header. Only read when asked for explicitly,
//! never sniffed.
//!
//! Loading takes a fold factor: the payload is streamed through a [`FoldSink`] so a
//! factor `n` never allocates more than `size / n` bytes for the filter itself.

use crate::bits::{folded_size, FoldSink};
use crate::consts::{DEFAULT_COMPRESSION_LEVEL, HDR_SIZE, MAGIC, STREAM_CHUNK};
use crate::errors::{BloomError, Result};
use crate::filter::Filter;
use crate::hash::{HashSource, Xxh3};
use crate::utils::{read_full, read_u64, write_u64};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Compressed,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    pub compression_level: i32,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { compression_level: DEFAULT_COMPRESSION_LEVEL }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub size: u64,
}

impl Header {
    pub fn to_bytes(&self) -> [u8; HDR_SIZE] {
        let mut hdr = [0u8; HDR_SIZE];
        hdr[..8].copy_from_slice(MAGIC);
        hdr[8..].copy_from_slice(&self.size.to_be_bytes());
        hdr
    }
}

pub fn write_header<W: Write>(w: &mut W, size: u64) -> Result<()> {
    w.write_all(MAGIC)?;
    write_u64(w, size)?;
    Ok(())
}

/// Reads and validates the 16-byte header.
pub fn read_header<R: Read + ?Sized>(r: &mut R) -> Result<Header> {
    let mut hdr = [0u8; HDR_SIZE];
    let n = read_full(r, &mut hdr)?;
    if n != HDR_SIZE { return Err(BloomError::ShortHeader(n)); }
    if &hdr[..8] != MAGIC {
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&hdr[..8]);
        return Err(BloomError::BadMagic(magic));
    }
    let size = read_u64(&mut &hdr[8..])?;
    trace!(size, "decoded filter header");
    Ok(Header { size })
}

pub fn save<W: Write, H>(filter: &Filter<H>, w: &mut W) -> Result<()>
where
    H: HashSource,
{
    save_with(filter, w, &SaveOptions::default())
}

pub fn save_with<W: Write, H>(filter: &Filter<H>, w: &mut W, opts: &SaveOptions) -> Result<()>
where
    H: HashSource,
{
    let bytes = filter.as_bytes();
    write_header(w, bytes.len() as u64)?;
    let mut enc = zstd::stream::write::Encoder::new(&mut *w, opts.compression_level)?;
    enc.write_all(bytes)?;
    enc.finish()?;
    w.flush()?;
    debug!(size = bytes.len(), level = opts.compression_level, "saved filter");
    Ok(())
}

pub fn save_raw<W: Write, H: HashSource>(filter: &Filter<H>, w: &mut W) -> Result<()> {
    w.write_all(filter.as_bytes())?;
    w.flush()?;
    debug!(size = filter.size(), "saved raw filter");
    Ok(())
}

pub fn save_as<W: Write, H: HashSource>(
    filter: &Filter<H>,
    w: &mut W,
    encoding: Encoding,
    opts: &SaveOptions,
) -> Result<()> {
    match encoding {
        Encoding::Compressed => save_with(filter, w, opts),
        Encoding::Raw => save_raw(filter, w),
    }
}

pub fn load<R: Read>(r: &mut R, factor: usize) -> Result<Filter> {
    load_with_hasher(r, factor, Xxh3)
}

pub fn load_with_hasher<R: Read, H: HashSource>(r: &mut R, factor: usize, hasher: H) -> Result<Filter<H>> {
    let Header { size } = read_header(r)?;
    if size == 0 { return Err(BloomError::EmptyPayload); }
    let new_size = folded_size(size, factor)?;

    let mut sink = FoldSink::new(new_size)?;
    let mut dec = zstd::stream::read::Decoder::new(r)?;
    let mut buf = vec![0u8; usize::try_from(size).map_or(STREAM_CHUNK, |s| STREAM_CHUNK.min(s))];
    let mut got = 0u64;
    while got < size {
        let want = usize::try_from(size - got).map_or(buf.len(), |left| buf.len().min(left));
        let n = match dec.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        sink.absorb(&buf[..n]);
        got += n as u64;
    }
    if got < size {
        return Err(BloomError::Truncated { expected: size, got });
    }
    debug!(size, factor, resident = new_size, "loaded filter");
    Ok(Filter::from_parts(sink.finish(), hasher))
}

/// Reads a headerless bit array until EOF, folding by `factor` as it streams.
pub fn load_raw<R: Read>(r: &mut R, factor: usize) -> Result<Filter> {
    load_raw_with_hasher(r, factor, Xxh3)
}

pub fn load_raw_with_hasher<R: Read, H: HashSource>(r: &mut R, factor: usize, hasher: H) -> Result<Filter<H>> {
    // The size is only known at EOF, so raw input is buffered before folding.
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes)?;
    let size = bytes.len() as u64;
    if size == 0 { return Err(BloomError::EmptyPayload); }
    let new_size = folded_size(size, factor)?;
    let mut sink = FoldSink::new(new_size)?;
    sink.absorb(&bytes);
    debug!(size, factor, resident = new_size, "loaded raw filter");
    Ok(Filter::from_parts(sink.finish(), hasher))
}

pub fn load_as<R: Read>(r: &mut R, encoding: Encoding, factor: usize) -> Result<Filter> {
    match encoding {
        Encoding::Compressed => load(r, factor),
        Encoding::Raw => load_raw(r, factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hello12() -> Filter {
        let mut f = Filter::new(100).unwrap();
        f.add_str("hello");
        f
    }

    fn saved(f: &Filter) -> Vec<u8> {
        let mut out = Vec::new();
        save(f, &mut out).unwrap();
        out
    }

    #[test]
    fn header_layout() {
        let out = saved(&hello12());
        assert_eq!(&out[..8], b"BLOOMFLT");
        assert_eq!(&out[8..16], &[0, 0, 0, 0, 0, 0, 0, 12]);
        assert_eq!(&out[..16], &Header { size: 12 }.to_bytes());
    }

    #[test]
    fn roundtrip_identical_bytes() {
        let f = hello12();
        let g = load(&mut Cursor::new(saved(&f)), 1).unwrap();
        assert_eq!(g.as_bytes(), f.as_bytes());
        assert!(g.test_str("hello"));
    }

    #[test]
    fn load_with_factor_three() {
        let f = hello12();
        let g = load(&mut Cursor::new(saved(&f)), 3).unwrap();
        assert_eq!(g.size(), 4);
        assert!(g.test_str("hello"));
    }

    #[test]
    fn fold_on_load_matches_fold_after_load() {
        let mut f = Filter::new(8 * 600).unwrap();
        for i in 0..400u32 {
            f.add(&i.to_le_bytes());
        }
        let bytes = saved(&f);
        for n in [2usize, 3, 5, 8, 600] {
            let streamed = load(&mut Cursor::new(&bytes), n).unwrap();
            let mut folded = load(&mut Cursor::new(&bytes), 1).unwrap();
            folded.fold(n).unwrap();
            assert_eq!(streamed.as_bytes(), folded.as_bytes(), "factor {n}");
        }
    }

    #[test]
    fn large_payload_spans_chunks() {
        let mut f = Filter::new(8 * (STREAM_CHUNK as u64 * 3 + 40)).unwrap();
        for i in 0..10_000u32 {
            f.add(&i.to_be_bytes());
        }
        let bytes = saved(&f);
        let g = load(&mut Cursor::new(&bytes), 1).unwrap();
        assert_eq!(g.as_bytes(), f.as_bytes());
        let h = load(&mut Cursor::new(&bytes), 2).unwrap();
        assert!((0..10_000u32).all(|i| h.test(&i.to_be_bytes())));
    }

    #[test]
    fn bad_magic_is_format_error() {
        let mut bytes = saved(&hello12());
        bytes[..8].copy_from_slice(b"NOTBLOOM");
        let err = load(&mut Cursor::new(bytes), 1).unwrap_err();
        assert!(err.is_format());
        assert!(matches!(err, BloomError::BadMagic(m) if &m == b"NOTBLOOM"));
    }

    #[test]
    fn short_header_is_format_error() {
        let err = load(&mut Cursor::new(b"BLOOMFLT\0\0".to_vec()), 1).unwrap_err();
        assert!(matches!(err, BloomError::ShortHeader(10)));
        assert!(err.is_format());
    }

    #[test]
    fn truncated_payload_is_format_error() {
        // header claims 16 bytes, compressed stream only carries 8
        let mut bytes = Vec::new();
        write_header(&mut bytes, 16).unwrap();
        bytes.extend(zstd::stream::encode_all(&[0xffu8; 8][..], 3).unwrap());
        let err = load(&mut Cursor::new(bytes), 1).unwrap_err();
        assert!(matches!(err, BloomError::Truncated { expected: 16, got: 8 }));
        assert!(err.is_format());
    }

    #[test]
    fn payload_cut_mid_frame_is_truncated() {
        let mut f = Filter::new(8 * 5000).unwrap();
        for i in 0..2_000u32 {
            f.add(&i.to_le_bytes());
        }
        let bytes = saved(&f);
        for cut in [HDR_SIZE + 4, bytes.len() / 2, bytes.len() - 8] {
            let err = load(&mut Cursor::new(&bytes[..cut]), 1).unwrap_err();
            assert!(matches!(err, BloomError::Truncated { expected: 5000, .. }), "cut {cut}: {err}");
            assert!(err.is_format());
        }
    }

    #[test]
    fn huge_declared_size_fails_without_aborting() {
        let mut bytes = Vec::new();
        write_header(&mut bytes, 1 << 62).unwrap();
        bytes.extend(zstd::stream::encode_all(&[0u8; 8][..], 3).unwrap());
        let err = load(&mut Cursor::new(bytes), 1).unwrap_err();
        assert!(matches!(err, BloomError::TooLarge(_)), "{err}");
    }

    #[test]
    fn bad_factor_is_rejected_before_decoding() {
        // payload is garbage; factor validation must fire first
        let mut bytes = Vec::new();
        write_header(&mut bytes, 12).unwrap();
        bytes.extend_from_slice(b"not zstd at all");
        let err = load(&mut Cursor::new(&bytes), 5).unwrap_err();
        assert!(matches!(err, BloomError::InvalidFactor { factor: 5, size: 12 }));
        assert!(load(&mut Cursor::new(&bytes), 0).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let mut bytes = Vec::new();
        write_header(&mut bytes, 0).unwrap();
        assert!(matches!(load(&mut Cursor::new(bytes), 1), Err(BloomError::EmptyPayload)));
    }

    #[test]
    fn raw_encoding_roundtrip() {
        let f = hello12();
        let mut out = Vec::new();
        save_as(&f, &mut out, Encoding::Raw, &SaveOptions::default()).unwrap();
        assert_eq!(out, f.as_bytes());
        let g = load_as(&mut Cursor::new(&out), Encoding::Raw, 1).unwrap();
        assert_eq!(g.as_bytes(), f.as_bytes());
        let h = load_raw(&mut Cursor::new(&out), 4).unwrap();
        assert_eq!(h.size(), 3);
        assert!(h.test_str("hello"));
    }

    #[test]
    fn raw_bytes_are_not_sniffed_as_compressed() {
        let f = hello12();
        let mut out = Vec::new();
        save_raw(&f, &mut out).unwrap();
        assert!(load(&mut Cursor::new(out), 1).unwrap_err().is_format());
    }

    #[test]
    fn compression_level_is_honoured() {
        let f = Filter::new(8 * 4096).unwrap();
        let mut out = Vec::new();
        save_with(&f, &mut out, &SaveOptions { compression_level: 19 }).unwrap();
        assert!(out.len() < 4096);
        assert_eq!(load(&mut Cursor::new(out), 1).unwrap().as_bytes(), f.as_bytes());
    }
}
