// crates/bloomflt_core/src/consts.rs

use core::mem::size_of;

pub const MAGIC: &[u8; 8] = b"BLOOMFLT";

/// magic[8] + uncompressed size[8, BE]
pub const HDR_SIZE: usize = 16;

pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Chunk size used when streaming payload bytes through the fold sink.
pub const STREAM_CHUNK: usize = 64 * 1024;

const _: () = { assert!(size_of::<[u8; 8]>() + size_of::<u64>() == HDR_SIZE); };
