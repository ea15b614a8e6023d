//! CRC32 checksum (IEEE polynomial)
//!
//! Drop-in replacement for the default block-XOR algorithm when stronger
//! corruption detection is worth four bytes per value. Digest bytes are
//! stored little-endian.

use crc32fast::Hasher;

use super::Checksum;

/// Four-byte CRC32 checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Checksum;

impl Checksum for Crc32Checksum {
    fn width(&self) -> usize {
        4
    }

    fn compute(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Hasher::new();
        hasher.update(data);
        hasher.finalize().to_le_bytes().to_vec()
    }
}
