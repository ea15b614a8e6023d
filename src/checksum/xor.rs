//! Block-XOR checksum, the default integrity algorithm
//!
//! Folds every byte of the input into a single-byte digest with XOR,
//! walking the input in four-byte blocks plus a remainder pass. This is a
//! corruption tripwire, not a cryptographic hash: any single-bit flip is
//! detected, but colliding inputs are easy to construct.

use super::Checksum;

/// One-byte block-XOR checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorChecksum;

impl Checksum for XorChecksum {
    fn width(&self) -> usize {
        1
    }

    fn compute(&self, data: &[u8]) -> Vec<u8> {
        let mut digest = 0u8;
        let mut chunks = data.chunks_exact(4);
        for block in &mut chunks {
            digest ^= block[0] ^ block[1] ^ block[2] ^ block[3];
        }
        for byte in chunks.remainder() {
            digest ^= byte;
        }
        vec![digest]
    }
}
