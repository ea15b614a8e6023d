//! Checksum algorithms for header and value integrity
//!
//! Per STORAGE.md §4:
//! - The header block carries one checksum over its tail
//! - Every value carries a trailing checksum over its bytes
//! - The algorithm is pluggable; the store only relies on a fixed output
//!   width and determinism
//!
//! The default is a cheap block-XOR checksum with a one-byte digest. CRC32
//! (IEEE polynomial) is provided as the stronger drop-in alternative.

mod crc32;
mod xor;

pub use crc32::Crc32Checksum;
pub use xor::XorChecksum;

/// A fixed-width checksum over a byte range.
///
/// Implementations must be deterministic: the same input always produces
/// the same digest, and `width()` must be constant for the lifetime of the
/// store because it is baked into the on-disk body lengths.
pub trait Checksum {
    /// Digest width in bytes.
    fn width(&self) -> usize;

    /// Computes the digest over `data`.
    fn compute(&self, data: &[u8]) -> Vec<u8>;

    /// Verifies that the computed digest matches the expected one.
    fn verify(&self, data: &[u8], expected: &[u8]) -> bool {
        self.compute(data) == expected
    }
}
