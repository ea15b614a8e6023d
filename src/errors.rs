//! # Store Errors
//!
//! Per ERRORS.md, the engine distinguishes caller mistakes (oversized keys
//! and values), ordinary I/O failures, and corruption detected while
//! decoding on-disk state. "Key not found" is never an error: typed getters
//! return the caller-supplied default instead.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage engine errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file or mapping I/O failed. Growth and compaction
    /// failures surface here; there is no degraded mode for a failed remap.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Keys are length-prefixed with a single byte on disk.
    #[error("key exceeds 255 encoded bytes ({0} bytes)")]
    KeyTooLong(usize),

    /// Value body lengths are stored as a 32-bit signed integer.
    #[error("value too large: {0} bytes")]
    ValueTooLarge(usize),

    /// A read or write fell outside the mapped capacity.
    #[error("region access out of bounds: offset {offset} + {len} exceeds capacity {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// On-disk state did not decode to a valid record. During header load
    /// this is swallowed by the fail-soft reset per ERRORS.md; it only
    /// escapes for reads that bypass that recovery path.
    #[error("corrupted record: {0}")]
    Corrupted(String),

    /// A stored value did not decode as the requested type.
    #[error("value decode failed: {0}")]
    Codec(String),
}
