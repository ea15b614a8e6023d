//! Header index subsystem
//!
//! The header file is the authoritative, ordered list of every known key
//! (live or tombstoned) plus the block-level integrity checksum. Per
//! STORAGE.md §2 the block layout is:
//!
//! ```text
//! +------------------+
//! | Version          | (u8, format version)
//! +------------------+
//! | Status Flag      | (u8: 0 = empty, 1 = normal)
//! +------------------+
//! | Block Checksum   | (algorithm width)
//! +------------------+
//! | Reserved         | (128 bytes, future fields)
//! +------------------+
//! | Entry Count      | (u16 LE)
//! +------------------+
//! | Entry Records    | (variable, see `entry`)
//! +------------------+
//! ```
//!
//! The checksum covers every byte from the end of the checksum field to
//! the end of the mapped capacity, so corruption anywhere in the tail
//! (entries or slack) is detectable. A mismatch degrades to an empty
//! index rather than a failed open (§9).

mod block;
mod entry;

pub use block::{BlockFlag, HeaderBlock, FORMAT_VERSION, RESERVED_BYTES};
pub use entry::{EntryFlag, HeaderEntry, KEY_MASK};
