//! Content store subsystem
//!
//! Manages the value region of the content file: per-entry value bytes
//! plus a trailing checksum, packed back to back (STORAGE.md §5). Values
//! are read lazily and cached in memory, encrypted exactly as they are on
//! disk, until the entry changes or the store closes.

mod store;

pub use store::ContentStore;
