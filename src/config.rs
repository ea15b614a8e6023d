//! Store configuration
//!
//! A config names the store (which fixes both backing file names inside
//! the caller-supplied directory) and carries the tunables: initial file
//! capacities, the obfuscation key, the checksum algorithms, and the
//! observer. Everything except directory and name has a default.

use std::path::PathBuf;

use crate::checksum::Checksum;
use crate::observability::StoreObserver;
use crate::region::PAGE_SIZE;

/// Default initial capacity of the header file.
pub const DEFAULT_HEADER_CAPACITY: usize = 2 * PAGE_SIZE;

/// Default initial capacity of the content file.
pub const DEFAULT_CONTENT_CAPACITY: usize = 25 * PAGE_SIZE;

/// Configuration for opening a [`crate::Store`].
pub struct StoreConfig {
    /// Directory holding both backing files. Created if missing. Resolving
    /// a platform-appropriate location is the caller's concern.
    pub dir: PathBuf,
    /// Store name: the header file is `<name>.idx`, the content file
    /// `<name>.dat`.
    pub name: String,
    /// Initial header file capacity, rounded up to whole pages on
    /// creation. Ignored when the file already exists.
    pub header_capacity: usize,
    /// Initial content file capacity, same rules as `header_capacity`.
    pub content_capacity: usize,
    /// Key for the XOR value obfuscation. An empty string selects the
    /// built-in default. This is obfuscation, not confidentiality; see
    /// STORAGE.md §5.
    pub encryption_key: String,
    pub(crate) header_checksum: Option<Box<dyn Checksum>>,
    pub(crate) value_checksum: Option<Box<dyn Checksum>>,
    pub(crate) observer: Option<Box<dyn StoreObserver>>,
}

impl StoreConfig {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
            header_capacity: DEFAULT_HEADER_CAPACITY,
            content_capacity: DEFAULT_CONTENT_CAPACITY,
            encryption_key: String::new(),
            header_checksum: None,
            value_checksum: None,
            observer: None,
        }
    }

    /// Overrides both initial capacities.
    pub fn with_capacities(mut self, header: usize, content: usize) -> Self {
        self.header_capacity = header;
        self.content_capacity = content;
        self
    }

    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = key.into();
        self
    }

    /// Substitutes the header-block checksum algorithm (default block-XOR).
    pub fn with_header_checksum(mut self, algorithm: Box<dyn Checksum>) -> Self {
        self.header_checksum = Some(algorithm);
        self
    }

    /// Substitutes the per-value checksum algorithm (default block-XOR).
    ///
    /// Must stay constant across opens of the same files: the digest width
    /// is baked into every stored body length.
    pub fn with_value_checksum(mut self, algorithm: Box<dyn Checksum>) -> Self {
        self.value_checksum = Some(algorithm);
        self
    }

    /// Substitutes the event sink (default: structured JSON logging).
    pub fn with_observer(mut self, observer: Box<dyn StoreObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("/tmp/kv", "prefs");
        assert_eq!(config.dir, PathBuf::from("/tmp/kv"));
        assert_eq!(config.name, "prefs");
        assert_eq!(config.header_capacity, 2 * PAGE_SIZE);
        assert_eq!(config.content_capacity, 25 * PAGE_SIZE);
        assert!(config.encryption_key.is_empty());
        assert!(config.header_checksum.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreConfig::new("/tmp/kv", "prefs")
            .with_capacities(PAGE_SIZE, 4 * PAGE_SIZE)
            .with_encryption_key("1234abcd");
        assert_eq!(config.header_capacity, PAGE_SIZE);
        assert_eq!(config.content_capacity, 4 * PAGE_SIZE);
        assert_eq!(config.encryption_key, "1234abcd");
    }
}
