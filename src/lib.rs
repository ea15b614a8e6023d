//! mapkv - an embedded, memory-mapped key-value store
//!
//! Two backing files per store: a compact header file holding the ordered
//! key index behind a block checksum, and a content file holding each
//! value's bytes plus a trailing checksum. Mutations write through the
//! mapped regions; corruption found at open degrades to an empty store
//! instead of a failed one. Single process, single owner, synchronous.
//!
//! ```no_run
//! use mapkv::{Store, StoreConfig};
//!
//! let mut store = Store::open(StoreConfig::new("/tmp/data", "prefs"))?;
//! store.set_i32("launch_count", 3)?;
//! assert_eq!(store.get_i32("launch_count", 0)?, 3);
//! store.close()?;
//! # Ok::<(), mapkv::StoreError>(())
//! ```

pub mod checksum;
pub mod config;
pub mod content;
pub mod engine;
pub mod errors;
pub mod header;
pub mod observability;
pub mod region;

pub use checksum::{Checksum, Crc32Checksum, XorChecksum};
pub use config::StoreConfig;
pub use engine::Store;
pub use errors::{StoreError, StoreResult};
pub use observability::{LogObserver, NullObserver, StoreEvent, StoreObserver};
