//! The public store API and mutation algorithm
//!
//! Per STORAGE.md §6, every mutation keeps the header index and content
//! store in lockstep:
//!
//! - a null set flips the live entry to the null flag, touching no value
//!   bytes (and writes nothing at all for an unseen key)
//! - a same-size overwrite rewrites value and checksum in place, with a
//!   fast path that skips the write for identical small scalars
//! - a different-size overwrite tombstones the old entry and appends
//! - an append compacts, then grows, whichever file lacks room
//!
//! The store is single-owner and synchronous (§10): no internal locking,
//! no flush-per-write. Callers needing durability call `flush` or `close`;
//! `Drop` is only the best-effort safety net.

use std::fs;

use crate::checksum::XorChecksum;
use crate::config::StoreConfig;
use crate::content::ContentStore;
use crate::errors::{StoreError, StoreResult};
use crate::header::{EntryFlag, HeaderBlock, HeaderEntry};
use crate::observability::{LogObserver, StoreEvent, StoreObserver};
use crate::region::{self, Region};

use super::codec;
use super::compact;
use super::crypto::XorCipher;

/// Outcome of a raw key lookup: "never set" and "explicitly cleared" are
/// distinct states.
enum Lookup {
    Missing,
    Null,
    Value(Vec<u8>),
}

/// An open key-value store over one header file and one content file.
///
/// One instance owns its backing files exclusively; sharing the files
/// between instances, threads, or processes is undefined behavior and
/// must be serialized by the caller.
pub struct Store {
    name: String,
    header_region: Box<dyn Region>,
    content_region: Box<dyn Region>,
    header: HeaderBlock,
    content: ContentStore,
    cipher: XorCipher,
    observer: Box<dyn StoreObserver>,
}

impl Store {
    /// Opens (creating if absent) the store described by `config`.
    ///
    /// Loads and verifies the header block, reads and verifies every live
    /// value, then runs compaction so tombstones from the prior session
    /// are physically gone before the first access. Corruption found along
    /// the way degrades to an empty store per STORAGE.md §9: it is
    /// reported to the observer, never returned as an error.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.dir)?;

        let observer = config
            .observer
            .unwrap_or_else(|| Box::new(LogObserver));
        let header_path = config.dir.join(format!("{}.idx", config.name));
        let content_path = config.dir.join(format!("{}.dat", config.name));

        let mut header_region = region::open(&header_path, config.header_capacity, &*observer)?;
        let content_region = region::open(&content_path, config.content_capacity, &*observer)?;

        let header_algorithm = config
            .header_checksum
            .unwrap_or_else(|| Box::new(XorChecksum));
        let value_algorithm = config
            .value_checksum
            .unwrap_or_else(|| Box::new(XorChecksum));

        let header = HeaderBlock::load(&mut *header_region, header_algorithm, &*observer)?;
        let content = ContentStore::new(value_algorithm);

        let mut store = Self {
            name: config.name,
            header_region,
            content_region,
            header,
            content,
            cipher: XorCipher::new(&config.encryption_key),
            observer,
        };

        store.load_contents()?;
        compact::run(
            &mut store.header,
            &mut store.content,
            &mut *store.header_region,
            &mut *store.content_region,
            &*store.observer,
        )?;

        store.observer.observe(&StoreEvent::Opened {
            name: store.name.clone(),
            entries: store.header.entries.len(),
        });
        Ok(store)
    }

    /// Reads and verifies every entry's value, building the lookup cache.
    ///
    /// A single failed value verification wipes the whole store for this
    /// session: in-memory index and on-disk entry count both reset. This
    /// is the deliberate fail-safe of STORAGE.md §9, not a partial
    /// recovery.
    fn load_contents(&mut self) -> StoreResult<()> {
        let mut corrupt_key: Option<String> = None;

        for index in 0..self.header.entries.len() {
            self.content.push_slot();

            if self.header.entries[index].flag == EntryFlag::Delete {
                self.content.register(index, &mut self.header.entries);
                continue;
            }

            match self
                .content
                .load(index, &self.header.entries[index], &*self.content_region)
            {
                Ok(()) => {
                    if self.content.verify(index) {
                        self.content.register(index, &mut self.header.entries);
                    } else {
                        corrupt_key = Some(self.header.entries[index].key.clone());
                    }
                }
                Err(StoreError::Corrupted(_)) | Err(StoreError::OutOfBounds { .. }) => {
                    corrupt_key = Some(self.header.entries[index].key.clone());
                }
                Err(other) => return Err(other),
            }

            if corrupt_key.is_some() {
                break;
            }
        }

        if let Some(key) = corrupt_key {
            self.observer.observe(&StoreEvent::ValueCorruption { key });
            self.header.reset_to_empty(&mut *self.header_region)?;
            self.content.reset();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    pub fn set_bool(&mut self, key: &str, value: bool) -> StoreResult<()> {
        self.set_raw(key, Some(&codec::encode_bool(value)))
    }

    pub fn get_bool(&mut self, key: &str, default: bool) -> StoreResult<bool> {
        match self.lookup(key)? {
            Lookup::Value(bytes) => codec::decode_bool(&bytes),
            _ => Ok(default),
        }
    }

    pub fn set_i32(&mut self, key: &str, value: i32) -> StoreResult<()> {
        self.set_raw(key, Some(&codec::encode_i32(value)))
    }

    pub fn get_i32(&mut self, key: &str, default: i32) -> StoreResult<i32> {
        match self.lookup(key)? {
            Lookup::Value(bytes) => codec::decode_i32(&bytes),
            _ => Ok(default),
        }
    }

    pub fn set_i64(&mut self, key: &str, value: i64) -> StoreResult<()> {
        self.set_raw(key, Some(&codec::encode_i64(value)))
    }

    pub fn get_i64(&mut self, key: &str, default: i64) -> StoreResult<i64> {
        match self.lookup(key)? {
            Lookup::Value(bytes) => codec::decode_i64(&bytes),
            _ => Ok(default),
        }
    }

    pub fn set_f32(&mut self, key: &str, value: f32) -> StoreResult<()> {
        self.set_raw(key, Some(&codec::encode_f32(value)))
    }

    pub fn get_f32(&mut self, key: &str, default: f32) -> StoreResult<f32> {
        match self.lookup(key)? {
            Lookup::Value(bytes) => codec::decode_f32(&bytes),
            _ => Ok(default),
        }
    }

    pub fn set_f64(&mut self, key: &str, value: f64) -> StoreResult<()> {
        self.set_raw(key, Some(&codec::encode_f64(value)))
    }

    pub fn get_f64(&mut self, key: &str, default: f64) -> StoreResult<f64> {
        match self.lookup(key)? {
            Lookup::Value(bytes) => codec::decode_f64(&bytes),
            _ => Ok(default),
        }
    }

    /// Stores a string, or an explicit null when `value` is `None`.
    pub fn set_string(&mut self, key: &str, value: Option<&str>) -> StoreResult<()> {
        self.set_raw(key, value.map(str::as_bytes))
    }

    /// Returns the stored string, `None` for an explicitly nulled key, or
    /// `default` for a key that was never set.
    pub fn get_string(&mut self, key: &str, default: Option<&str>) -> StoreResult<Option<String>> {
        match self.lookup(key)? {
            Lookup::Missing => Ok(default.map(str::to_owned)),
            Lookup::Null => Ok(None),
            Lookup::Value(bytes) => Ok(Some(codec::decode_string(&bytes)?)),
        }
    }

    /// Stores a raw byte sequence, or an explicit null when `value` is
    /// `None`.
    pub fn set_bytes(&mut self, key: &str, value: Option<&[u8]>) -> StoreResult<()> {
        self.set_raw(key, value)
    }

    /// Returns the stored bytes, `None` for an explicitly nulled key, or
    /// `default` for a key that was never set.
    pub fn get_bytes(
        &mut self,
        key: &str,
        default: Option<&[u8]>,
    ) -> StoreResult<Option<Vec<u8>>> {
        match self.lookup(key)? {
            Lookup::Missing => Ok(default.map(<[u8]>::to_vec)),
            Lookup::Null => Ok(None),
            Lookup::Value(bytes) => Ok(Some(bytes)),
        }
    }

    // ------------------------------------------------------------------
    // Key management
    // ------------------------------------------------------------------

    /// Whether `key` currently exists, null-flagged entries included.
    pub fn contains_key(&self, key: &str) -> bool {
        self.content.live_index(key, &self.header.entries).is_some()
    }

    /// Tombstones `key` if it exists. Space is reclaimed by the next
    /// compaction, not here.
    pub fn delete_key(&mut self, key: &str) -> StoreResult<()> {
        if let Some(index) = self.content.live_index(key, &self.header.entries) {
            self.header
                .update_flag(&mut *self.header_region, index, EntryFlag::Delete)?;
        }
        Ok(())
    }

    /// Tombstones every entry with one checksum restamp.
    pub fn delete_all_keys(&mut self) -> StoreResult<()> {
        self.header.flag_all_deleted(&mut *self.header_region)
    }

    /// Forces dirty mapped bytes to disk. The engine never flushes on its
    /// own during mutation.
    pub fn flush(&self) -> StoreResult<()> {
        self.header_region.flush()?;
        self.content_region.flush()?;
        Ok(())
    }

    /// Flushes and releases the store. Errors from the final flush are
    /// surfaced here, which `Drop` cannot do.
    pub fn close(self) -> StoreResult<()> {
        self.flush()
    }

    // ------------------------------------------------------------------
    // Mutation internals
    // ------------------------------------------------------------------

    fn set_raw(&mut self, key: &str, value: Option<&[u8]>) -> StoreResult<()> {
        if key.len() > u8::MAX as usize {
            return Err(StoreError::KeyTooLong(key.len()));
        }

        match value {
            None => {
                // Explicit absence: flip the live entry to null, touch no
                // value bytes. An unseen key writes nothing at all.
                if let Some(index) = self.content.live_index(key, &self.header.entries) {
                    if self.header.entries[index].flag != EntryFlag::Null {
                        self.header
                            .update_flag(&mut *self.header_region, index, EntryFlag::Null)?;
                    }
                }
                Ok(())
            }
            Some(bytes) => {
                let mut data = bytes.to_vec();
                self.cipher.apply(&mut data);
                self.set_encrypted(key, data)
            }
        }
    }

    fn set_encrypted(&mut self, key: &str, data: Vec<u8>) -> StoreResult<()> {
        let width = self.content.checksum_width();
        let body_len = data
            .len()
            .checked_add(width)
            .filter(|&len| len <= i32::MAX as usize)
            .ok_or(StoreError::ValueTooLarge(data.len()))? as i32;

        if let Some(index) = self.content.live_index(key, &self.header.entries) {
            if self.header.entries[index].value_len(width) == data.len() {
                if self.header.entries[index].flag != EntryFlag::Normal {
                    self.header
                        .update_flag(&mut *self.header_region, index, EntryFlag::Normal)?;
                }
                // Repeated writes of unchanged small scalars skip the
                // physical write entirely
                if data.len() <= 8 && self.content.cached_equals(index, &data) {
                    return Ok(());
                }
                return self.content.write(
                    index,
                    &self.header.entries[index],
                    &mut *self.content_region,
                    data,
                );
            }
            // Size changed: tombstone and append a fresh entry
            self.header
                .update_flag(&mut *self.header_region, index, EntryFlag::Delete)?;
        }

        // Append path. Compaction may free header room; growth is the
        // last resort. Content offsets are assigned only after both, so
        // the new body lands at the packed end.
        let record_size = HeaderEntry::encoded_size(key.len());
        if self.header.used() + record_size > self.header_region.len() {
            compact::run(
                &mut self.header,
                &mut self.content,
                &mut *self.header_region,
                &mut *self.content_region,
                &*self.observer,
            )?;
        }
        if self.header.used() + record_size > self.header_region.len() {
            self.grow_header()?;
        }
        if self.content.used() + body_len as usize > self.content_region.len() {
            self.grow_content(self.content.used() + body_len as usize)?;
        }

        let body_offset = i32::try_from(self.content.used())
            .map_err(|_| StoreError::ValueTooLarge(data.len()))?;
        let entry = HeaderEntry {
            flag: EntryFlag::Normal,
            key: key.to_string(),
            body_len,
            body_offset,
            header_offset: 0,
        };
        let index = self.header.append(&mut *self.header_region, entry)?;
        self.content.push_slot();
        self.content.write(
            index,
            &self.header.entries[index],
            &mut *self.content_region,
            data,
        )?;
        self.content.register(index, &mut self.header.entries);
        Ok(())
    }

    fn lookup(&mut self, key: &str) -> StoreResult<Lookup> {
        let Some(index) = self.content.live_index(key, &self.header.entries) else {
            return Ok(Lookup::Missing);
        };
        if self.header.entries[index].flag == EntryFlag::Null {
            return Ok(Lookup::Null);
        }

        self.content
            .load(index, &self.header.entries[index], &*self.content_region)?;
        let Some(cached) = self.content.value(index) else {
            return Err(StoreError::Corrupted(format!(
                "no value bytes for live key '{}'",
                key
            )));
        };

        // Decrypt a private copy; the resident cache stays encrypted
        let mut bytes = cached.to_vec();
        self.cipher.apply(&mut bytes);
        Ok(Lookup::Value(bytes))
    }

    /// Doubles the header capacity in place and restamps the checksum
    /// (its covered range widens with the file).
    fn grow_header(&mut self) -> StoreResult<()> {
        let from = self.header_region.len();
        let to = from * 2;
        self.header_region.grow(to)?;
        self.header.recompute_checksum(&mut *self.header_region)?;
        self.observer.observe(&StoreEvent::HeaderGrown { from, to });
        Ok(())
    }

    /// Grows the content capacity to the smallest multiple of the current
    /// size strictly greater than `required`.
    fn grow_content(&mut self, required: usize) -> StoreResult<()> {
        let from = self.content_region.len();
        let to = (required / from + 1) * from;
        self.content_region.grow(to)?;
        self.observer.observe(&StoreEvent::ContentGrown { from, to });
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Best-effort safety net; close() is the primary contract
        let _ = self.header_region.flush();
        let _ = self.content_region.flush();
    }
}
