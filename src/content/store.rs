//! Value byte storage, lazy loading, and per-value integrity
//!
//! The lookup map holds a stable index into the header block's entry
//! vector, never a reference, so compaction can rewrite the entry sequence
//! and simply rebuild the indices (STORAGE.md §6). Body slots are a vector
//! parallel to the entries: slot `i` caches entry `i`'s bytes.

use std::collections::HashMap;

use crate::checksum::Checksum;
use crate::errors::{StoreError, StoreResult};
use crate::header::{EntryFlag, HeaderEntry};
use crate::region::Region;

/// Cached bytes for one entry. Both fields populate together on first
/// read or write.
#[derive(Debug, Default)]
struct Body {
    value: Option<Vec<u8>>,
    checksum: Option<Vec<u8>>,
}

/// In-memory view of the content file.
pub struct ContentStore {
    algorithm: Box<dyn Checksum>,
    /// Parallel to the header block's entry vector.
    bodies: Vec<Body>,
    /// key → entry index, most recent write wins.
    lookup: HashMap<String, usize>,
    /// Packed end of the content region: sum of all not-yet-compacted
    /// entries' body lengths.
    used: usize,
}

impl ContentStore {
    pub fn new(algorithm: Box<dyn Checksum>) -> Self {
        Self {
            algorithm,
            bodies: Vec::new(),
            lookup: HashMap::new(),
            used: 0,
        }
    }

    /// Width of the per-value checksum in bytes.
    pub fn checksum_width(&self) -> usize {
        self.algorithm.width()
    }

    /// Packed end of the content region.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Appends an empty body slot; call once per appended header entry so
    /// the parallel vectors stay in lockstep.
    pub fn push_slot(&mut self) {
        self.bodies.push(Body::default());
    }

    /// Index of the live entry for `key`, filtering tombstones.
    pub fn live_index(&self, key: &str, entries: &[HeaderEntry]) -> Option<usize> {
        let &index = self.lookup.get(key)?;
        if entries[index].flag == EntryFlag::Delete {
            None
        } else {
            Some(index)
        }
    }

    /// Registers entry `index` as the current holder of its key and
    /// advances the packed size. A previously registered entry for the
    /// same key is tombstoned in memory (open-time duplicate resolution:
    /// latest in header order wins).
    pub fn register(&mut self, index: usize, entries: &mut [HeaderEntry]) {
        let key = entries[index].key.clone();
        if let Some(&previous) = self.lookup.get(&key) {
            if previous != index {
                entries[previous].flag = EntryFlag::Delete;
            }
        }
        self.lookup.insert(key, index);
        self.used = (entries[index].body_offset + entries[index].body_len) as usize;
    }

    /// Whether entry `index` has its bytes cached.
    pub fn is_cached(&self, index: usize) -> bool {
        self.bodies[index].value.is_some()
    }

    /// Reads entry `index`'s value and checksum from the content region
    /// into the cache. No-op when already cached.
    pub fn load(&mut self, index: usize, entry: &HeaderEntry, region: &dyn Region) -> StoreResult<()> {
        if self.is_cached(index) {
            return Ok(());
        }

        let width = self.algorithm.width();
        if (entry.body_len as usize) < width {
            return Err(StoreError::Corrupted(format!(
                "body length {} shorter than checksum width {} for key '{}'",
                entry.body_len, width, entry.key
            )));
        }

        let value_len = entry.value_len(width);
        let offset = entry.body_offset as usize;

        let mut value = vec![0u8; value_len];
        region.read_at(offset, &mut value)?;
        let mut checksum = vec![0u8; width];
        region.read_at(offset + value_len, &mut checksum)?;

        self.bodies[index] = Body {
            value: Some(value),
            checksum: Some(checksum),
        };
        Ok(())
    }

    /// Recomputes the checksum over the cached value and compares it to
    /// the stored one. Only meaningful after `load`; used at open time,
    /// since in-session writes keep cache and disk in sync by construction.
    pub fn verify(&self, index: usize) -> bool {
        match (&self.bodies[index].value, &self.bodies[index].checksum) {
            (Some(value), Some(checksum)) => self.algorithm.verify(value, checksum),
            _ => false,
        }
    }

    /// Writes `value` plus a freshly computed checksum at the entry's
    /// offset and refreshes the cache.
    pub fn write(
        &mut self,
        index: usize,
        entry: &HeaderEntry,
        region: &mut dyn Region,
        value: Vec<u8>,
    ) -> StoreResult<()> {
        debug_assert_eq!(value.len() + self.algorithm.width(), entry.body_len as usize);

        let checksum = self.algorithm.compute(&value);
        let offset = entry.body_offset as usize;
        region.write_at(offset, &value)?;
        region.write_at(offset + value.len(), &checksum)?;

        self.bodies[index] = Body {
            value: Some(value),
            checksum: Some(checksum),
        };
        Ok(())
    }

    /// Rewrites the cached value and checksum at the entry's (possibly
    /// shifted) offset without recomputing the checksum. Compaction's move
    /// path: the bytes are unchanged, only the offset moved.
    pub fn write_back(&self, index: usize, entry: &HeaderEntry, region: &mut dyn Region) -> StoreResult<()> {
        let (value, checksum) = match (&self.bodies[index].value, &self.bodies[index].checksum) {
            (Some(v), Some(c)) => (v, c),
            _ => {
                return Err(StoreError::Corrupted(format!(
                    "no cached body to relocate for key '{}'",
                    entry.key
                )))
            }
        };
        let offset = entry.body_offset as usize;
        region.write_at(offset, value)?;
        region.write_at(offset + value.len(), checksum)?;
        Ok(())
    }

    /// Cached value comparison for the small-value overwrite fast path.
    /// False when the value is not cached.
    pub fn cached_equals(&self, index: usize, bytes: &[u8]) -> bool {
        self.bodies[index].value.as_deref() == Some(bytes)
    }

    /// Borrow of the cached (encrypted-at-rest) value bytes.
    pub fn value(&self, index: usize) -> Option<&[u8]> {
        self.bodies[index].value.as_deref()
    }

    /// Forgets a tombstoned entry during compaction: shrinks the packed
    /// size and drops the key mapping if it still points here.
    pub fn drop_entry(&mut self, index: usize, entry: &HeaderEntry) {
        self.used -= entry.body_len as usize;
        if self.lookup.get(&entry.key) == Some(&index) {
            self.lookup.remove(&entry.key);
        }
    }

    /// Rebuilds the parallel state after a compaction rewrite: `survivors`
    /// lists the old indices of the kept entries, in order, and
    /// `new_entries` is the rewritten entry sequence they now occupy.
    pub fn compact_retain(&mut self, survivors: &[usize], new_entries: &[HeaderEntry]) {
        let mut bodies = Vec::with_capacity(survivors.len());
        for &old in survivors {
            bodies.push(std::mem::take(&mut self.bodies[old]));
        }
        self.bodies = bodies;

        self.lookup.clear();
        for (index, entry) in new_entries.iter().enumerate() {
            self.lookup.insert(entry.key.clone(), index);
        }
    }

    /// Wipes all cached state (the whole-store value-corruption reset).
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.lookup.clear();
        self.used = 0;
    }
}
