//! Header block codec and integrity maintenance
//!
//! Per STORAGE.md §2 and §9: the block is loaded once at open, kept in
//! memory, and every structural change (append, flag rewrite, compaction
//! rewrite) is mirrored to the mapped region followed by a whole-block
//! checksum recompute. The recompute is O(header capacity); header files
//! are small and the block stays cached, so this is acceptable.

use crate::checksum::Checksum;
use crate::errors::{StoreError, StoreResult};
use crate::observability::{StoreEvent, StoreObserver};
use crate::region::Region;

use super::entry::{EntryFlag, HeaderEntry};

/// Current on-disk format version, stamped on first initialization.
pub const FORMAT_VERSION: u8 = 1;

/// Pad between the checksum and the entry count, reserved for future
/// fields.
pub const RESERVED_BYTES: usize = 128;

const VERSION_OFFSET: usize = 0;
const FLAG_OFFSET: usize = 1;
const CHECKSUM_OFFSET: usize = 2;

/// Block-level status flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFlag {
    /// Freshly created file, never initialized.
    Empty,
    /// Initialized block with a valid checksum.
    Normal,
}

impl BlockFlag {
    fn from_byte(byte: u8) -> Self {
        if byte == 0 {
            BlockFlag::Empty
        } else {
            BlockFlag::Normal
        }
    }
}

/// In-memory image of the header file.
pub struct HeaderBlock {
    version: u8,
    flag: BlockFlag,
    algorithm: Box<dyn Checksum>,
    /// All known entries in on-disk order, tombstones included.
    pub entries: Vec<HeaderEntry>,
    /// Offset of the u16 entry count field.
    count_offset: usize,
    /// Offset one past the last written entry record.
    used: usize,
}

impl HeaderBlock {
    /// Loads the block from `region`, verifying the checksum and
    /// deserializing the entry sequence.
    ///
    /// Fail-soft per STORAGE.md §9: a checksum mismatch or an unparseable
    /// entry sequence resets the index to empty on disk (count zeroed,
    /// checksum restamped) instead of failing the open. A fresh all-zero
    /// file is initialized here: version stamped, flag set to normal.
    pub fn load(
        region: &mut dyn Region,
        algorithm: Box<dyn Checksum>,
        observer: &dyn StoreObserver,
    ) -> StoreResult<Self> {
        let width = algorithm.width();
        let count_offset = CHECKSUM_OFFSET + width + RESERVED_BYTES;

        let version = region.read_u8(VERSION_OFFSET)?;
        let flag = BlockFlag::from_byte(region.read_u8(FLAG_OFFSET)?);

        let mut intact = true;
        if flag == BlockFlag::Normal {
            let mut stored = vec![0u8; width];
            region.read_at(CHECKSUM_OFFSET, &mut stored)?;
            let computed = compute_tail_checksum(region, &*algorithm)?;
            if computed != stored {
                intact = false;
                observer.observe(&StoreEvent::HeaderCorruption {
                    reason: "block checksum mismatch".to_string(),
                });
            }
        }

        let mut count = 0u16;
        if intact && flag == BlockFlag::Normal {
            count = region.read_u16_le(count_offset)?;
        }

        let mut entries = Vec::with_capacity(count as usize);
        let mut pos = count_offset + 2;
        for _ in 0..count {
            match HeaderEntry::read_from(region, pos) {
                Ok((entry, next)) => {
                    entries.push(entry);
                    pos = next;
                }
                // A checksum collision let garbage through; degrade to the
                // same empty-index recovery as a checksum mismatch.
                Err(StoreError::Corrupted(reason)) => {
                    intact = false;
                    entries.clear();
                    observer.observe(&StoreEvent::HeaderCorruption { reason });
                    break;
                }
                Err(StoreError::OutOfBounds { offset, .. }) => {
                    intact = false;
                    entries.clear();
                    observer.observe(&StoreEvent::HeaderCorruption {
                        reason: format!("entry record runs past capacity at offset {}", offset),
                    });
                    break;
                }
                Err(other) => return Err(other),
            }
        }

        let mut block = Self {
            version,
            flag,
            algorithm,
            entries,
            count_offset,
            used: pos,
        };

        let mut dirty = false;
        if !intact {
            block.used = count_offset + 2;
            region.write_u16_le(count_offset, 0)?;
            dirty = true;
        }
        if block.flag == BlockFlag::Empty {
            block.flag = BlockFlag::Normal;
            region.write_u8(FLAG_OFFSET, 1)?;
            if block.version == 0 {
                block.version = FORMAT_VERSION;
                region.write_u8(VERSION_OFFSET, FORMAT_VERSION)?;
            }
            dirty = true;
        }
        if dirty {
            block.recompute_checksum(region)?;
        }

        Ok(block)
    }

    /// Format version read from (or stamped into) the file.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Offset one past the last written entry record.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Appends `entry` at the current end of the entry sequence, bumps the
    /// count, and restamps the checksum. Returns the new entry's index.
    pub fn append(&mut self, region: &mut dyn Region, mut entry: HeaderEntry) -> StoreResult<usize> {
        let end = entry.write_to(region, self.used)?;
        self.entries.push(entry);
        region.write_u16_le(self.count_offset, self.entries.len() as u16)?;
        self.used = end;
        self.recompute_checksum(region)?;
        Ok(self.entries.len() - 1)
    }

    /// Rewrites one entry's flag byte in place and restamps the checksum.
    pub fn update_flag(
        &mut self,
        region: &mut dyn Region,
        index: usize,
        flag: EntryFlag,
    ) -> StoreResult<()> {
        let entry = &mut self.entries[index];
        entry.flag = flag;
        region.write_u8(entry.header_offset, flag.as_byte())?;
        self.recompute_checksum(region)
    }

    /// Tombstones every entry with a single checksum restamp at the end.
    pub fn flag_all_deleted(&mut self, region: &mut dyn Region) -> StoreResult<()> {
        for entry in &mut self.entries {
            entry.flag = EntryFlag::Delete;
            region.write_u8(entry.header_offset, EntryFlag::Delete.as_byte())?;
        }
        self.recompute_checksum(region)
    }

    /// Replaces the whole entry sequence (compaction rewrite): count,
    /// records, and checksum.
    pub fn rewrite(&mut self, region: &mut dyn Region, entries: Vec<HeaderEntry>) -> StoreResult<()> {
        self.entries = entries;
        region.write_u16_le(self.count_offset, self.entries.len() as u16)?;
        let mut pos = self.count_offset + 2;
        for entry in &mut self.entries {
            pos = entry.write_to(region, pos)?;
        }
        self.used = pos;
        self.recompute_checksum(region)
    }

    /// Drops every entry and zeroes the on-disk count (the value-corruption
    /// wipe per STORAGE.md §9).
    pub fn reset_to_empty(&mut self, region: &mut dyn Region) -> StoreResult<()> {
        self.entries.clear();
        self.used = self.count_offset + 2;
        region.write_u16_le(self.count_offset, 0)?;
        self.recompute_checksum(region)
    }

    /// Recomputes the block checksum over the post-checksum tail and
    /// rewrites the checksum field. Must be called after any mutation of
    /// the mapped header bytes, including capacity growth (the covered
    /// range widens with the file).
    pub fn recompute_checksum(&mut self, region: &mut dyn Region) -> StoreResult<()> {
        let digest = compute_tail_checksum(region, &*self.algorithm)?;
        region.write_at(CHECKSUM_OFFSET, &digest)?;
        Ok(())
    }
}

/// Computes the checksum over everything after the checksum field, up to
/// the end of the mapped capacity.
fn compute_tail_checksum(region: &dyn Region, algorithm: &dyn Checksum) -> StoreResult<Vec<u8>> {
    let start = CHECKSUM_OFFSET + algorithm.width();
    let mut tail = vec![0u8; region.len().saturating_sub(start)];
    region.read_at(start, &mut tail)?;
    Ok(algorithm.compute(&tail))
}
