//! Per-key header entry records
//!
//! Per STORAGE.md §3, each record is:
//!
//! ```text
//! +------------------+
//! | Flag             | (u8: 0 = normal, 1 = delete, 2 = null)
//! +------------------+
//! | Key Length       | (u8, so keys are at most 255 encoded bytes)
//! +------------------+
//! | Key Bytes        | (UTF-8, each byte XOR 0xFF on disk)
//! +------------------+
//! | Body Length      | (i32 LE, value bytes + value checksum width)
//! +------------------+
//! | Body Offset      | (i32 LE, into the content file)
//! +------------------+
//! ```
//!
//! The key mask is layout obfuscation only: it keeps keys from being
//! grep-able in the raw file, nothing more.

use crate::errors::{StoreError, StoreResult};
use crate::region::Region;

/// XOR mask applied to every key byte on disk.
pub const KEY_MASK: u8 = 0xFF;

/// Fixed per-record overhead: flag + key length + body length + body offset.
const RECORD_OVERHEAD: usize = 1 + 1 + 4 + 4;

/// Lifecycle state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFlag {
    /// Live entry with value bytes in the content file.
    Normal = 0,
    /// Tombstone: logically absent, bytes reclaimed by compaction.
    Delete = 1,
    /// Explicit absence: the key exists but holds no value.
    Null = 2,
}

impl EntryFlag {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(EntryFlag::Normal),
            1 => Some(EntryFlag::Delete),
            2 => Some(EntryFlag::Null),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One key's metadata within the header block.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderEntry {
    pub flag: EntryFlag,
    pub key: String,
    /// Value bytes plus trailing checksum, as stored in the content file.
    pub body_len: i32,
    /// Byte offset of the body within the content file.
    pub body_offset: i32,
    /// Byte offset of this record within the header file. Maintained on
    /// write/read so the flag byte can be rewritten in place.
    pub header_offset: usize,
}

impl HeaderEntry {
    /// Encoded size of a record with a `key_len`-byte key.
    pub fn encoded_size(key_len: usize) -> usize {
        RECORD_OVERHEAD + key_len
    }

    /// Encoded size of this record.
    pub fn size(&self) -> usize {
        Self::encoded_size(self.key.len())
    }

    /// Value length excluding the trailing checksum.
    pub fn value_len(&self, checksum_width: usize) -> usize {
        (self.body_len as usize).saturating_sub(checksum_width)
    }

    /// Serializes the full record at `offset`, returning the offset just
    /// past it. Records `offset` as this entry's `header_offset`.
    pub fn write_to(&mut self, region: &mut dyn Region, offset: usize) -> StoreResult<usize> {
        self.header_offset = offset;
        let mut pos = offset;

        region.write_u8(pos, self.flag.as_byte())?;
        pos += 1;

        let mut key_bytes = self.key.as_bytes().to_vec();
        mask_key(&mut key_bytes);
        region.write_u8(pos, key_bytes.len() as u8)?;
        pos += 1;
        region.write_at(pos, &key_bytes)?;
        pos += key_bytes.len();

        region.write_i32_le(pos, self.body_len)?;
        pos += 4;
        region.write_i32_le(pos, self.body_offset)?;
        pos += 4;

        Ok(pos)
    }

    /// Deserializes one record at `offset`, returning it together with the
    /// offset just past it.
    pub fn read_from(region: &dyn Region, offset: usize) -> StoreResult<(Self, usize)> {
        let mut pos = offset;

        let flag_byte = region.read_u8(pos)?;
        let flag = EntryFlag::from_byte(flag_byte).ok_or_else(|| {
            StoreError::Corrupted(format!("invalid entry flag {} at offset {}", flag_byte, offset))
        })?;
        pos += 1;

        let key_len = region.read_u8(pos)? as usize;
        pos += 1;
        let mut key_bytes = vec![0u8; key_len];
        region.read_at(pos, &mut key_bytes)?;
        mask_key(&mut key_bytes);
        let key = String::from_utf8_lossy(&key_bytes).into_owned();
        pos += key_len;

        let body_len = region.read_i32_le(pos)?;
        pos += 4;
        let body_offset = region.read_i32_le(pos)?;
        pos += 4;

        if body_len < 0 || body_offset < 0 {
            return Err(StoreError::Corrupted(format!(
                "negative body length {} or offset {} at offset {}",
                body_len, body_offset, offset
            )));
        }

        Ok((
            Self {
                flag,
                key,
                body_len,
                body_offset,
                header_offset: offset,
            },
            pos,
        ))
    }
}

/// Applies the on-disk key mask (symmetric).
fn mask_key(bytes: &mut [u8]) {
    for byte in bytes.iter_mut() {
        *byte ^= KEY_MASK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::NullObserver;
    use crate::region::{self, Region, PAGE_SIZE};
    use tempfile::TempDir;

    fn test_region() -> (TempDir, Box<dyn Region>) {
        let dir = TempDir::new().unwrap();
        let region = region::open(&dir.path().join("hdr"), PAGE_SIZE, &NullObserver).unwrap();
        (dir, region)
    }

    fn sample_entry() -> HeaderEntry {
        HeaderEntry {
            flag: EntryFlag::Normal,
            key: "player_score".to_string(),
            body_len: 9,
            body_offset: 42,
            header_offset: 0,
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let (_dir, mut region) = test_region();
        let mut entry = sample_entry();

        let end = entry.write_to(&mut *region, 200).unwrap();
        assert_eq!(end, 200 + entry.size());
        assert_eq!(entry.header_offset, 200);

        let (read, consumed) = HeaderEntry::read_from(&*region, 200).unwrap();
        assert_eq!(read, entry);
        assert_eq!(consumed, end);
    }

    #[test]
    fn test_unicode_key_roundtrip() {
        let (_dir, mut region) = test_region();
        let mut entry = sample_entry();
        entry.key = "设置🔑".to_string();

        entry.write_to(&mut *region, 0).unwrap();
        let (read, _) = HeaderEntry::read_from(&*region, 0).unwrap();
        assert_eq!(read.key, "设置🔑");
    }

    #[test]
    fn test_key_is_masked_on_disk() {
        let (_dir, mut region) = test_region();
        let mut entry = sample_entry();
        entry.write_to(&mut *region, 0).unwrap();

        let mut raw = vec![0u8; entry.key.len()];
        region.read_at(2, &mut raw).unwrap();
        assert_ne!(raw, entry.key.as_bytes());

        for byte in raw.iter_mut() {
            *byte ^= KEY_MASK;
        }
        assert_eq!(raw, entry.key.as_bytes());
    }

    #[test]
    fn test_invalid_flag_is_corruption() {
        let (_dir, mut region) = test_region();
        region.write_u8(0, 9).unwrap();

        let err = HeaderEntry::read_from(&*region, 0).unwrap_err();
        assert!(matches!(err, crate::errors::StoreError::Corrupted(_)));
    }

    #[test]
    fn test_negative_body_len_is_corruption() {
        let (_dir, mut region) = test_region();
        let mut entry = sample_entry();
        entry.write_to(&mut *region, 0).unwrap();
        // Corrupt the body length field: flag(1) + len(1) + key
        region.write_i32_le(2 + entry.key.len(), -5).unwrap();

        let err = HeaderEntry::read_from(&*region, 0).unwrap_err();
        assert!(matches!(err, crate::errors::StoreError::Corrupted(_)));
    }

    #[test]
    fn test_flag_bytes_stable() {
        assert_eq!(EntryFlag::Normal.as_byte(), 0);
        assert_eq!(EntryFlag::Delete.as_byte(), 1);
        assert_eq!(EntryFlag::Null.as_byte(), 2);
        assert_eq!(EntryFlag::from_byte(2), Some(EntryFlag::Null));
        assert_eq!(EntryFlag::from_byte(3), None);
    }

    #[test]
    fn test_value_len_excludes_checksum() {
        let entry = sample_entry();
        assert_eq!(entry.value_len(1), 8);
        assert_eq!(entry.value_len(4), 5);
    }
}
