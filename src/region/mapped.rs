//! Memory-mapped region implementation
//!
//! The fast path: the whole backing file is mapped read/write and accessed
//! through slice copies, so every access stays bounds-checked even though
//! the mapping itself is created with unsafe code. Growth remaps: flush,
//! extend the file, map the larger range, drop the old view.

use std::fs::File;

use memmap2::{MmapMut, MmapOptions};

use super::{check_bounds, Region};
use crate::errors::StoreResult;

/// Region backed by a writable memory map of the entire file.
pub struct MappedRegion {
    file: File,
    map: MmapMut,
}

impl MappedRegion {
    /// Maps `file` over its full current length.
    ///
    /// On mapping failure the file handle is returned to the caller so it
    /// can fall back to plain file I/O.
    pub fn new(file: File) -> Result<Self, (File, std::io::Error)> {
        // SAFETY: the store owns the backing file exclusively for the
        // lifetime of the map; see STORAGE.md §10 on the single-writer
        // contract. The map is never exposed outside this module.
        match unsafe { MmapOptions::new().map_mut(&file) } {
            Ok(map) => Ok(Self { file, map }),
            Err(err) => Err((file, err)),
        }
    }
}

impl Region for MappedRegion {
    fn len(&self) -> usize {
        self.map.len()
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> StoreResult<()> {
        check_bounds(offset, buf.len(), self.map.len())?;
        buf.copy_from_slice(&self.map[offset..offset + buf.len()]);
        Ok(())
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> StoreResult<()> {
        check_bounds(offset, data.len(), self.map.len())?;
        self.map[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        self.map.flush()?;
        Ok(())
    }

    fn grow(&mut self, new_len: usize) -> StoreResult<()> {
        if new_len <= self.map.len() {
            return Ok(());
        }
        self.map.flush()?;
        self.file.set_len(new_len as u64)?;
        // SAFETY: same exclusive-ownership argument as `new`; the previous
        // map is replaced (and unmapped) immediately after the new one is
        // established.
        let map = unsafe { MmapOptions::new().map_mut(&self.file)? };
        self.map = map;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use std::fs::OpenOptions;
    use tempfile::TempDir;

    fn mapped(len: u64) -> (TempDir, MappedRegion) {
        let dir = TempDir::new().unwrap();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(dir.path().join("region"))
            .unwrap();
        file.set_len(len).unwrap();
        let region = MappedRegion::new(file).unwrap();
        (dir, region)
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, mut region) = mapped(256);
        region.write_at(10, b"hello mapped world").unwrap();

        let mut buf = [0u8; 18];
        region.read_at(10, &mut buf).unwrap();
        assert_eq!(&buf, b"hello mapped world");
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let (_dir, mut region) = mapped(64);

        let mut buf = [0u8; 8];
        let err = region.read_at(60, &mut buf).unwrap_err();
        assert!(matches!(err, StoreError::OutOfBounds { .. }));

        let err = region.write_at(64, &[1]).unwrap_err();
        assert!(matches!(err, StoreError::OutOfBounds { .. }));
    }

    #[test]
    fn test_grow_preserves_content() {
        let (_dir, mut region) = mapped(128);
        region.write_at(0, b"keep me around").unwrap();

        region.grow(1024).unwrap();
        assert_eq!(region.len(), 1024);

        let mut buf = [0u8; 14];
        region.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"keep me around");

        // New tail is writable
        region.write_at(1000, b"tail").unwrap();
    }

    #[test]
    fn test_grow_to_smaller_is_noop() {
        let (_dir, mut region) = mapped(256);
        region.grow(64).unwrap();
        assert_eq!(region.len(), 256);
    }

    #[test]
    fn test_flush_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("region");
        {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(&path)
                .unwrap();
            file.set_len(64).unwrap();
            let mut region = MappedRegion::new(file).unwrap();
            region.write_at(3, b"durable").unwrap();
            region.flush().unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[3..10], b"durable");
    }
}
