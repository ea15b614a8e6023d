//! Plain file-I/O region implementation
//!
//! The safe fallback used when memory-mapping is unavailable. Every access
//! is an explicit seek + read/write on the file handle; semantics match
//! [`super::MappedRegion`] exactly, only slower.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use super::{check_bounds, Region};
use crate::errors::StoreResult;

/// Region backed by seek-based file I/O.
pub struct FileRegion {
    file: File,
    len: usize,
}

impl FileRegion {
    pub fn new(file: File) -> StoreResult<Self> {
        let len = file.metadata()?.len() as usize;
        Ok(Self { file, len })
    }
}

impl Region for FileRegion {
    fn len(&self) -> usize {
        self.len
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> StoreResult<()> {
        check_bounds(offset, buf.len(), self.len)?;
        // &File implements Read/Seek, so shared access suffices here
        let mut handle = &self.file;
        handle.seek(SeekFrom::Start(offset as u64))?;
        handle.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> StoreResult<()> {
        check_bounds(offset, data.len(), self.len)?;
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(data)?;
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn grow(&mut self, new_len: usize) -> StoreResult<()> {
        if new_len <= self.len {
            return Ok(());
        }
        self.file.set_len(new_len as u64)?;
        self.len = new_len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use std::fs::OpenOptions;
    use tempfile::TempDir;

    fn file_region(len: u64) -> (TempDir, FileRegion) {
        let dir = TempDir::new().unwrap();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(dir.path().join("region"))
            .unwrap();
        file.set_len(len).unwrap();
        let region = FileRegion::new(file).unwrap();
        (dir, region)
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, mut region) = file_region(128);
        region.write_at(40, b"fallback path").unwrap();

        let mut buf = [0u8; 13];
        region.read_at(40, &mut buf).unwrap();
        assert_eq!(&buf, b"fallback path");
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let (_dir, mut region) = file_region(32);
        let err = region.write_at(30, b"xyz").unwrap_err();
        assert!(matches!(err, StoreError::OutOfBounds { .. }));
    }

    #[test]
    fn test_grow_extends_capacity() {
        let (_dir, mut region) = file_region(32);
        region.write_at(0, b"before").unwrap();

        region.grow(128).unwrap();
        assert_eq!(region.len(), 128);

        let mut buf = [0u8; 6];
        region.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"before");
        region.write_at(120, b"after").unwrap();
    }
}
