//! Compaction: physical reclamation of tombstoned bytes
//!
//! Per STORAGE.md §7, compaction scans entries in header order and
//! accumulates the byte count of tombstones seen so far. Each tombstone is
//! dropped; each live entry encountered after a tombstone has its body
//! moved left by the accumulated amount, so content offsets stay densely
//! packed with zero gaps. The header sequence is rewritten once at the
//! end. Running compaction twice in a row reclaims nothing the second
//! time and leaves the files byte-identical.
//!
//! Runs at open (to discard the prior session's tombstones) and before an
//! append that would overflow the header capacity.

use crate::content::ContentStore;
use crate::errors::StoreResult;
use crate::header::{EntryFlag, HeaderBlock};
use crate::observability::{StoreEvent, StoreObserver};
use crate::region::Region;

/// Runs one compaction pass. Returns the number of content bytes
/// reclaimed (zero when there was nothing to do, in which case neither
/// file is touched).
pub(crate) fn run(
    header: &mut HeaderBlock,
    content: &mut ContentStore,
    header_region: &mut dyn Region,
    content_region: &mut dyn Region,
    observer: &dyn StoreObserver,
) -> StoreResult<usize> {
    if header.entries.is_empty() {
        return Ok(0);
    }

    let mut reclaimed = 0usize;
    for index in 0..header.entries.len() {
        if header.entries[index].flag == EntryFlag::Delete {
            content.drop_entry(index, &header.entries[index]);
            reclaimed += header.entries[index].body_len as usize;
            continue;
        }
        if reclaimed == 0 {
            continue;
        }

        // Read at the old offset before shifting, then move the body
        content.load(index, &header.entries[index], content_region)?;
        header.entries[index].body_offset -= reclaimed as i32;
        content.write_back(index, &header.entries[index], content_region)?;
    }

    if reclaimed == 0 {
        return Ok(0);
    }

    let mut survivors = Vec::new();
    let mut rewritten = Vec::new();
    for (index, entry) in header.entries.iter().enumerate() {
        if entry.flag != EntryFlag::Delete {
            survivors.push(index);
            rewritten.push(entry.clone());
        }
    }

    header.rewrite(header_region, rewritten)?;
    content.compact_retain(&survivors, &header.entries);

    observer.observe(&StoreEvent::Compacted {
        reclaimed,
        live: header.entries.len(),
    });
    Ok(reclaimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{Checksum, XorChecksum};
    use crate::header::HeaderEntry;
    use crate::observability::NullObserver;
    use crate::region::{self, PAGE_SIZE};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        header: HeaderBlock,
        content: ContentStore,
        header_region: Box<dyn Region>,
        content_region: Box<dyn Region>,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut header_region =
            region::open(&dir.path().join("s.idx"), PAGE_SIZE, &NullObserver).unwrap();
        let content_region =
            region::open(&dir.path().join("s.dat"), PAGE_SIZE, &NullObserver).unwrap();
        let header =
            HeaderBlock::load(&mut *header_region, Box::new(XorChecksum), &NullObserver).unwrap();
        Fixture {
            _dir: dir,
            header,
            content: ContentStore::new(Box::new(XorChecksum)),
            header_region,
            content_region,
        }
    }

    fn insert(fixture: &mut Fixture, key: &str, value: &[u8]) -> usize {
        let body_len = (value.len() + XorChecksum.width()) as i32;
        let entry = HeaderEntry {
            flag: EntryFlag::Normal,
            key: key.to_string(),
            body_len,
            body_offset: fixture.content.used() as i32,
            header_offset: 0,
        };
        let index = fixture
            .header
            .append(&mut *fixture.header_region, entry)
            .unwrap();
        fixture.content.push_slot();
        fixture
            .content
            .write(
                index,
                &fixture.header.entries[index],
                &mut *fixture.content_region,
                value.to_vec(),
            )
            .unwrap();
        fixture.content.register(index, &mut fixture.header.entries);
        index
    }

    #[test]
    fn test_reclaims_and_shifts() {
        let mut f = fixture();
        insert(&mut f, "a", b"aaaa"); // body 5, offset 0
        insert(&mut f, "b", b"bb"); // body 3, offset 5
        insert(&mut f, "c", b"cccccc"); // body 7, offset 8
        f.header
            .update_flag(&mut *f.header_region, 1, EntryFlag::Delete)
            .unwrap();

        let reclaimed = run(
            &mut f.header,
            &mut f.content,
            &mut *f.header_region,
            &mut *f.content_region,
            &NullObserver,
        )
        .unwrap();

        assert_eq!(reclaimed, 3);
        assert_eq!(f.header.entries.len(), 2);
        assert_eq!(f.header.entries[0].key, "a");
        assert_eq!(f.header.entries[0].body_offset, 0);
        assert_eq!(f.header.entries[1].key, "c");
        assert_eq!(f.header.entries[1].body_offset, 5);
        assert_eq!(f.content.used(), 12);

        // The moved body is readable at its new offset
        let mut moved = vec![0u8; 6];
        f.content_region.read_at(5, &mut moved).unwrap();
        assert_eq!(&moved, b"cccccc");

        // Lookup indices were rebuilt
        assert_eq!(f.content.live_index("c", &f.header.entries), Some(1));
        assert_eq!(f.content.live_index("b", &f.header.entries), None);
    }

    #[test]
    fn test_noop_without_tombstones() {
        let mut f = fixture();
        insert(&mut f, "a", b"aaaa");
        insert(&mut f, "b", b"bb");

        let reclaimed = run(
            &mut f.header,
            &mut f.content,
            &mut *f.header_region,
            &mut *f.content_region,
            &NullObserver,
        )
        .unwrap();

        assert_eq!(reclaimed, 0);
        assert_eq!(f.header.entries.len(), 2);
        assert_eq!(f.header.entries[1].body_offset, 5);
    }

    #[test]
    fn test_second_run_reclaims_nothing() {
        let mut f = fixture();
        insert(&mut f, "a", b"aaaa");
        insert(&mut f, "b", b"bb");
        f.header
            .update_flag(&mut *f.header_region, 0, EntryFlag::Delete)
            .unwrap();

        let first = run(
            &mut f.header,
            &mut f.content,
            &mut *f.header_region,
            &mut *f.content_region,
            &NullObserver,
        )
        .unwrap();
        assert_eq!(first, 5);

        let second = run(
            &mut f.header,
            &mut f.content,
            &mut *f.header_region,
            &mut *f.content_region,
            &NullObserver,
        )
        .unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn test_all_tombstones_empties_store() {
        let mut f = fixture();
        insert(&mut f, "a", b"aaaa");
        insert(&mut f, "b", b"bb");
        f.header.flag_all_deleted(&mut *f.header_region).unwrap();

        let reclaimed = run(
            &mut f.header,
            &mut f.content,
            &mut *f.header_region,
            &mut *f.content_region,
            &NullObserver,
        )
        .unwrap();

        assert_eq!(reclaimed, 8);
        assert!(f.header.entries.is_empty());
        assert_eq!(f.content.used(), 0);
    }
}
