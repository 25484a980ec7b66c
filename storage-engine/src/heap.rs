//! Heap-organized record storage.
//!
//! Records are `(key: i32, value: String)` tuples, appended in insertion
//! order and never moved once written — a `RecordId` is stable for the
//! lifetime of the file. Pages are filled greedily: a record that does not
//! fit in the current page starts a fresh one, so a page can carry unused
//! trailing space but a record is never split across pages.

use crate::error::{EngineError, EngineResult};
use crate::paged_file::{OpenMode, PagedFile, PAGE_SIZE};
use std::path::Path;

/// A stable pointer to a record: the page it lives on and its slot within
/// that page's record stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub pid: i32,
    pub sid: i32,
}

/// A `(key, value)` tuple read back out of the heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: i32,
    pub value: String,
}

/// Bytes at the front of a heap page reserved for the count of whole
/// records it holds.
const PAGE_HEADER_SIZE: usize = 4;

/// `key (4 bytes) + value length (4 bytes)`, before the value's own bytes.
const RECORD_PREFIX_SIZE: usize = 8;

/// A heap file: an append-only sequence of fixed-size pages, each holding as
/// many whole `(key, value)` records as fit.
pub struct HeapFile {
    file: PagedFile,
}

impl HeapFile {
    pub fn open(path: &Path, mode: OpenMode) -> EngineResult<Self> {
        Ok(Self {
            file: PagedFile::open(path, mode)?,
        })
    }

    pub fn close(self) -> EngineResult<()> {
        self.file.close()
    }

    /// Appends `(key, value)` to the heap, returning the `RecordId` it was
    /// stored under. Starts a new page when the record does not fit in the
    /// current last page, or when the heap is empty.
    pub fn append(&mut self, key: i32, value: &str) -> EngineResult<RecordId> {
        let needed = RECORD_PREFIX_SIZE + value.len();
        let end_pid = self.file.end_pid()?;

        let (pid, mut buf, mut count, mut cursor) = if end_pid == 0 {
            (0, [0u8; PAGE_SIZE], 0usize, PAGE_HEADER_SIZE)
        } else {
            let last_pid = end_pid - 1;
            let mut buf = [0u8; PAGE_SIZE];
            self.file.read(last_pid, &mut buf)?;
            let count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
            let cursor = Self::records_end_offset(&buf, count);
            if cursor + needed <= PAGE_SIZE {
                (last_pid, buf, count, cursor)
            } else {
                (last_pid + 1, [0u8; PAGE_SIZE], 0usize, PAGE_HEADER_SIZE)
            }
        };

        if needed > PAGE_SIZE - PAGE_HEADER_SIZE {
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "record too large for a single page",
            )));
        }

        buf[cursor..cursor + 4].copy_from_slice(&key.to_le_bytes());
        buf[cursor + 4..cursor + 8].copy_from_slice(&(value.len() as u32).to_le_bytes());
        buf[cursor + 8..cursor + 8 + value.len()].copy_from_slice(value.as_bytes());

        count += 1;
        buf[0..4].copy_from_slice(&(count as u32).to_le_bytes());

        self.file.write(pid, &buf)?;
        Ok(RecordId {
            pid,
            sid: (count - 1) as i32,
        })
    }

    /// Reads the record at `rid`.
    pub fn read(&self, rid: RecordId) -> EngineResult<Record> {
        let mut buf = [0u8; PAGE_SIZE];
        self.file.read(rid.pid, &mut buf)?;
        let count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        if rid.sid < 0 || rid.sid as usize >= count {
            return Err(EngineError::NoSuchRecord);
        }

        let mut offset = PAGE_HEADER_SIZE;
        for _ in 0..rid.sid {
            offset = Self::advance_past_record(&buf, offset);
        }
        let key = i32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
        let len = u32::from_le_bytes(buf[offset + 4..offset + 8].try_into().unwrap()) as usize;
        let value =
            String::from_utf8_lossy(&buf[offset + 8..offset + 8 + len]).into_owned();
        Ok(Record { key, value })
    }

    /// One past the last written `RecordId`: `(end_pid, 0)` if the last page
    /// holds no records reachable this way, otherwise the slot after the
    /// last record on the last allocated page. Used by a full heap scan
    /// that walks `(0, 0) .. end_rid()` rather than reading every page's
    /// record count up front.
    pub fn end_rid(&self) -> EngineResult<RecordId> {
        let end_pid = self.file.end_pid()?;
        if end_pid == 0 {
            return Ok(RecordId { pid: 0, sid: 0 });
        }
        let last_pid = end_pid - 1;
        let mut buf = [0u8; PAGE_SIZE];
        self.file.read(last_pid, &mut buf)?;
        let count = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        Ok(RecordId {
            pid: last_pid,
            sid: count as i32,
        })
    }

    /// Iterates every record in the heap, in physical storage order.
    pub fn scan(&self) -> EngineResult<Vec<(RecordId, Record)>> {
        let mut out = Vec::new();
        let end_pid = self.file.end_pid()?;
        for pid in 0..end_pid {
            let mut buf = [0u8; PAGE_SIZE];
            self.file.read(pid, &mut buf)?;
            let count = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
            let mut offset = PAGE_HEADER_SIZE;
            for sid in 0..count {
                let key = i32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap());
                let len =
                    u32::from_le_bytes(buf[offset + 4..offset + 8].try_into().unwrap()) as usize;
                let value =
                    String::from_utf8_lossy(&buf[offset + 8..offset + 8 + len]).into_owned();
                out.push((
                    RecordId {
                        pid,
                        sid: sid as i32,
                    },
                    Record { key, value },
                ));
                offset = Self::advance_past_record(&buf, offset);
            }
        }
        Ok(out)
    }

    fn advance_past_record(buf: &[u8; PAGE_SIZE], offset: usize) -> usize {
        let len = u32::from_le_bytes(buf[offset + 4..offset + 8].try_into().unwrap()) as usize;
        offset + RECORD_PREFIX_SIZE + len
    }

    fn records_end_offset(buf: &[u8; PAGE_SIZE], count: usize) -> usize {
        let mut offset = PAGE_HEADER_SIZE;
        for _ in 0..count {
            offset = Self::advance_past_record(buf, offset);
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn append_then_read_round_trips() {
        let tmp = NamedTempFile::new().unwrap();
        let mut heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        let rid = heap.append(42, "hello").unwrap();
        let record = heap.read(rid).unwrap();
        assert_eq!(record.key, 42);
        assert_eq!(record.value, "hello");
    }

    #[test]
    fn multiple_records_share_a_page_until_full() {
        let tmp = NamedTempFile::new().unwrap();
        let mut heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        let mut rids = Vec::new();
        for i in 0..20 {
            rids.push(heap.append(i, "short value").unwrap());
        }
        assert!(rids.iter().all(|r| r.pid == 0));
        for (i, rid) in rids.iter().enumerate() {
            assert_eq!(heap.read(*rid).unwrap().key, i as i32);
        }
    }

    #[test]
    fn end_rid_is_empty_on_a_fresh_heap() {
        let tmp = NamedTempFile::new().unwrap();
        let heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        assert_eq!(heap.end_rid().unwrap(), RecordId { pid: 0, sid: 0 });
    }

    #[test]
    fn end_rid_advances_past_the_last_appended_record() {
        let tmp = NamedTempFile::new().unwrap();
        let mut heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        heap.append(1, "a").unwrap();
        heap.append(2, "b").unwrap();
        assert_eq!(heap.end_rid().unwrap(), RecordId { pid: 0, sid: 2 });

        let big = "x".repeat(PAGE_SIZE - 64);
        heap.append(3, &big).unwrap();
        heap.append(4, "c").unwrap();
        assert_eq!(heap.end_rid().unwrap(), RecordId { pid: 1, sid: 1 });
    }

    #[test]
    fn large_values_roll_onto_a_new_page() {
        let tmp = NamedTempFile::new().unwrap();
        let mut heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        let big = "x".repeat(PAGE_SIZE - 64);
        let first = heap.append(1, &big).unwrap();
        let second = heap.append(2, "small").unwrap();
        assert_ne!(first.pid, second.pid);
    }

    #[test]
    fn scan_visits_every_record_in_order() {
        let tmp = NamedTempFile::new().unwrap();
        let mut heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        for i in 0..50 {
            heap.append(i, "v").unwrap();
        }
        let scanned = heap.scan().unwrap();
        assert_eq!(scanned.len(), 50);
        for (i, (_, record)) in scanned.iter().enumerate() {
            assert_eq!(record.key, i as i32);
        }
    }

    #[test]
    fn reading_out_of_range_slot_fails() {
        let tmp = NamedTempFile::new().unwrap();
        let mut heap = HeapFile::open(tmp.path(), OpenMode::Write).unwrap();
        heap.append(1, "v").unwrap();
        let bogus = RecordId { pid: 0, sid: 5 };
        assert!(matches!(heap.read(bogus), Err(EngineError::NoSuchRecord)));
    }
}
