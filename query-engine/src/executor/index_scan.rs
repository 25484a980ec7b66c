//! Index-driven scan: seeks the B+Tree to a starting key and reads forward,
//! short-circuiting as soon as a key-column predicate proves no later entry
//! can match.
//!
//! Because entries come back in ascending key order, an `Eq`/`Lt`/`Le`
//! clause that fails against the current key can never start matching
//! again later — the scan is done. A failing `Gt`/`Ge`/`Ne` clause, or a
//! failing value-column clause, only rules out the current tuple; the scan
//! reads on.

use super::Executor;
use crate::predicate::{Comparator, Predicate};
use crate::QueryResult;
use storage_engine::{BTreeIndex, Cursor, EngineError, HeapFile, ReadForwardOutcome, Record};

fn stops_scan(cmp: Comparator) -> bool {
    matches!(cmp, Comparator::Eq | Comparator::Lt | Comparator::Le)
}

pub struct IndexScanExecutor<'a> {
    index: &'a BTreeIndex,
    heap: &'a HeapFile,
    seek_key: Option<i32>,
    key_predicates: Vec<&'a Predicate>,
    value_predicates: Vec<&'a Predicate>,
    /// Whether a surviving entry needs its heap tuple read at all. `false`
    /// for a `count(*)` query with no value-column predicates to check —
    /// the key alone, visited straight off the index, is enough to decide
    /// a match.
    needs_heap: bool,
    cursor: Option<Cursor>,
    exhausted: bool,
}

impl<'a> IndexScanExecutor<'a> {
    pub fn new(
        index: &'a BTreeIndex,
        heap: &'a HeapFile,
        seek_key: Option<i32>,
        key_predicates: Vec<&'a Predicate>,
        value_predicates: Vec<&'a Predicate>,
    ) -> Self {
        Self::with_heap_access(index, heap, seek_key, key_predicates, value_predicates, true)
    }

    /// Like `new`, but lets the caller skip heap reads entirely — used for
    /// `count(*)` when no value-column predicate needs a heap tuple to
    /// evaluate. Records produced while `needs_heap` is `false` carry an
    /// empty value; only their key is meaningful.
    pub fn with_heap_access(
        index: &'a BTreeIndex,
        heap: &'a HeapFile,
        seek_key: Option<i32>,
        key_predicates: Vec<&'a Predicate>,
        value_predicates: Vec<&'a Predicate>,
        needs_heap: bool,
    ) -> Self {
        debug_assert!(
            needs_heap || value_predicates.is_empty(),
            "cannot skip heap reads when a value predicate must be evaluated"
        );
        Self {
            index,
            heap,
            seek_key,
            key_predicates,
            value_predicates,
            needs_heap,
            cursor: None,
            exhausted: false,
        }
    }
}

impl<'a> Executor for IndexScanExecutor<'a> {
    fn init(&mut self) -> QueryResult<()> {
        let (cursor, _found) = self.index.locate(self.seek_key.unwrap_or(i32::MIN))?;
        self.cursor = Some(cursor);
        self.exhausted = false;
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Record>> {
        if self.exhausted {
            return Ok(None);
        }
        let cursor = self.cursor.as_mut().expect("init() called before next()");

        loop {
            let (key, rid) = match self.index.read_forward(cursor) {
                Ok(ReadForwardOutcome::Entry { key, rid }) => (key, rid),
                Ok(ReadForwardOutcome::Advanced) => continue,
                Err(EngineError::EndOfTree) => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            let mut skip = false;
            for p in &self.key_predicates {
                if !p.matches_key(key) {
                    if stops_scan(p.cmp) {
                        self.exhausted = true;
                        return Ok(None);
                    }
                    skip = true;
                }
            }
            if skip {
                continue;
            }

            if !self.needs_heap {
                return Ok(Some(Record {
                    key,
                    value: String::new(),
                }));
            }

            let record = self.heap.read(rid)?;
            if self.value_predicates.iter().any(|p| !p.matches(&record)) {
                continue;
            }

            return Ok(Some(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;
    use storage_engine::OpenMode;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, NamedTempFile) {
        (NamedTempFile::new().unwrap(), NamedTempFile::new().unwrap())
    }

    #[test]
    fn index_scan_with_ge_seek_reads_ascending_from_seek_key() {
        let (heap_tmp, idx_tmp) = setup();
        let mut heap = HeapFile::open(heap_tmp.path(), OpenMode::Write).unwrap();
        let mut index = BTreeIndex::open(idx_tmp.path(), OpenMode::Write).unwrap();
        for i in 0..20 {
            let rid = heap.append(i, &format!("v{i}")).unwrap();
            index.insert(i, rid).unwrap();
        }

        let preds = vec![Predicate::key(Comparator::Ge, 15)];
        let refs: Vec<&Predicate> = preds.iter().collect();
        let mut scan = IndexScanExecutor::new(&index, &heap, Some(15), refs, Vec::new());
        let results = super::super::collect_all(&mut scan).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].key, 15);
        assert_eq!(results[4].key, 19);
    }

    #[test]
    fn le_predicate_short_circuits_as_soon_as_it_fails() {
        let (heap_tmp, idx_tmp) = setup();
        let mut heap = HeapFile::open(heap_tmp.path(), OpenMode::Write).unwrap();
        let mut index = BTreeIndex::open(idx_tmp.path(), OpenMode::Write).unwrap();
        for i in 0..20 {
            let rid = heap.append(i, &format!("v{i}")).unwrap();
            index.insert(i, rid).unwrap();
        }

        let preds = vec![Predicate::key(Comparator::Le, 5)];
        let refs: Vec<&Predicate> = preds.iter().collect();
        let mut scan = IndexScanExecutor::new(&index, &heap, None, refs, Vec::new());
        let results = super::super::collect_all(&mut scan).unwrap();
        assert_eq!(results.len(), 6);
        assert_eq!(results.last().unwrap().key, 5);
    }

    #[test]
    fn ne_predicate_skips_without_stopping_the_scan() {
        let (heap_tmp, idx_tmp) = setup();
        let mut heap = HeapFile::open(heap_tmp.path(), OpenMode::Write).unwrap();
        let mut index = BTreeIndex::open(idx_tmp.path(), OpenMode::Write).unwrap();
        for i in 0..10 {
            let rid = heap.append(i, &format!("v{i}")).unwrap();
            index.insert(i, rid).unwrap();
        }

        let preds = vec![Predicate::key(Comparator::Ne, 4)];
        let refs: Vec<&Predicate> = preds.iter().collect();
        let mut scan = IndexScanExecutor::new(&index, &heap, None, refs, Vec::new());
        let results = super::super::collect_all(&mut scan).unwrap();
        assert_eq!(results.len(), 9);
        assert!(results.iter().all(|r| r.key != 4));
    }
}
