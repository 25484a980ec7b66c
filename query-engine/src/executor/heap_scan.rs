//! Full heap scan: the fallback plan when no key-column predicate can
//! drive an index seek, or when the table has no index open at all.

use super::Executor;
use crate::predicate::Predicate;
use crate::QueryResult;
use storage_engine::{HeapFile, Record};

pub struct HeapScanExecutor<'a> {
    heap: &'a HeapFile,
    predicates: &'a [Predicate],
    rows: std::vec::IntoIter<Record>,
}

impl<'a> HeapScanExecutor<'a> {
    pub fn new(heap: &'a HeapFile, predicates: &'a [Predicate]) -> Self {
        Self {
            heap,
            predicates,
            rows: Vec::new().into_iter(),
        }
    }
}

impl<'a> Executor for HeapScanExecutor<'a> {
    fn init(&mut self) -> QueryResult<()> {
        let records: Vec<Record> = self
            .heap
            .scan()?
            .into_iter()
            .map(|(_rid, record)| record)
            .collect();
        self.rows = records.into_iter();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Record>> {
        for record in self.rows.by_ref() {
            if self.predicates.iter().all(|p| p.matches(&record)) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}
