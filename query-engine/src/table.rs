//! Ties a heap file and its optional key-column index together under one
//! name, and exposes the planner/executor pair as a single `select` call.
//!
//! Table files live side by side as `<name>.tbl` (the heap, always present)
//! and `<name>.idx` (the index, present only if one was built).

use crate::executor::{Executor, HeapScanExecutor, IndexScanExecutor};
use crate::planner::{Plan, Planner};
use crate::predicate::{split, Predicate, Projection};
use crate::QueryResult;
use std::io::Read;
use std::path::{Path, PathBuf};
use storage_engine::{load, BTreeIndex, HeapFile, OpenMode, Record};
use tracing::info;

pub struct Table {
    heap: HeapFile,
    index: Option<BTreeIndex>,
}

impl Table {
    /// Heap-file path for `name` under `dir`.
    pub fn heap_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.tbl"))
    }

    /// Index-file path for `name` under `dir`.
    pub fn index_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.idx"))
    }

    /// Opens `name`'s heap file, plus its index if `<name>.idx` exists.
    pub fn open(dir: &Path, name: &str, mode: OpenMode) -> QueryResult<Self> {
        let heap = HeapFile::open(&Self::heap_path(dir, name), mode)?;
        let index_path = Self::index_path(dir, name);
        let index = if index_path.exists() {
            Some(BTreeIndex::open(&index_path, mode)?)
        } else {
            None
        };
        Ok(Self { heap, index })
    }

    /// Builds a fresh index on the key column from the heap's current
    /// contents, creating `<name>.idx` if it does not already exist.
    pub fn create_index(&mut self, dir: &Path, name: &str) -> QueryResult<()> {
        let mut index = BTreeIndex::open(&Self::index_path(dir, name), OpenMode::Write)?;
        for (rid, record) in self.heap.scan()? {
            index.insert(record.key, rid)?;
        }
        self.index = Some(index);
        Ok(())
    }

    pub fn heap(&self) -> &HeapFile {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut HeapFile {
        &mut self.heap
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn index_mut(&mut self) -> Option<&mut BTreeIndex> {
        self.index.as_mut()
    }

    /// Opens (creating if needed) `<name>.idx` so a subsequent `bulk_load`
    /// inserts into it incrementally, rather than backfilling it from a
    /// completed heap scan afterward.
    pub fn open_index(&mut self, dir: &Path, name: &str) -> QueryResult<()> {
        if self.index.is_none() {
            self.index = Some(BTreeIndex::open(&Self::index_path(dir, name), OpenMode::Write)?);
        }
        Ok(())
    }

    /// Bulk-loads `key, value` lines from `reader` into the heap, inserting
    /// into the index too if one is open. A malformed line aborts the load;
    /// everything read before it stays in place in both files.
    pub fn bulk_load<R: Read>(&mut self, reader: R) -> QueryResult<usize> {
        let n = load::bulk_load(&mut self.heap, self.index.as_mut(), reader)?;
        Ok(n)
    }

    /// Plans and runs a selection query, returning every matching record.
    /// Projection is applied by the caller; this always returns full
    /// `(key, value)` records, reading the heap as needed.
    pub fn select(&self, predicates: &[Predicate]) -> QueryResult<Vec<Record>> {
        let plan = Planner::plan(predicates, self.index.is_some(), Projection::Star);
        info!(?plan, "executing selection");

        let mut out = Vec::new();
        match plan {
            Plan::HeapScan => {
                let mut exec = HeapScanExecutor::new(&self.heap, predicates);
                exec.init()?;
                while let Some(record) = exec.next()? {
                    out.push(record);
                }
            }
            Plan::IndexScan { seek_key } => {
                let index = self.index.as_ref().expect("planner only chooses IndexScan when an index is open");
                let parts = split(predicates);
                let mut exec = IndexScanExecutor::new(
                    index,
                    &self.heap,
                    seek_key,
                    parts.key_clauses,
                    parts.value_clauses,
                );
                exec.init()?;
                while let Some(record) = exec.next()? {
                    out.push(record);
                }
            }
        }
        Ok(out)
    }

    /// Counts matching records. When an index is open and no value-column
    /// predicate needs checking, the heap is never read — the index scan
    /// alone proves (and counts) every match.
    pub fn count(&self, predicates: &[Predicate]) -> QueryResult<usize> {
        let plan = Planner::plan(predicates, self.index.is_some(), Projection::CountStar);
        info!(?plan, "executing count(*)");

        match plan {
            Plan::HeapScan => {
                let mut exec = HeapScanExecutor::new(&self.heap, predicates);
                exec.init()?;
                let mut n = 0usize;
                while exec.next()?.is_some() {
                    n += 1;
                }
                Ok(n)
            }
            Plan::IndexScan { seek_key } => {
                let index = self.index.as_ref().expect("planner only chooses IndexScan when an index is open");
                let parts = split(predicates);
                let needs_heap = !parts.value_clauses.is_empty();
                let mut exec = IndexScanExecutor::with_heap_access(
                    index,
                    &self.heap,
                    seek_key,
                    parts.key_clauses,
                    parts.value_clauses,
                    needs_heap,
                );
                exec.init()?;
                let mut n = 0usize;
                while exec.next()?.is_some() {
                    n += 1;
                }
                Ok(n)
            }
        }
    }

    pub fn close(self) -> QueryResult<()> {
        if let Some(index) = self.index {
            index.close()?;
        }
        self.heap.close()?;
        Ok(())
    }
}
