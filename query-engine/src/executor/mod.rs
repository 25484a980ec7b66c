//! Execution in the classic Volcano style: each executor is pull-based,
//! and a parent calls `next()` on a child to retrieve rows one at a time.
//!
//! This engine only ever has one stage — either an index scan or a heap
//! scan — so there is no operator tree to assemble, but the same
//! `init`/`next` shape is kept for consistency with the wider corpus.

pub mod heap_scan;
pub mod index_scan;

pub use heap_scan::HeapScanExecutor;
pub use index_scan::IndexScanExecutor;

use crate::QueryResult;
use storage_engine::Record;

/// The core executor trait. `init` positions the scan; `next` pulls one
/// matching record at a time and returns `None` once exhausted.
pub trait Executor {
    fn init(&mut self) -> QueryResult<()>;
    fn next(&mut self) -> QueryResult<Option<Record>>;
}

#[cfg(test)]
pub(crate) fn collect_all(executor: &mut dyn Executor) -> QueryResult<Vec<Record>> {
    let mut out = Vec::new();
    executor.init()?;
    while let Some(record) = executor.next()? {
        out.push(record);
    }
    Ok(out)
}
