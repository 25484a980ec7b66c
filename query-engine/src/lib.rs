//! Selection planning and execution over a heap table and its optional
//! B+Tree index on the key column.
//!
//! A table is a pair of files: `<name>.tbl` (the heap, always present) and
//! `<name>.idx` (the index, optional). The planner inspects the predicate
//! list against whichever index is open and picks a plan; the executor
//! pulls tuples one at a time in the classic Volcano style.

pub mod executor;
pub mod planner;
pub mod predicate;
pub mod table;

pub use executor::{Executor, HeapScanExecutor, IndexScanExecutor};
pub use planner::{Plan, Planner};
pub use predicate::{Attr, Comparator, Predicate, Projection};
pub use table::Table;

use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] storage_engine::EngineError),
}
