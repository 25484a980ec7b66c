//! Paged storage, heap-organized tables, and a B+Tree secondary index.
//!
//! This crate owns everything below the query planner: the page-addressed
//! file abstraction (`paged_file`), the append-only record heap (`heap`),
//! the index itself (`index`), and the bulk-load line parser (`load`).

pub mod error;
pub mod heap;
pub mod index;
pub mod load;
pub mod paged_file;

pub use error::{EngineError, EngineResult};
pub use heap::{HeapFile, Record, RecordId};
pub use index::{BTreeIndex, Cursor, ReadForwardOutcome};
pub use paged_file::{OpenMode, PagedFile, PAGE_SIZE};
