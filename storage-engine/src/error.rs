//! Error taxonomy for the storage engine.
//!
//! Node-level conditions (`NodeFull`, `NoSuchRecord`) are expected control flow
//! and are handled inside the tree; they never escape `BTreeIndex`. Tree-level
//! (`EndOfTree`) and format-level (`InvalidFileFormat`) errors surface to the
//! planner, which uses them to terminate loops. I/O errors are fatal and
//! propagate unchanged.

use std::path::PathBuf;

/// The result type used throughout this crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The node has no room for another entry; the caller must split.
    #[error("node is full")]
    NodeFull,

    /// No entry in the node (or tree) matches the requested key.
    #[error("no matching record")]
    NoSuchRecord,

    /// A forward scan ran off the end of the leaf chain.
    #[error("end of tree")]
    EndOfTree,

    /// A bulk-load line could not be parsed.
    #[error("invalid load line (key={key}): {line:?}")]
    InvalidFileFormat { key: i32, line: String },

    /// The named table file does not exist.
    #[error("table {0} does not exist")]
    TableNotFound(PathBuf),

    /// Any other I/O failure against a paged or heap file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
