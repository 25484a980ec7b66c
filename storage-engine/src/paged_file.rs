//! Fixed-size page store backed by a single `std::fs::File`.
//!
//! No buffering layer and no page cache sit above this file — that caching
//! layer is an explicit non-goal of this engine. Every `read`/`write` is a
//! positioned I/O call straight through to the OS.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Page size assumed throughout the on-disk format.
pub const PAGE_SIZE: usize = 1024;

/// Whether a paged file is being opened for reading an existing file or for
/// writing (which creates the file if it is absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// A fixed-size page store addressed by non-negative page identifiers.
#[derive(Debug)]
pub struct PagedFile {
    file: File,
}

impl PagedFile {
    /// Opens the paged file backing `path`. `OpenMode::Write` creates the
    /// file if it does not already exist; `OpenMode::Read` requires it to
    /// exist and surfaces a `TableNotFound`-flavored I/O error otherwise.
    pub fn open(path: &Path, mode: OpenMode) -> EngineResult<Self> {
        let file = match mode {
            OpenMode::Write => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?,
            OpenMode::Read => OpenOptions::new().read(true).write(true).open(path).map_err(
                |e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        EngineError::TableNotFound(path.to_path_buf())
                    } else {
                        EngineError::Io(e)
                    }
                },
            )?,
        };
        Ok(Self { file })
    }

    /// One past the highest page id ever written; the allocator for new pages.
    pub fn end_pid(&self) -> EngineResult<i32> {
        let len = self.file.metadata()?.len();
        Ok((len / PAGE_SIZE as u64) as i32)
    }

    /// Reads the page at `pid` into `buf`, which must be exactly `PAGE_SIZE` bytes.
    pub fn read(&self, pid: i32, buf: &mut [u8; PAGE_SIZE]) -> EngineResult<()> {
        let offset = pid as u64 * PAGE_SIZE as u64;
        self.file.read_exact_at(buf, offset)?;
        Ok(())
    }

    /// Writes `buf` to the page at `pid`, allocating the page if it is past
    /// the current end of file.
    pub fn write(&self, pid: i32, buf: &[u8; PAGE_SIZE]) -> EngineResult<()> {
        let offset = pid as u64 * PAGE_SIZE as u64;
        self.file.write_all_at(buf, offset)?;
        Ok(())
    }

    /// Flushes and closes the underlying file handle.
    pub fn close(self) -> EngineResult<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
