//! The on-disk B+Tree itself: descent, insertion with upward split
//! propagation, and the cursor-based lookup/scan API the planner drives.
//!
//! Page 0 is reserved for tree metadata (`root_pid`, `tree_height`); real
//! nodes start at page 1. `tree_height` counts the nodes on any root-to-leaf
//! path, so a tree with only a leaf root has height 1; descending from the
//! root to the leaf crosses `tree_height - 1` non-leaf nodes.

use crate::error::{EngineError, EngineResult};
use crate::heap::RecordId;
use crate::index::node::{InsertOutcome, LeafNode, NonLeafNode};
use crate::paged_file::{OpenMode, PagedFile, PAGE_SIZE};
use std::path::Path;

use tracing::{debug, trace};

const METADATA_PID: i32 = 0;
const ROOT_PID_OFFSET: usize = 0;
const TREE_HEIGHT_OFFSET: usize = 4;

/// A position inside the tree: the leaf page holding the entry, and the
/// entry's slot within that leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub pid: i32,
    pub eid: i32,
}

/// The result of advancing a cursor by one entry.
pub enum ReadForwardOutcome {
    /// The entry the cursor now points at.
    Entry { key: i32, rid: RecordId },
    /// The cursor crossed into the next leaf; call again to read an entry.
    Advanced,
}

/// A disk-backed B+Tree index mapping `i32` keys to `RecordId`s.
pub struct BTreeIndex {
    file: PagedFile,
    root_pid: i32,
    tree_height: i32,
}

impl BTreeIndex {
    /// Opens an existing index file, or creates one with a single empty leaf
    /// as its root when `mode` is `OpenMode::Write` and the file is new.
    pub fn open(path: &Path, mode: OpenMode) -> EngineResult<Self> {
        let file = PagedFile::open(path, mode)?;
        let end_pid = file.end_pid()?;

        if end_pid == 0 {
            let mut buf = [0u8; PAGE_SIZE];
            buf[ROOT_PID_OFFSET..ROOT_PID_OFFSET + 4].copy_from_slice(&1i32.to_le_bytes());
            buf[TREE_HEIGHT_OFFSET..TREE_HEIGHT_OFFSET + 4].copy_from_slice(&1i32.to_le_bytes());
            file.write(METADATA_PID, &buf)?;

            let leaf = LeafNode::new();
            leaf.write(&file, 1)?;

            debug!("initialized new index with empty leaf root at pid 1");
            return Ok(Self {
                file,
                root_pid: 1,
                tree_height: 1,
            });
        }

        let mut meta = [0u8; PAGE_SIZE];
        file.read(METADATA_PID, &mut meta)?;
        let root_pid = i32::from_le_bytes(meta[ROOT_PID_OFFSET..ROOT_PID_OFFSET + 4].try_into().unwrap());
        let tree_height =
            i32::from_le_bytes(meta[TREE_HEIGHT_OFFSET..TREE_HEIGHT_OFFSET + 4].try_into().unwrap());

        Ok(Self {
            file,
            root_pid,
            tree_height,
        })
    }

    /// Persists metadata and flushes the underlying file.
    pub fn close(self) -> EngineResult<()> {
        self.write_metadata()?;
        self.file.close()
    }

    fn write_metadata(&self) -> EngineResult<()> {
        let mut buf = [0u8; PAGE_SIZE];
        buf[ROOT_PID_OFFSET..ROOT_PID_OFFSET + 4].copy_from_slice(&self.root_pid.to_le_bytes());
        buf[TREE_HEIGHT_OFFSET..TREE_HEIGHT_OFFSET + 4]
            .copy_from_slice(&self.tree_height.to_le_bytes());
        self.file.write(METADATA_PID, &buf)
    }

    pub fn root_pid(&self) -> i32 {
        self.root_pid
    }

    pub fn tree_height(&self) -> i32 {
        self.tree_height
    }

    fn alloc_pid(&self) -> EngineResult<i32> {
        self.file.end_pid()
    }

    /// Inserts `(key, rid)`, splitting nodes bottom-up as needed and growing
    /// the tree's height when a split propagates past the root.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> EngineResult<()> {
        let mut path: Vec<i32> = Vec::new();
        let mut pid = self.root_pid;
        for _ in 0..self.tree_height - 1 {
            path.push(pid);
            let node = NonLeafNode::read(&self.file, pid)?;
            pid = node.locate_child_ptr(key);
        }

        let mut leaf = LeafNode::read(&self.file, pid)?;
        let mut outcome = match leaf.insert(key, rid) {
            Ok(()) => {
                leaf.write(&self.file, pid)?;
                InsertOutcome::Inserted
            }
            Err(EngineError::NodeFull) => {
                let sibling_pid = self.alloc_pid()?;
                let mut sibling = LeafNode::new();
                let promoted_key = leaf.insert_and_split(key, rid, &mut sibling);
                sibling.set_next_leaf_pid(leaf.next_leaf_pid());
                leaf.set_next_leaf_pid(sibling_pid);
                leaf.write(&self.file, pid)?;
                sibling.write(&self.file, sibling_pid)?;
                trace!(pid, sibling_pid, promoted_key, "leaf split");
                InsertOutcome::Split {
                    promoted_key,
                    sibling_pid,
                }
            }
            Err(e) => return Err(e),
        };

        while let InsertOutcome::Split {
            promoted_key,
            sibling_pid,
        } = outcome
        {
            match path.pop() {
                Some(parent_pid) => {
                    let mut parent = NonLeafNode::read(&self.file, parent_pid)?;
                    outcome = match parent.insert(promoted_key, sibling_pid) {
                        Ok(()) => {
                            parent.write(&self.file, parent_pid)?;
                            InsertOutcome::Inserted
                        }
                        Err(EngineError::NodeFull) => {
                            let new_sibling_pid = self.alloc_pid()?;
                            let mut new_sibling = NonLeafNode::new();
                            let new_promoted =
                                parent.insert_and_split(promoted_key, sibling_pid, &mut new_sibling);
                            parent.write(&self.file, parent_pid)?;
                            new_sibling.write(&self.file, new_sibling_pid)?;
                            trace!(parent_pid, new_sibling_pid, new_promoted, "non-leaf split");
                            InsertOutcome::Split {
                                promoted_key: new_promoted,
                                sibling_pid: new_sibling_pid,
                            }
                        }
                        Err(e) => return Err(e),
                    };
                }
                None => {
                    let new_root_pid = self.alloc_pid()?;
                    let mut new_root = NonLeafNode::new();
                    new_root.initialize_root(self.root_pid, promoted_key, sibling_pid);
                    new_root.write(&self.file, new_root_pid)?;
                    self.root_pid = new_root_pid;
                    self.tree_height += 1;
                    debug!(new_root_pid, height = self.tree_height, "root grew");
                    outcome = InsertOutcome::Inserted;
                }
            }
        }

        Ok(())
    }

    /// Descends to the leaf that would hold `search_key` and returns a
    /// cursor to the first entry `>= search_key`, plus whether that entry's
    /// key equals `search_key` exactly.
    pub fn locate(&self, search_key: i32) -> EngineResult<(Cursor, bool)> {
        let mut pid = self.root_pid;
        for _ in 0..self.tree_height - 1 {
            let node = NonLeafNode::read(&self.file, pid)?;
            pid = node.locate_child_ptr(search_key);
        }
        let leaf = LeafNode::read(&self.file, pid)?;
        let (eid, found) = leaf.locate(search_key);
        Ok((
            Cursor {
                pid,
                eid: eid as i32,
            },
            found,
        ))
    }

    /// Advances `cursor` by one entry and reports what it now points at.
    /// Returns `Err(EndOfTree)` once the leaf chain is exhausted.
    pub fn read_forward(&self, cursor: &mut Cursor) -> EngineResult<ReadForwardOutcome> {
        let leaf = LeafNode::read(&self.file, cursor.pid)?;
        if cursor.eid < leaf.key_count() {
            let (key, rid) = leaf.read_entry(cursor.eid as usize)?;
            cursor.eid += 1;
            return Ok(ReadForwardOutcome::Entry { key, rid });
        }

        let next_pid = leaf.next_leaf_pid();
        if next_pid < 0 {
            return Err(EngineError::EndOfTree);
        }
        cursor.pid = next_pid;
        cursor.eid = 0;
        Ok(ReadForwardOutcome::Advanced)
    }

    /// Reads every `(key, rid)` entry in ascending key order. Intended for
    /// tests and small diagnostic dumps, not for planner use.
    pub fn scan_all(&self) -> EngineResult<Vec<(i32, RecordId)>> {
        let mut pid = self.root_pid;
        for _ in 0..self.tree_height - 1 {
            let node = NonLeafNode::read(&self.file, pid)?;
            pid = node.leftmost_child();
        }
        let mut cursor = Cursor { pid, eid: 0 };
        let mut out = Vec::new();
        loop {
            match self.read_forward(&mut cursor) {
                Ok(ReadForwardOutcome::Entry { key, rid }) => out.push((key, rid)),
                Ok(ReadForwardOutcome::Advanced) => continue,
                Err(EngineError::EndOfTree) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::node::MAX_LEAF_COUNT;
    use tempfile::NamedTempFile;

    fn rid(pid: i32, sid: i32) -> RecordId {
        RecordId { pid, sid }
    }

    #[test]
    fn fresh_index_is_an_empty_leaf_root() {
        let tmp = NamedTempFile::new().unwrap();
        let tree = BTreeIndex::open(tmp.path(), OpenMode::Write).unwrap();
        assert_eq!(tree.tree_height(), 1);
        assert_eq!(tree.scan_all().unwrap(), vec![]);
    }

    #[test]
    fn insert_then_locate_finds_exact_key() {
        let tmp = NamedTempFile::new().unwrap();
        let mut tree = BTreeIndex::open(tmp.path(), OpenMode::Write).unwrap();
        tree.insert(5, rid(0, 0)).unwrap();
        tree.insert(3, rid(0, 1)).unwrap();
        tree.insert(9, rid(0, 2)).unwrap();

        let (cursor, found) = tree.locate(5).unwrap();
        assert!(found);
        let mut cursor = cursor;
        match tree.read_forward(&mut cursor).unwrap() {
            ReadForwardOutcome::Entry { key, rid: r } => {
                assert_eq!(key, 5);
                assert_eq!(r, rid(0, 0));
            }
            ReadForwardOutcome::Advanced => panic!("expected an entry"),
        }
    }

    #[test]
    fn locate_of_absent_key_points_at_next_greater() {
        let tmp = NamedTempFile::new().unwrap();
        let mut tree = BTreeIndex::open(tmp.path(), OpenMode::Write).unwrap();
        tree.insert(10, rid(0, 0)).unwrap();
        tree.insert(30, rid(0, 1)).unwrap();

        let (mut cursor, found) = tree.locate(20).unwrap();
        assert!(!found);
        match tree.read_forward(&mut cursor).unwrap() {
            ReadForwardOutcome::Entry { key, .. } => assert_eq!(key, 30),
            ReadForwardOutcome::Advanced => panic!("expected an entry"),
        }
    }

    #[test]
    fn ascending_bulk_insert_grows_height_and_stays_sorted() {
        let tmp = NamedTempFile::new().unwrap();
        let mut tree = BTreeIndex::open(tmp.path(), OpenMode::Write).unwrap();
        let total = MAX_LEAF_COUNT + 1;
        for i in 0..total as i32 {
            tree.insert(i, rid(0, i)).unwrap();
        }

        assert_eq!(tree.tree_height(), 2);
        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), total);
        for (i, (key, _)) in all.iter().enumerate() {
            assert_eq!(*key, i as i32);
        }

        // Exactly two leaves, and the new root's single promotion key is the
        // first key of the right leaf.
        let root = NonLeafNode::read(&tree.file, tree.root_pid()).unwrap();
        assert_eq!(root.key_count(), 1);
        let (promoted_key, right_pid) = root.read_entry(0).unwrap();
        let right_leaf = LeafNode::read(&tree.file, right_pid).unwrap();
        assert_eq!(promoted_key, right_leaf.read_entry(0).unwrap().0);
        let left_leaf = LeafNode::read(&tree.file, root.leftmost_child()).unwrap();
        assert_eq!(left_leaf.next_leaf_pid(), right_pid);
        assert_eq!(right_leaf.next_leaf_pid(), -1);
    }

    #[test]
    fn large_ascending_insert_keeps_scan_sorted_across_many_splits() {
        let tmp = NamedTempFile::new().unwrap();
        let mut tree = BTreeIndex::open(tmp.path(), OpenMode::Write).unwrap();
        let total = (MAX_LEAF_COUNT as i32) * 20;
        for i in 0..total {
            tree.insert(i, rid(0, i)).unwrap();
        }
        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), total as usize);
        assert!(all.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(tree.tree_height() >= 1);
    }

    #[test]
    fn close_then_reopen_preserves_contents() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let mut tree = BTreeIndex::open(tmp.path(), OpenMode::Write).unwrap();
            for i in 0..200 {
                tree.insert(i, rid(0, i)).unwrap();
            }
            tree.close().unwrap();
        }
        let tree = BTreeIndex::open(tmp.path(), OpenMode::Read).unwrap();
        let all = tree.scan_all().unwrap();
        assert_eq!(all.len(), 200);
        assert_eq!(all[0].0, 0);
        assert_eq!(all[199].0, 199);
    }
}
