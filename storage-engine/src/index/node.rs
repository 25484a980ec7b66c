//! B+Tree node layouts: leaf and non-leaf page views.
//!
//! Leaf layout (offsets in bytes, `P` = [`PAGE_SIZE`]):
//! - `[0, n * 12)`      — sorted `(key: i32, rid: RecordId)` entries.
//! - `[P-8, P-4)`       — key count `n` (i32).
//! - `[P-4, P)`         — next leaf pid (i32, -1 means no successor).
//!
//! Non-leaf layout:
//! - `[0, 4)`           — leftmost child pid.
//! - `[4, 4 + n * 8)`   — sorted `(key: i32, child pid: i32)` entries.
//! - `[P-4, P)`         — key count `n` (i32).
//!
//! Node kind is never stored in the page itself — a descending `BTreeIndex`
//! operation always knows, from the current level against `tree_height`,
//! whether the page at hand is a leaf or a non-leaf, so there is no spare
//! byte spent recording it.

use crate::error::{EngineError, EngineResult};
use crate::heap::RecordId;
use crate::paged_file::{PagedFile, PAGE_SIZE};

const LEAF_ENTRY_SIZE: usize = 12; // key (4) + RecordId (4 + 4)
const NONLEAF_ENTRY_SIZE: usize = 8; // key (4) + child pid (4)

/// Maximum number of `(key, rid)` entries a leaf page can hold.
pub const MAX_LEAF_COUNT: usize = (PAGE_SIZE - 8) / LEAF_ENTRY_SIZE;
/// Maximum number of `(key, child)` entries a non-leaf page can hold.
pub const MAX_NONLEAF_COUNT: usize = (PAGE_SIZE - 4 - 4) / NONLEAF_ENTRY_SIZE;

const LEAF_COUNT_OFFSET: usize = PAGE_SIZE - 8;
const LEAF_NEXT_OFFSET: usize = PAGE_SIZE - 4;
const NONLEAF_LEFTMOST_OFFSET: usize = 0;
const NONLEAF_ENTRIES_OFFSET: usize = 4;
const NONLEAF_COUNT_OFFSET: usize = PAGE_SIZE - 4;

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn write_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// A leaf page: `(key, rid)` entries plus a forward link to the next leaf.
pub struct LeafNode {
    buf: [u8; PAGE_SIZE],
}

impl LeafNode {
    /// A fresh, empty leaf: zeroed buffer, key count 0, next pid -1.
    pub fn new() -> Self {
        let mut buf = [0u8; PAGE_SIZE];
        write_i32(&mut buf, LEAF_COUNT_OFFSET, 0);
        write_i32(&mut buf, LEAF_NEXT_OFFSET, -1);
        Self { buf }
    }

    pub fn read(pf: &PagedFile, pid: i32) -> EngineResult<Self> {
        let mut buf = [0u8; PAGE_SIZE];
        pf.read(pid, &mut buf)?;
        Ok(Self { buf })
    }

    pub fn write(&self, pf: &PagedFile, pid: i32) -> EngineResult<()> {
        pf.write(pid, &self.buf)
    }

    pub fn key_count(&self) -> i32 {
        read_i32(&self.buf, LEAF_COUNT_OFFSET)
    }

    fn set_key_count(&mut self, n: i32) {
        write_i32(&mut self.buf, LEAF_COUNT_OFFSET, n);
    }

    pub fn next_leaf_pid(&self) -> i32 {
        read_i32(&self.buf, LEAF_NEXT_OFFSET)
    }

    pub fn set_next_leaf_pid(&mut self, pid: i32) {
        write_i32(&mut self.buf, LEAF_NEXT_OFFSET, pid);
    }

    pub fn is_full(&self) -> bool {
        self.key_count() as usize >= MAX_LEAF_COUNT
    }

    fn entry_offset(eid: usize) -> usize {
        eid * LEAF_ENTRY_SIZE
    }

    fn set_entry(&mut self, eid: usize, key: i32, rid: RecordId) {
        let off = Self::entry_offset(eid);
        write_i32(&mut self.buf, off, key);
        write_i32(&mut self.buf, off + 4, rid.pid);
        write_i32(&mut self.buf, off + 8, rid.sid);
    }

    /// Reads the entry at `eid`. Fails with `NoSuchRecord` if out of range.
    pub fn read_entry(&self, eid: usize) -> EngineResult<(i32, RecordId)> {
        if eid >= self.key_count() as usize {
            return Err(EngineError::NoSuchRecord);
        }
        let off = Self::entry_offset(eid);
        let key = read_i32(&self.buf, off);
        let rid = RecordId {
            pid: read_i32(&self.buf, off + 4),
            sid: read_i32(&self.buf, off + 8),
        };
        Ok((key, rid))
    }

    /// Returns the position of the first entry `>= search_key`, and whether
    /// that entry's key equals `search_key` exactly.
    pub fn locate(&self, search_key: i32) -> (usize, bool) {
        let n = self.key_count() as usize;
        for i in 0..n {
            let (k, _) = self.read_entry(i).expect("i < key_count");
            if k >= search_key {
                return (i, k == search_key);
            }
        }
        (n, false)
    }

    /// Shifts entries `[from, n)` one slot to the right to make room at `from`.
    fn shift_right(&mut self, from: usize, n: usize) {
        if from >= n {
            return;
        }
        let src = Self::entry_offset(from);
        let dst = Self::entry_offset(from + 1);
        let len = (n - from) * LEAF_ENTRY_SIZE;
        self.buf.copy_within(src..src + len, dst);
    }

    /// Inserts `(key, rid)` in sorted position. Duplicates are placed before
    /// existing equal keys (stable append-before-equals).
    pub fn insert(&mut self, key: i32, rid: RecordId) -> EngineResult<()> {
        let n = self.key_count() as usize;
        if n >= MAX_LEAF_COUNT {
            return Err(EngineError::NodeFull);
        }
        let (eid, _found) = self.locate(key);
        self.shift_right(eid, n);
        self.set_entry(eid, key, rid);
        self.set_key_count((n + 1) as i32);
        Ok(())
    }

    /// Splits a full node and inserts `(key, rid)` into whichever half it
    /// belongs. Returns the first key of the (now populated) `sibling`.
    ///
    /// `sibling` must be an empty, freshly constructed leaf.
    pub fn insert_and_split(&mut self, key: i32, rid: RecordId, sibling: &mut LeafNode) -> i32 {
        let n = self.key_count() as usize;
        debug_assert_eq!(n, MAX_LEAF_COUNT, "insert_and_split requires a full node");

        let (eid, _found) = self.locate(key);
        let mut all = Vec::with_capacity(n + 1);
        for i in 0..eid {
            all.push(self.read_entry(i).expect("i < n"));
        }
        all.push((key, rid));
        for i in eid..n {
            all.push(self.read_entry(i).expect("i < n"));
        }

        let left_count = (all.len() + 1) / 2; // ceil((n+1)/2)

        self.set_key_count(0);
        for (i, (k, r)) in all[..left_count].iter().enumerate() {
            self.set_entry(i, *k, *r);
        }
        self.set_key_count(left_count as i32);

        for (i, (k, r)) in all[left_count..].iter().enumerate() {
            sibling.set_entry(i, *k, *r);
        }
        sibling.set_key_count((all.len() - left_count) as i32);

        sibling.read_entry(0).expect("sibling got at least one entry").0
    }
}

impl Default for LeafNode {
    fn default() -> Self {
        Self::new()
    }
}

/// A non-leaf (internal) page: a leftmost child pointer plus sorted
/// `(key, child pid)` entries routing searches to the covering child.
pub struct NonLeafNode {
    buf: [u8; PAGE_SIZE],
}

impl NonLeafNode {
    pub fn new() -> Self {
        let mut buf = [0u8; PAGE_SIZE];
        write_i32(&mut buf, NONLEAF_COUNT_OFFSET, 0);
        Self { buf }
    }

    pub fn read(pf: &PagedFile, pid: i32) -> EngineResult<Self> {
        let mut buf = [0u8; PAGE_SIZE];
        pf.read(pid, &mut buf)?;
        Ok(Self { buf })
    }

    pub fn write(&self, pf: &PagedFile, pid: i32) -> EngineResult<()> {
        pf.write(pid, &self.buf)
    }

    pub fn key_count(&self) -> i32 {
        read_i32(&self.buf, NONLEAF_COUNT_OFFSET)
    }

    fn set_key_count(&mut self, n: i32) {
        write_i32(&mut self.buf, NONLEAF_COUNT_OFFSET, n);
    }

    pub fn leftmost_child(&self) -> i32 {
        read_i32(&self.buf, NONLEAF_LEFTMOST_OFFSET)
    }

    pub fn set_leftmost_child(&mut self, pid: i32) {
        write_i32(&mut self.buf, NONLEAF_LEFTMOST_OFFSET, pid);
    }

    pub fn is_full(&self) -> bool {
        self.key_count() as usize >= MAX_NONLEAF_COUNT
    }

    fn entry_offset(eid: usize) -> usize {
        NONLEAF_ENTRIES_OFFSET + eid * NONLEAF_ENTRY_SIZE
    }

    fn set_entry(&mut self, eid: usize, key: i32, child_pid: i32) {
        let off = Self::entry_offset(eid);
        write_i32(&mut self.buf, off, key);
        write_i32(&mut self.buf, off + 4, child_pid);
    }

    /// Reads the entry at `eid`. Fails with `NoSuchRecord` if out of range.
    pub fn read_entry(&self, eid: usize) -> EngineResult<(i32, i32)> {
        if eid >= self.key_count() as usize {
            return Err(EngineError::NoSuchRecord);
        }
        let off = Self::entry_offset(eid);
        Ok((read_i32(&self.buf, off), read_i32(&self.buf, off + 4)))
    }

    /// Returns the pid of the child covering `search_key`, per the B+Tree
    /// routing invariant: `entry[i].key <= search_key < entry[i+1].key`.
    pub fn locate_child_ptr(&self, search_key: i32) -> i32 {
        let n = self.key_count() as usize;
        if n == 0 {
            return self.leftmost_child();
        }
        let (first_key, _) = self.read_entry(0).expect("n > 0");
        if search_key < first_key {
            return self.leftmost_child();
        }
        let mut result = self.leftmost_child();
        for i in 0..n {
            let (k, pid) = self.read_entry(i).expect("i < n");
            if k <= search_key {
                result = pid;
            } else {
                break;
            }
        }
        result
    }

    fn shift_right(&mut self, from: usize, n: usize) {
        if from >= n {
            return;
        }
        let src = Self::entry_offset(from);
        let dst = Self::entry_offset(from + 1);
        let len = (n - from) * NONLEAF_ENTRY_SIZE;
        self.buf.copy_within(src..src + len, dst);
    }

    /// Inserts `(key, child_pid)` in sorted order.
    pub fn insert(&mut self, key: i32, child_pid: i32) -> EngineResult<()> {
        let n = self.key_count() as usize;
        if n >= MAX_NONLEAF_COUNT {
            return Err(EngineError::NodeFull);
        }
        let mut idx = n;
        for i in 0..n {
            let (k, _) = self.read_entry(i).expect("i < n");
            if key < k {
                idx = i;
                break;
            }
        }
        self.shift_right(idx, n);
        self.set_entry(idx, key, child_pid);
        self.set_key_count((n + 1) as i32);
        Ok(())
    }

    /// Splits a full node and inserts `(key, child_pid)`. Returns the median
    /// key, which is promoted to the parent and stored in neither child.
    ///
    /// `sibling` must be an empty, freshly constructed non-leaf.
    pub fn insert_and_split(
        &mut self,
        key: i32,
        child_pid: i32,
        sibling: &mut NonLeafNode,
    ) -> i32 {
        let n = self.key_count() as usize;
        debug_assert_eq!(n, MAX_NONLEAF_COUNT, "insert_and_split requires a full node");

        let mut all = Vec::with_capacity(n + 1);
        let mut inserted = false;
        for i in 0..n {
            let (k, p) = self.read_entry(i).expect("i < n");
            if !inserted && key < k {
                all.push((key, child_pid));
                inserted = true;
            }
            all.push((k, p));
        }
        if !inserted {
            all.push((key, child_pid));
        }

        let total = all.len(); // n + 1
        let mid = total / 2;
        let (mid_key, mid_child) = all[mid];

        self.set_key_count(0);
        for (i, (k, p)) in all[..mid].iter().enumerate() {
            self.set_entry(i, *k, *p);
        }
        self.set_key_count(mid as i32);

        sibling.set_leftmost_child(mid_child);
        for (i, (k, p)) in all[mid + 1..].iter().enumerate() {
            sibling.set_entry(i, *k, *p);
        }
        sibling.set_key_count((total - mid - 1) as i32);

        mid_key
    }

    /// Lays out the first two-level root (or a re-root after a root split):
    /// leftmost child `left_pid`, a single entry `(key, right_pid)`.
    pub fn initialize_root(&mut self, left_pid: i32, key: i32, right_pid: i32) {
        self.set_leftmost_child(left_pid);
        self.set_entry(0, key, right_pid);
        self.set_key_count(1);
    }
}

impl Default for NonLeafNode {
    fn default() -> Self {
        Self::new()
    }
}

/// The outcome of inserting into a node: either it fit, or it split and
/// promoted a key/pointer pair that the caller must insert into the parent.
pub enum InsertOutcome {
    Inserted,
    Split { promoted_key: i32, sibling_pid: i32 },
}
