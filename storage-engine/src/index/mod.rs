pub mod btree;
pub mod node;

pub use btree::{BTreeIndex, Cursor, ReadForwardOutcome};
pub use node::{InsertOutcome, LeafNode, NonLeafNode, MAX_LEAF_COUNT, MAX_NONLEAF_COUNT};
