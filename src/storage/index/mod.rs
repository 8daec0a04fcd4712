mod btree_index;
mod btree_iterator;

pub use btree_index::{BPlusTreeIndex, CompareOp, META_BLOCK_ID};
pub use btree_iterator::LeafIterator;
