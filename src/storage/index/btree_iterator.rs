use std::collections::VecDeque;

use crate::catalog::Key;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::block::{BlockId, RecordPointer, INVALID_BLOCK_ID};
use crate::storage::page::LeafEntry;

use super::btree_index::BPlusTreeIndex;

/// Walks the leaf sibling chain, yielding entries in key order.
///
/// Each leaf is decoded once when the iterator reaches it. After an error the
/// iterator is exhausted.
#[derive(Debug)]
pub struct LeafIterator<'a> {
    index: &'a BPlusTreeIndex,
    next_leaf_id: BlockId,
    buffer: VecDeque<LeafEntry>,
    visited_leaves: usize,
    failed: bool,
}

impl<'a> LeafIterator<'a> {
    pub fn new(index: &'a BPlusTreeIndex, start_leaf_id: BlockId) -> Self {
        Self {
            index,
            next_leaf_id: start_leaf_id,
            buffer: VecDeque::new(),
            visited_leaves: 0,
            failed: false,
        }
    }

    fn load_next_leaf(&mut self) -> QuillIndexResult<()> {
        self.visited_leaves += 1;
        if self.visited_leaves > self.index.num_blocks() {
            return Err(QuillIndexError::Internal(format!(
                "leaf chain loops back through block {}",
                self.next_leaf_id
            )));
        }
        let leaf = self.index.leaf_page(self.next_leaf_id)?;
        self.buffer = leaf.entries()?.into();
        self.next_leaf_id = leaf.next_leaf_id()?;
        Ok(())
    }
}

impl Iterator for LeafIterator<'_> {
    type Item = QuillIndexResult<(Key, RecordPointer)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Some(Ok((entry.key, entry.record_pointer)));
            }
            if self.failed || self.next_leaf_id == INVALID_BLOCK_ID {
                return None;
            }
            if let Err(e) = self.load_next_leaf() {
                self.failed = true;
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{Key, KeyType};
    use crate::error::QuillIndexResult;
    use crate::storage::index::{BPlusTreeIndex, LeafIterator};

    #[test]
    fn iterates_in_key_order() {
        let mut index = BPlusTreeIndex::new(3, KeyType::Float32).unwrap();
        for (i, key) in [2.5f32, -1.0, 7.25, 0.0, 3.0, -8.5].iter().enumerate() {
            index.insert(Key::Float32(*key), i as u16).unwrap();
        }
        let entries = index
            .iter()
            .unwrap()
            .collect::<QuillIndexResult<Vec<_>>>()
            .unwrap();
        assert_eq!(
            entries,
            vec![
                (Key::Float32(-8.5), 5),
                (Key::Float32(-1.0), 1),
                (Key::Float32(0.0), 3),
                (Key::Float32(2.5), 0),
                (Key::Float32(3.0), 4),
                (Key::Float32(7.25), 2),
            ]
        );
    }

    #[test]
    fn empty_index_yields_nothing() {
        let index = BPlusTreeIndex::new(4, KeyType::Int32).unwrap();
        assert_eq!(index.iter().unwrap().count(), 0);
    }

    #[test]
    fn bad_start_block_reports_once() {
        let index = BPlusTreeIndex::new(4, KeyType::Int32).unwrap();
        let mut iter = LeafIterator::new(&index, 42);
        assert!(matches!(iter.next(), Some(Err(_))));
        assert!(iter.next().is_none());
    }
}
