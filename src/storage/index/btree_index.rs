use log::{debug, trace, warn};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::io::Write;

use crate::catalog::{Key, KeyType};
use crate::config::BTreeConfig;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::block::{BlockId, RecordPointer, INVALID_BLOCK_ID};
use crate::storage::codec::KeyCodec;
use crate::storage::index::LeafIterator;
use crate::storage::page::{
    BPlusTreeInternalPage, BPlusTreeLeafPage, BPlusTreeMetaPage, BPlusTreePage, ChildLookup,
    LeafEntry,
};

pub const META_BLOCK_ID: BlockId = 0;
// block ids are u16
const MAX_BLOCKS: usize = u16::MAX as usize + 1;

/// Comparison used by [`BPlusTreeIndex::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl CompareOp {
    /// `ordering` is `stored_key.compare(probe)`.
    fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering.is_eq(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::GtEq => ordering.is_ge(),
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::LtEq => ordering.is_le(),
        }
    }

    // no later key in leaf order can match
    fn is_exhausted(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq | CompareOp::LtEq => ordering.is_gt(),
            CompareOp::Lt => ordering.is_ge(),
            CompareOp::Gt | CompareOp::GtEq => false,
        }
    }
}

/// Separator pushed up to the parent after a split. `left_id` keeps the
/// original block, `right_id` is the freshly appended one.
#[derive(Debug)]
struct Promotion {
    separator: Key,
    left_id: BlockId,
    right_id: BlockId,
}

/// B+Tree secondary index over an append-only arena of fixed-size blocks.
///
/// Block 0 holds the metadata (order and root id), block 1 is the initial
/// root leaf. Blocks are never freed or reused.
#[derive(Debug)]
pub struct BPlusTreeIndex {
    key_type: KeyType,
    config: BTreeConfig,
    max_key_len: usize,
    pages: Vec<BPlusTreePage>,
}

impl BPlusTreeIndex {
    pub fn new(order: u16, key_type: KeyType) -> QuillIndexResult<Self> {
        Self::with_config(key_type, BTreeConfig::default().with_order(order))
    }

    pub fn with_config(key_type: KeyType, config: BTreeConfig) -> QuillIndexResult<Self> {
        let max_key_len = config.validate(key_type)?;
        let root_id: BlockId = 1;
        let meta = BPlusTreeMetaPage::new(config.block_size, config.order, root_id)?;
        let root = BPlusTreeLeafPage::new(key_type, config.block_size)?;
        Ok(Self {
            key_type,
            config,
            max_key_len,
            pages: vec![BPlusTreePage::Meta(meta), BPlusTreePage::Leaf(root)],
        })
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn order(&self) -> u16 {
        self.config.order
    }

    pub fn config(&self) -> BTreeConfig {
        self.config
    }

    /// Longest encoded key the tree accepts.
    pub fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    pub fn num_blocks(&self) -> usize {
        self.pages.len()
    }

    pub fn root_id(&self) -> QuillIndexResult<BlockId> {
        match self.pages.get(META_BLOCK_ID as usize) {
            Some(BPlusTreePage::Meta(meta)) => meta.root_id(),
            _ => Err(QuillIndexError::Internal(
                "block 0 is not a meta block".to_string(),
            )),
        }
    }

    pub fn page(&self, block_id: BlockId) -> Option<&BPlusTreePage> {
        self.pages.get(block_id as usize)
    }

    pub fn leaf_page(&self, block_id: BlockId) -> QuillIndexResult<&BPlusTreeLeafPage> {
        match self.page(block_id) {
            Some(BPlusTreePage::Leaf(leaf)) => Ok(leaf),
            other => Err(Self::unexpected_page(block_id, "leaf", other)),
        }
    }

    pub fn internal_page(&self, block_id: BlockId) -> QuillIndexResult<&BPlusTreeInternalPage> {
        match self.page(block_id) {
            Some(BPlusTreePage::Internal(internal)) => Ok(internal),
            other => Err(Self::unexpected_page(block_id, "internal", other)),
        }
    }

    fn leaf_page_mut(&mut self, block_id: BlockId) -> QuillIndexResult<&mut BPlusTreeLeafPage> {
        match self.pages.get_mut(block_id as usize) {
            Some(BPlusTreePage::Leaf(leaf)) => Ok(leaf),
            other => Err(Self::unexpected_page(block_id, "leaf", other.map(|p| &*p))),
        }
    }

    fn internal_page_mut(
        &mut self,
        block_id: BlockId,
    ) -> QuillIndexResult<&mut BPlusTreeInternalPage> {
        match self.pages.get_mut(block_id as usize) {
            Some(BPlusTreePage::Internal(internal)) => Ok(internal),
            other => Err(Self::unexpected_page(block_id, "internal", other.map(|p| &*p))),
        }
    }

    fn unexpected_page(
        block_id: BlockId,
        expected: &str,
        found: Option<&BPlusTreePage>,
    ) -> QuillIndexError {
        match found {
            Some(page) => QuillIndexError::Internal(format!(
                "block {} is a {:?}, expected a {} page",
                block_id,
                page.page_type(),
                expected
            )),
            None => QuillIndexError::Internal(format!("block {} does not exist", block_id)),
        }
    }

    fn max_keys(&self) -> u16 {
        self.config.order - 1
    }

    fn check_key(&self, key: &Key) -> QuillIndexResult<()> {
        match key.key_type() {
            Some(found) if found != self.key_type => Err(QuillIndexError::KeyTypeMismatch {
                expected: self.key_type,
                found,
            }),
            _ => Ok(()),
        }
    }

    fn append_page(&mut self, page: BPlusTreePage) -> QuillIndexResult<BlockId> {
        let block_id = BlockId::try_from(self.pages.len()).map_err(|_| {
            QuillIndexError::Storage(format!("index file is full at {} blocks", self.pages.len()))
        })?;
        self.pages.push(page);
        Ok(block_id)
    }

    fn route(&self, internal: &BPlusTreeInternalPage, key: &Key) -> QuillIndexResult<BlockId> {
        match internal.search(key)? {
            ChildLookup::Child(child_id) => Ok(child_id),
            ChildLookup::Rightmost => internal.children()?.last().copied().ok_or_else(|| {
                QuillIndexError::Internal("internal page has no children".to_string())
            }),
        }
    }

    /// Descends to the leaf owning `key`. The returned path lists the
    /// internal ancestors, root first.
    fn find_leaf(&self, key: &Key) -> QuillIndexResult<(BlockId, Vec<BlockId>)> {
        let mut path = Vec::new();
        let mut current = self.root_id()?;
        loop {
            match self.page(current) {
                Some(BPlusTreePage::Leaf(_)) => return Ok((current, path)),
                Some(BPlusTreePage::Internal(internal)) => {
                    path.push(current);
                    if path.len() > self.pages.len() {
                        return Err(QuillIndexError::Internal(format!(
                            "cycle while descending through block {}",
                            current
                        )));
                    }
                    current = self.route(internal, key)?;
                }
                other => return Err(Self::unexpected_page(current, "tree", other)),
            }
        }
    }

    pub fn insert(&mut self, key: Key, record_pointer: RecordPointer) -> QuillIndexResult<()> {
        if key.is_null() {
            return Ok(());
        }
        self.check_key(&key)?;
        let key_len = KeyCodec::encoded_len(&key);
        if key_len > self.max_key_len {
            warn!(
                "rejecting key of {} bytes, index allows at most {}",
                key_len, self.max_key_len
            );
            return Err(QuillIndexError::Storage(format!(
                "key of {} bytes exceeds the maximum of {} bytes",
                key_len, self.max_key_len
            )));
        }

        let (leaf_id, mut path) = self.find_leaf(&key)?;
        trace!(
            "insert {} into leaf {} at depth {}",
            key,
            leaf_id,
            path.len()
        );
        if self.leaf_page(leaf_id)?.num_entries()? < self.max_keys() {
            return self.leaf_page_mut(leaf_id)?.insert(key, record_pointer);
        }

        // one new block per split level plus a possible new root
        if self.pages.len() + path.len() + 2 > MAX_BLOCKS {
            return Err(QuillIndexError::Storage(format!(
                "index file cannot grow past {} blocks",
                MAX_BLOCKS
            )));
        }

        let mut promotion = self.split_leaf(leaf_id, key, record_pointer)?;
        while let Some(parent_id) = path.pop() {
            if self.internal_page(parent_id)?.num_keys()? < self.max_keys() {
                return self.internal_page_mut(parent_id)?.insert_after(
                    promotion.left_id,
                    promotion.separator,
                    promotion.right_id,
                );
            }
            promotion = self.split_internal(parent_id, promotion)?;
        }
        self.promote_root(promotion)
    }

    fn split_leaf(
        &mut self,
        leaf_id: BlockId,
        key: Key,
        record_pointer: RecordPointer,
    ) -> QuillIndexResult<Promotion> {
        let leaf = self.leaf_page(leaf_id)?;
        let entries = leaf.entries()?;
        let prev_leaf_id = leaf.prev_leaf_id()?;
        let next_leaf_id = leaf.next_leaf_id()?;
        if entries.is_empty() {
            return Err(QuillIndexError::Internal(format!(
                "cannot split empty leaf {}",
                leaf_id
            )));
        }

        let left_size = (entries.len() + 1) / 2;
        let new_entry = LeafEntry::new(key, record_pointer);
        let (left_entries, right_entries) =
            if new_entry.key.compare(&entries[left_size - 1].key).is_lt() {
                let mut left = entries[..left_size - 1].to_vec();
                insert_entry_sorted(&mut left, new_entry);
                (left, entries[left_size - 1..].to_vec())
            } else {
                let mut right = entries[left_size..].to_vec();
                insert_entry_sorted(&mut right, new_entry);
                (entries[..left_size].to_vec(), right)
            };
        let separator = right_entries[0].key.clone();

        let mut right =
            BPlusTreeLeafPage::from_entries(self.key_type, self.config.block_size, &right_entries)?;
        right.set_prev_leaf_id(leaf_id)?;
        right.set_next_leaf_id(next_leaf_id)?;
        let right_id = self.append_page(BPlusTreePage::Leaf(right))?;

        let mut left =
            BPlusTreeLeafPage::from_entries(self.key_type, self.config.block_size, &left_entries)?;
        left.set_prev_leaf_id(prev_leaf_id)?;
        left.set_next_leaf_id(right_id)?;
        self.pages[leaf_id as usize] = BPlusTreePage::Leaf(left);

        if next_leaf_id != INVALID_BLOCK_ID {
            self.leaf_page_mut(next_leaf_id)?.set_prev_leaf_id(right_id)?;
        }

        debug!(
            "split leaf {} into {} + {} entries, new leaf {}, separator {}",
            leaf_id,
            left_entries.len(),
            right_entries.len(),
            right_id,
            separator
        );
        Ok(Promotion {
            separator,
            left_id: leaf_id,
            right_id,
        })
    }

    /// Splits a full internal page while adding `incoming`, whose pair goes
    /// right of the child it was split from. That slot picks the case.
    fn split_internal(
        &mut self,
        node_id: BlockId,
        incoming: Promotion,
    ) -> QuillIndexResult<Promotion> {
        let internal = self.internal_page(node_id)?;
        let keys = internal.keys()?;
        let children = internal.children()?;
        if keys.len() < 2 {
            return Err(QuillIndexError::Internal(format!(
                "cannot split internal page {} with {} keys",
                node_id,
                keys.len()
            )));
        }
        let slot = children
            .iter()
            .position(|child_id| *child_id == incoming.left_id)
            .ok_or_else(|| {
                QuillIndexError::Internal(format!(
                    "split block {} is not a child of internal page {}",
                    incoming.left_id, node_id
                ))
            })?;
        let Promotion {
            separator: key,
            right_id: child,
            ..
        } = incoming;

        let left_size = (keys.len() + 1) / 2;
        let (left_keys, left_children, separator, right_keys, right_children) =
            match slot.cmp(&left_size) {
                Ordering::Less => {
                    debug!("split internal {}: incoming key goes left", node_id);
                    let mut left_keys = keys[..left_size - 1].to_vec();
                    let mut left_children = children[..left_size].to_vec();
                    left_keys.insert(slot, key);
                    left_children.insert(slot + 1, child);
                    (
                        left_keys,
                        left_children,
                        keys[left_size - 1].clone(),
                        keys[left_size..].to_vec(),
                        children[left_size..].to_vec(),
                    )
                }
                Ordering::Equal => {
                    debug!("split internal {}: incoming key is promoted", node_id);
                    let mut right_children = vec![child];
                    right_children.extend_from_slice(&children[left_size + 1..]);
                    (
                        keys[..left_size].to_vec(),
                        children[..=left_size].to_vec(),
                        key,
                        keys[left_size..].to_vec(),
                        right_children,
                    )
                }
                Ordering::Greater => {
                    debug!("split internal {}: incoming key goes right", node_id);
                    let mut right_keys = keys[left_size + 1..].to_vec();
                    let mut right_children = children[left_size + 1..].to_vec();
                    right_keys.insert(slot - left_size - 1, key);
                    right_children.insert(slot - left_size, child);
                    (
                        keys[..left_size].to_vec(),
                        children[..=left_size].to_vec(),
                        keys[left_size].clone(),
                        right_keys,
                        right_children,
                    )
                }
            };

        let right = BPlusTreeInternalPage::from_parts(
            self.key_type,
            self.config.block_size,
            &right_keys,
            &right_children,
        )?;
        let right_id = self.append_page(BPlusTreePage::Internal(right))?;
        let left = BPlusTreeInternalPage::from_parts(
            self.key_type,
            self.config.block_size,
            &left_keys,
            &left_children,
        )?;
        self.pages[node_id as usize] = BPlusTreePage::Internal(left);

        debug!(
            "split internal {} into {} + {} keys, new internal {}, separator {}",
            node_id,
            left_keys.len(),
            right_keys.len(),
            right_id,
            separator
        );
        Ok(Promotion {
            separator,
            left_id: node_id,
            right_id,
        })
    }

    fn promote_root(&mut self, promotion: Promotion) -> QuillIndexResult<()> {
        let old_root_id = self.root_id()?;
        let root = BPlusTreeInternalPage::with_root(
            self.key_type,
            self.config.block_size,
            promotion.separator,
            promotion.left_id,
            promotion.right_id,
        )?;
        let root_id = self.append_page(BPlusTreePage::Internal(root))?;
        match self.pages.get_mut(META_BLOCK_ID as usize) {
            Some(BPlusTreePage::Meta(meta)) => meta.set_root_id(root_id)?,
            _ => {
                return Err(QuillIndexError::Internal(
                    "block 0 is not a meta block".to_string(),
                ))
            }
        }
        debug!("promoted new root {} over old root {}", root_id, old_root_id);
        Ok(())
    }

    /// Steps back from the leaf `key` descends to while the previous leaf
    /// still ends at or after `key`. Equal keys may straddle a split.
    fn first_leaf_for(&self, key: &Key) -> QuillIndexResult<BlockId> {
        let (mut leaf_id, _) = self.find_leaf(key)?;
        for _ in 0..self.pages.len() {
            let prev_leaf_id = self.leaf_page(leaf_id)?.prev_leaf_id()?;
            if prev_leaf_id == INVALID_BLOCK_ID {
                return Ok(leaf_id);
            }
            match self.leaf_page(prev_leaf_id)?.last_key()? {
                Some(last) if last.compare(key).is_ge() => leaf_id = prev_leaf_id,
                _ => return Ok(leaf_id),
            }
        }
        Err(QuillIndexError::Internal(format!(
            "leaf chain loops back through block {}",
            leaf_id
        )))
    }

    /// Id of the leftmost leaf holding `key`, or `None` if the key is absent.
    pub fn search(&self, key: &Key) -> QuillIndexResult<Option<BlockId>> {
        if key.is_null() {
            return Ok(None);
        }
        self.check_key(key)?;
        let leaf_id = self.first_leaf_for(key)?;
        Ok(self.leaf_page(leaf_id)?.search(key)?.map(|_| leaf_id))
    }

    /// Record pointer stored with the first inserted copy of `key`.
    pub fn lookup(&self, key: &Key) -> QuillIndexResult<Option<RecordPointer>> {
        match self.search(key)? {
            Some(leaf_id) => self.leaf_page(leaf_id)?.search(key),
            None => Ok(None),
        }
    }

    pub fn lookup_in_leaf(
        &self,
        leaf_id: BlockId,
        key: &Key,
    ) -> QuillIndexResult<Option<RecordPointer>> {
        if key.is_null() {
            return Ok(None);
        }
        self.check_key(key)?;
        self.leaf_page(leaf_id)?.search(key)
    }

    /// Every entry whose key satisfies `op` against `key`, in key order.
    pub fn scan(&self, op: CompareOp, key: &Key) -> QuillIndexResult<Vec<(Key, RecordPointer)>> {
        if key.is_null() {
            return Ok(vec![]);
        }
        self.check_key(key)?;

        let start_leaf_id = match op {
            CompareOp::Lt | CompareOp::LtEq => self.leftmost_leaf_id()?,
            CompareOp::Eq | CompareOp::Gt | CompareOp::GtEq => self.first_leaf_for(key)?,
        };

        let mut result = Vec::new();
        for entry in LeafIterator::new(self, start_leaf_id) {
            let (stored, record_pointer) = entry?;
            let ordering = stored.compare(key);
            if op.matches(ordering) {
                result.push((stored, record_pointer));
            } else if op.is_exhausted(ordering) {
                break;
            }
        }
        Ok(result)
    }

    pub fn iter(&self) -> QuillIndexResult<LeafIterator<'_>> {
        Ok(LeafIterator::new(self, self.leftmost_leaf_id()?))
    }

    pub fn leftmost_leaf_id(&self) -> QuillIndexResult<BlockId> {
        let mut current = self.root_id()?;
        for _ in 0..self.pages.len() {
            match self.page(current) {
                Some(BPlusTreePage::Leaf(_)) => return Ok(current),
                Some(BPlusTreePage::Internal(internal)) => {
                    current = internal.header()?.first_child;
                }
                other => return Err(Self::unexpected_page(current, "tree", other)),
            }
        }
        Err(QuillIndexError::Internal(
            "no leaf reached from the root".to_string(),
        ))
    }

    /// Number of levels, 1 while the root is a leaf.
    pub fn height(&self) -> QuillIndexResult<usize> {
        let mut height = 1;
        let mut current = self.root_id()?;
        while let BPlusTreePage::Internal(internal) = self
            .page(current)
            .ok_or_else(|| Self::unexpected_page(current, "tree", None))?
        {
            height += 1;
            if height > self.pages.len() {
                return Err(QuillIndexError::Internal(
                    "tree deeper than its block count".to_string(),
                ));
            }
            current = internal.header()?.first_child;
        }
        Ok(height)
    }

    /// Number of stored entries.
    pub fn len(&self) -> QuillIndexResult<usize> {
        let mut len = 0;
        let mut current = self.leftmost_leaf_id()?;
        while current != INVALID_BLOCK_ID {
            let leaf = self.leaf_page(current)?;
            len += leaf.num_entries()? as usize;
            current = leaf.next_leaf_id()?;
        }
        Ok(len)
    }

    pub fn is_empty(&self) -> QuillIndexResult<bool> {
        let root_id = self.root_id()?;
        match self.page(root_id) {
            Some(BPlusTreePage::Leaf(leaf)) => Ok(leaf.num_entries()? == 0),
            _ => Ok(false),
        }
    }

    /// Keys of every node in breadth-first order, separators included.
    pub fn return_bfs(&self) -> QuillIndexResult<Vec<Key>> {
        let mut keys = Vec::new();
        for level in self.levels()? {
            for block_id in level {
                match self.page(block_id) {
                    Some(BPlusTreePage::Internal(internal)) => keys.extend(internal.keys()?),
                    Some(BPlusTreePage::Leaf(leaf)) => keys.extend(leaf.keys()?),
                    other => return Err(Self::unexpected_page(block_id, "tree", other)),
                }
            }
        }
        Ok(keys)
    }

    /// Prints `return_bfs` to stdout as `key ` tokens.
    pub fn print_bfs(&self) -> QuillIndexResult<()> {
        let keys = self.return_bfs()?;
        let mut stdout = std::io::stdout().lock();
        for key in keys {
            write!(stdout, "{} ", key)
                .map_err(|e| QuillIndexError::Internal(format!("Failed to print tree {}", e)))?;
        }
        stdout
            .flush()
            .map_err(|e| QuillIndexError::Internal(format!("Failed to print tree {}", e)))
    }

    /// Block ids grouped by depth, root level first.
    pub fn levels(&self) -> QuillIndexResult<Vec<Vec<BlockId>>> {
        let mut levels = Vec::new();
        let mut queue = VecDeque::from([(self.root_id()?, 0usize)]);
        let mut visited = 0;
        while let Some((block_id, depth)) = queue.pop_front() {
            visited += 1;
            if visited > self.pages.len() {
                return Err(QuillIndexError::Internal(
                    "breadth-first walk visited a block twice".to_string(),
                ));
            }
            if levels.len() <= depth {
                levels.push(Vec::new());
            }
            levels[depth].push(block_id);
            if let BPlusTreePage::Internal(internal) = self
                .page(block_id)
                .ok_or_else(|| Self::unexpected_page(block_id, "tree", None))?
            {
                for child_id in internal.children()? {
                    queue.push_back((child_id, depth + 1));
                }
            }
        }
        Ok(levels)
    }

    /// Deletion is not implemented.
    pub fn delete(&mut self, key: &Key) -> QuillIndexResult<()> {
        warn!("delete of key {} requested on a b+ tree index", key);
        Err(QuillIndexError::NotSupport(
            "b+ tree index delete".to_string(),
        ))
    }
}

fn insert_entry_sorted(entries: &mut Vec<LeafEntry>, entry: LeafEntry) {
    let position = entries
        .iter()
        .position(|e| e.key.compare(&entry.key).is_gt())
        .unwrap_or(entries.len());
    entries.insert(position, entry);
}

#[cfg(test)]
mod tests {
    use super::{BPlusTreeIndex, CompareOp};
    use crate::catalog::{Key, KeyType};
    use crate::config::BTreeConfig;
    use crate::error::QuillIndexError;
    use crate::storage::page::BPlusTreePage;

    fn int_index(order: u16, keys: impl IntoIterator<Item = i32>) -> BPlusTreeIndex {
        let mut index = BPlusTreeIndex::new(order, KeyType::Int32).unwrap();
        for key in keys {
            index.insert(Key::Int32(key), key as u16).unwrap();
        }
        index
    }

    #[test]
    fn new_index_layout() {
        let index = BPlusTreeIndex::new(4, KeyType::Int32).unwrap();
        assert_eq!(index.num_blocks(), 2);
        assert_eq!(index.root_id().unwrap(), 1);
        assert!(matches!(index.page(0), Some(BPlusTreePage::Meta(_))));
        assert!(index.page(1).unwrap().is_leaf());
        assert!(index.is_empty().unwrap());
        assert_eq!(index.height().unwrap(), 1);
        assert_eq!(index.search(&Key::Int32(1)).unwrap(), None);
    }

    #[test]
    fn first_leaf_split() {
        let index = int_index(4, [10, 20, 5, 15]);
        let root_id = index.root_id().unwrap();
        let root = index.internal_page(root_id).unwrap();
        assert_eq!(root.keys().unwrap(), vec![Key::Int32(15)]);
        assert_eq!(root.children().unwrap(), vec![1, 2]);
        assert_eq!(
            index.leaf_page(1).unwrap().keys().unwrap(),
            vec![Key::Int32(5), Key::Int32(10)]
        );
        assert_eq!(
            index.leaf_page(2).unwrap().keys().unwrap(),
            vec![Key::Int32(15), Key::Int32(20)]
        );
        assert_eq!(index.search(&Key::Int32(15)).unwrap(), Some(2));
        assert_eq!(index.search(&Key::Int32(5)).unwrap(), Some(1));
    }

    #[test]
    fn leaf_split_left_case() {
        // 1 < k[1] = 20 sends the new key to the left half
        let index = int_index(4, [10, 20, 30, 1]);
        assert_eq!(
            index.leaf_page(1).unwrap().keys().unwrap(),
            vec![Key::Int32(1), Key::Int32(10)]
        );
        assert_eq!(
            index.leaf_page(2).unwrap().keys().unwrap(),
            vec![Key::Int32(20), Key::Int32(30)]
        );
        let root = index.internal_page(index.root_id().unwrap()).unwrap();
        assert_eq!(root.keys().unwrap(), vec![Key::Int32(20)]);
    }

    #[test]
    fn sibling_relink_on_middle_split() {
        let mut index = int_index(4, [10, 20, 30, 40, 50, 60]);
        // leaves: 1 [10,20] <-> 2 [30,40] <-> 4 [50,60], then leaf 2 splits again
        index.insert(Key::Int32(35), 35).unwrap();
        index.insert(Key::Int32(45), 45).unwrap();
        let mut chain = vec![];
        let mut current = index.leftmost_leaf_id().unwrap();
        let mut prev = 0;
        while current != 0 {
            let leaf = index.leaf_page(current).unwrap();
            assert_eq!(leaf.prev_leaf_id().unwrap(), prev);
            chain.extend(leaf.keys().unwrap());
            prev = current;
            current = leaf.next_leaf_id().unwrap();
        }
        let expected: Vec<Key> = [10, 20, 30, 35, 40, 45, 50, 60]
            .into_iter()
            .map(Key::Int32)
            .collect();
        assert_eq!(chain, expected);
    }

    #[test]
    fn internal_split_cases() {
        // order 4: the root holds 3 keys before its first split
        for keys in [
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100],
            vec![100, 90, 80, 70, 60, 50, 40, 30, 20, 10],
            // incoming separator 36 lands in the left half
            vec![10, 20, 70, 80, 30, 40, 50, 60, 35, 36],
            // incoming separator 56 is promoted itself
            vec![10, 20, 70, 80, 30, 40, 50, 60, 55, 56],
        ] {
            let index = int_index(4, keys.clone());
            assert_eq!(index.height().unwrap(), 3, "keys {:?}", keys);
            for key in &keys {
                let leaf_id = index.search(&Key::Int32(*key)).unwrap().unwrap();
                assert_eq!(
                    index.lookup_in_leaf(leaf_id, &Key::Int32(*key)).unwrap(),
                    Some(*key as u16)
                );
            }
            let mut sorted = keys.clone();
            sorted.sort();
            let walked: Vec<Key> = index
                .iter()
                .unwrap()
                .map(|entry| entry.unwrap().0)
                .collect();
            assert_eq!(walked, sorted.into_iter().map(Key::Int32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn separators_match_right_subtree() {
        // 37 is coprime with 61, so this visits every key once in scrambled order
        let index = int_index(5, (0..61).map(|i| (i * 37) % 61 * 10));
        assert_eq!(index.len().unwrap(), 61);
        for level in index.levels().unwrap() {
            for block_id in level {
                if let Some(BPlusTreePage::Internal(internal)) = index.page(block_id) {
                    let keys = internal.keys().unwrap();
                    let children = internal.children().unwrap();
                    assert_eq!(children.len(), keys.len() + 1);
                    for (i, key) in keys.iter().enumerate() {
                        let right_first = first_key_under(&index, children[i + 1]);
                        assert_eq!(right_first.compare(key), std::cmp::Ordering::Equal);
                    }
                }
            }
        }
    }

    fn first_key_under(index: &BPlusTreeIndex, mut block_id: u16) -> Key {
        loop {
            match index.page(block_id).unwrap() {
                BPlusTreePage::Internal(internal) => {
                    block_id = internal.children().unwrap()[0];
                }
                BPlusTreePage::Leaf(leaf) => return leaf.first_key().unwrap().unwrap(),
                BPlusTreePage::Meta(_) => panic!("meta block in tree"),
            }
        }
    }

    #[test]
    fn scan_operators() {
        let index = int_index(3, [5, 1, 4, 2, 3, 6, 8, 7]);
        let keys = |op, probe| -> Vec<i32> {
            index
                .scan(op, &Key::Int32(probe))
                .unwrap()
                .into_iter()
                .map(|(key, _)| match key {
                    Key::Int32(v) => v,
                    other => panic!("unexpected key {other:?}"),
                })
                .collect()
        };
        assert_eq!(keys(CompareOp::Eq, 4), vec![4]);
        assert_eq!(keys(CompareOp::Eq, 9), Vec::<i32>::new());
        assert_eq!(keys(CompareOp::Gt, 6), vec![7, 8]);
        assert_eq!(keys(CompareOp::GtEq, 6), vec![6, 7, 8]);
        assert_eq!(keys(CompareOp::Lt, 3), vec![1, 2]);
        assert_eq!(keys(CompareOp::LtEq, 3), vec![1, 2, 3]);
        assert_eq!(keys(CompareOp::GtEq, 0).len(), 8);
        assert_eq!(index.scan(CompareOp::Eq, &Key::Null).unwrap(), vec![]);
    }

    #[test]
    fn duplicates_across_splits() {
        let mut index = BPlusTreeIndex::new(3, KeyType::Boolean).unwrap();
        for i in 0..12u16 {
            index.insert(Key::Boolean(i % 3 == 0), i).unwrap();
        }
        assert_eq!(index.len().unwrap(), 12);
        let trues = index.scan(CompareOp::Eq, &Key::Boolean(true)).unwrap();
        let pointers: Vec<u16> = trues.iter().map(|(_, p)| *p).collect();
        assert_eq!(pointers, vec![0, 3, 6, 9]);
        let falses = index.scan(CompareOp::Lt, &Key::Boolean(true)).unwrap();
        assert_eq!(falses.len(), 8);
        assert!(index.search(&Key::Boolean(false)).unwrap().is_some());
    }

    #[test]
    fn search_returns_leftmost_leaf_of_duplicates() {
        let mut index = BPlusTreeIndex::new(4, KeyType::Int32).unwrap();
        for i in 0..6u16 {
            index.insert(Key::Int32(7), i).unwrap();
        }
        let root = index.internal_page(index.root_id().unwrap()).unwrap();
        assert_eq!(root.keys().unwrap(), vec![Key::Int32(7), Key::Int32(7)]);
        // leaf 2 split into 2 and 4, so 4 follows 2 rather than sorting last
        assert_eq!(root.children().unwrap(), vec![1, 2, 4]);

        assert_eq!(index.search(&Key::Int32(7)).unwrap(), Some(1));
        assert_eq!(index.lookup(&Key::Int32(7)).unwrap(), Some(0));
        let pointers: Vec<u16> = index
            .scan(CompareOp::Eq, &Key::Int32(7))
            .unwrap()
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(pointers, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn duplicates_do_not_hide_distinct_keys() {
        for order in [3u16, 4, 5] {
            let mut index = BPlusTreeIndex::new(order, KeyType::Int32).unwrap();
            let mut inserted = vec![];
            for i in 0..120 {
                let key = if i % 3 == 0 { (i * 37) % 101 } else { 50 };
                index.insert(Key::Int32(key), i as u16).unwrap();
                inserted.push(key);
            }
            for key in &inserted {
                let first = inserted.iter().position(|k| k == key).unwrap() as u16;
                assert_eq!(
                    index.lookup(&Key::Int32(*key)).unwrap(),
                    Some(first),
                    "order {order} key {key}"
                );
            }
        }
    }

    #[test]
    fn rejects_bad_keys() {
        let mut index = BPlusTreeIndex::with_config(
            KeyType::Varchar,
            BTreeConfig::default().with_order(3u16).with_block_size(64usize),
        )
        .unwrap();
        assert_eq!(index.max_key_len(), 24);
        let blocks = index.num_blocks();
        assert!(matches!(
            index.insert(Key::from("x".repeat(25)), 1),
            Err(QuillIndexError::Storage(_))
        ));
        index.insert(Key::from("y".repeat(24)), 1).unwrap();
        assert!(matches!(
            index.insert(Key::Int32(1), 1),
            Err(QuillIndexError::KeyTypeMismatch {
                expected: KeyType::Varchar,
                found: KeyType::Int32
            })
        ));
        assert!(index.search(&Key::Boolean(true)).is_err());
        assert_eq!(index.num_blocks(), blocks);
        assert_eq!(index.len().unwrap(), 1);
    }

    #[test]
    fn delete_is_not_supported() {
        let mut index = int_index(4, [1, 2, 3]);
        assert!(matches!(
            index.delete(&Key::Int32(2)),
            Err(QuillIndexError::NotSupport(_))
        ));
        assert_eq!(index.lookup(&Key::Int32(2)).unwrap(), Some(2));
    }

    #[test]
    fn bfs_lists_separators_and_leaves() {
        let index = int_index(4, [10, 20, 5, 15]);
        assert_eq!(
            index.return_bfs().unwrap(),
            [15, 5, 10, 15, 20].into_iter().map(Key::Int32).collect::<Vec<_>>()
        );
        assert_eq!(index.levels().unwrap(), vec![vec![3], vec![1, 2]]);
        index.print_bfs().unwrap();
    }
}
