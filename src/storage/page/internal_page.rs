use crate::catalog::{Key, KeyType};
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::block::{Block, BlockCursor, BlockId, BlockWriter};
use crate::storage::codec::{BPlusTreeInternalPageHeaderCodec, KeyCodec};

/**
 * Internal page format (n keys, n+1 children):
 *  -------------------------------------------------------------------------
 * | HEADER | KEY_LEN(1) KEY(1) CHILD(1) | ... | KEY_LEN(n) KEY(n) CHILD(n) |
 *  -------------------------------------------------------------------------
 *
 * Header format (size in byte, 6 bytes in total):
 *  --------------------------------------------------------
 * | NumKeys (2) | NextFreeOffset (2) | Child(0) (2) |
 *  --------------------------------------------------------
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BPlusTreeInternalPageHeader {
    pub num_keys: u16,
    pub next_free_offset: u16,
    pub first_child: BlockId,
}

impl BPlusTreeInternalPageHeader {
    pub const SIZE: usize = 6;
}

/// Where a key routes inside an internal page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLookup {
    Child(BlockId),
    /// Greater than every separator: the last child.
    Rightmost,
}

// 4 = key length prefix + child id
const INTERNAL_ENTRY_OVERHEAD: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BPlusTreeInternalPage {
    key_type: KeyType,
    block: Block,
}

impl BPlusTreeInternalPage {
    pub fn new(key_type: KeyType, block_size: usize, first_child: BlockId) -> QuillIndexResult<Self> {
        let mut page = Self {
            key_type,
            block: Block::new(block_size),
        };
        page.write_header(&BPlusTreeInternalPageHeader {
            num_keys: 0,
            next_free_offset: BPlusTreeInternalPageHeader::SIZE as u16,
            first_child,
        })?;
        Ok(page)
    }

    /// A root with one separator between two children.
    pub fn with_root(
        key_type: KeyType,
        block_size: usize,
        separator: Key,
        left_id: BlockId,
        right_id: BlockId,
    ) -> QuillIndexResult<Self> {
        Self::from_parts(key_type, block_size, &[separator], &[left_id, right_id])
    }

    pub fn from_parts(
        key_type: KeyType,
        block_size: usize,
        keys: &[Key],
        children: &[BlockId],
    ) -> QuillIndexResult<Self> {
        let Some((first_child, rest)) = children.split_first() else {
            return Err(QuillIndexError::Internal(
                "internal page needs at least one child".to_string(),
            ));
        };
        if rest.len() != keys.len() {
            return Err(QuillIndexError::Internal(format!(
                "internal page with {} keys cannot hold {} children",
                keys.len(),
                children.len()
            )));
        }

        let mut page = Self::new(key_type, block_size, *first_child)?;
        let mut writer = BlockWriter::new(&mut page.block, BPlusTreeInternalPageHeader::SIZE);
        for (key, child) in keys.iter().zip(rest) {
            let key_bytes = KeyCodec::encode(key);
            writer.write_u16(key_bytes.len() as u16)?;
            writer.write_bytes(&key_bytes)?;
            writer.write_u16(*child)?;
        }
        let next_free_offset = writer.offset() as u16;
        page.write_header(&BPlusTreeInternalPageHeader {
            num_keys: keys.len() as u16,
            next_free_offset,
            first_child: *first_child,
        })?;
        Ok(page)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn header(&self) -> QuillIndexResult<BPlusTreeInternalPageHeader> {
        let bytes = self.block.read(0, BPlusTreeInternalPageHeader::SIZE)?;
        Ok(BPlusTreeInternalPageHeaderCodec::decode(bytes)?.0)
    }

    fn write_header(&mut self, header: &BPlusTreeInternalPageHeader) -> QuillIndexResult<()> {
        self.block
            .write(0, &BPlusTreeInternalPageHeaderCodec::encode(header))
    }

    pub fn num_keys(&self) -> QuillIndexResult<u16> {
        Ok(self.header()?.num_keys)
    }

    pub fn keys(&self) -> QuillIndexResult<Vec<Key>> {
        Ok(self
            .located_entries()?
            .into_iter()
            .map(|entry| entry.key)
            .collect())
    }

    /// All `num_keys + 1` children, left to right.
    pub fn children(&self) -> QuillIndexResult<Vec<BlockId>> {
        let header = self.header()?;
        let mut children = vec![header.first_child];
        children.extend(self.located_entries()?.into_iter().map(|entry| entry.child));
        Ok(children)
    }

    /// Inserts `key` with `right_child` as the child just right of it.
    /// Equal keys keep insertion order.
    pub fn insert(&mut self, key: Key, right_child: BlockId) -> QuillIndexResult<()> {
        let header = self.header()?;
        let position = self
            .located_entries()?
            .into_iter()
            .find(|entry| entry.key.compare(&key).is_gt())
            .map(|entry| entry.offset)
            .unwrap_or(header.next_free_offset as usize);
        self.insert_at(header, position, key, right_child)
    }

    /// Inserts `key` and `right_child` directly right of `left_child`, the
    /// block that was just split into `left_child` and `right_child`.
    pub fn insert_after(
        &mut self,
        left_child: BlockId,
        key: Key,
        right_child: BlockId,
    ) -> QuillIndexResult<()> {
        let header = self.header()?;
        let entries = self.located_entries()?;
        let position = if header.first_child == left_child {
            BPlusTreeInternalPageHeader::SIZE
        } else {
            let index = entries
                .iter()
                .position(|entry| entry.child == left_child)
                .ok_or_else(|| {
                    QuillIndexError::Internal(format!(
                        "block {} is not a child of this internal page",
                        left_child
                    ))
                })?;
            entries
                .get(index + 1)
                .map(|entry| entry.offset)
                .unwrap_or(header.next_free_offset as usize)
        };
        self.insert_at(header, position, key, right_child)
    }

    fn insert_at(
        &mut self,
        mut header: BPlusTreeInternalPageHeader,
        position: usize,
        key: Key,
        right_child: BlockId,
    ) -> QuillIndexResult<()> {
        let free = header.next_free_offset as usize;
        let key_bytes = KeyCodec::encode(&key);
        let entry_len = INTERNAL_ENTRY_OVERHEAD + key_bytes.len();
        if free + entry_len > self.block.capacity() {
            return Err(QuillIndexError::Storage(format!(
                "internal entry of {} bytes does not fit, {} of {} bytes used",
                entry_len,
                free,
                self.block.capacity()
            )));
        }

        self.block.copy_within(position..free, position + entry_len)?;
        let mut writer = BlockWriter::new(&mut self.block, position);
        writer.write_u16(key_bytes.len() as u16)?;
        writer.write_bytes(&key_bytes)?;
        writer.write_u16(right_child)?;

        header.num_keys += 1;
        header.next_free_offset = (free + entry_len) as u16;
        self.write_header(&header)
    }

    /// Picks the child to descend into: left of the first greater separator,
    /// right of the first equal one.
    pub fn search(&self, key: &Key) -> QuillIndexResult<ChildLookup> {
        let mut left_child = self.header()?.first_child;
        for entry in self.located_entries()? {
            match key.compare(&entry.key) {
                std::cmp::Ordering::Less => return Ok(ChildLookup::Child(left_child)),
                std::cmp::Ordering::Equal => return Ok(ChildLookup::Child(entry.child)),
                std::cmp::Ordering::Greater => left_child = entry.child,
            }
        }
        Ok(ChildLookup::Rightmost)
    }

    fn located_entries(&self) -> QuillIndexResult<Vec<InternalEntry>> {
        let header = self.header()?;
        let mut cursor = BlockCursor::new(&self.block, BPlusTreeInternalPageHeader::SIZE);
        let mut entries = Vec::with_capacity(header.num_keys as usize);
        for _ in 0..header.num_keys {
            let offset = cursor.offset();
            let key_len = cursor.read_u16()? as usize;
            let (key, _) = KeyCodec::decode(cursor.read_bytes(key_len)?, self.key_type)?;
            let child = cursor.read_u16()?;
            entries.push(InternalEntry { offset, key, child });
        }
        if cursor.offset() > header.next_free_offset as usize {
            return Err(QuillIndexError::Storage(format!(
                "internal entries end at {} past free offset {}",
                cursor.offset(),
                header.next_free_offset
            )));
        }
        Ok(entries)
    }
}

struct InternalEntry {
    offset: usize,
    key: Key,
    child: BlockId,
}
