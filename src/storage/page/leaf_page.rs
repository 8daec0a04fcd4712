use derive_new::new;

use crate::catalog::{Key, KeyType};
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::block::{Block, BlockCursor, BlockId, BlockWriter, RecordPointer};
use crate::storage::codec::{BPlusTreeLeafPageHeaderCodec, KeyCodec};

/**
 * Leaf page format (entries sorted by key, equal keys in insertion order):
 *  ------------------------------------------------------------------
 * | HEADER | PTR(1) KEY_LEN(1) KEY(1) | ... | PTR(n) KEY_LEN(n) KEY(n) |
 *  ------------------------------------------------------------------
 *
 * Header format (size in byte, 8 bytes in total):
 *  ------------------------------------------------------------------------
 * | NumEntries (2) | PrevLeafId (2) | NextLeafId (2) | NextFreeOffset (2) |
 *  ------------------------------------------------------------------------
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BPlusTreeLeafPageHeader {
    pub num_entries: u16,
    pub prev_leaf_id: BlockId,
    pub next_leaf_id: BlockId,
    pub next_free_offset: u16,
}

impl BPlusTreeLeafPageHeader {
    pub const SIZE: usize = 8;
}

#[derive(new, Debug, Clone, PartialEq)]
pub struct LeafEntry {
    pub key: Key,
    pub record_pointer: RecordPointer,
}

// 4 = record pointer + key length prefix
const LEAF_ENTRY_OVERHEAD: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BPlusTreeLeafPage {
    key_type: KeyType,
    block: Block,
}

impl BPlusTreeLeafPage {
    pub fn new(key_type: KeyType, block_size: usize) -> QuillIndexResult<Self> {
        let mut page = Self {
            key_type,
            block: Block::new(block_size),
        };
        page.write_header(&BPlusTreeLeafPageHeader {
            num_entries: 0,
            prev_leaf_id: 0,
            next_leaf_id: 0,
            next_free_offset: BPlusTreeLeafPageHeader::SIZE as u16,
        })?;
        Ok(page)
    }

    /// Builds a leaf holding `entries` in the given order, with no sibling links.
    pub fn from_entries(
        key_type: KeyType,
        block_size: usize,
        entries: &[LeafEntry],
    ) -> QuillIndexResult<Self> {
        let mut page = Self::new(key_type, block_size)?;
        let mut writer = BlockWriter::new(&mut page.block, BPlusTreeLeafPageHeader::SIZE);
        for entry in entries {
            let key_bytes = KeyCodec::encode(&entry.key);
            writer.write_u16(entry.record_pointer)?;
            writer.write_u16(key_bytes.len() as u16)?;
            writer.write_bytes(&key_bytes)?;
        }
        let next_free_offset = writer.offset() as u16;
        page.write_header(&BPlusTreeLeafPageHeader {
            num_entries: entries.len() as u16,
            prev_leaf_id: 0,
            next_leaf_id: 0,
            next_free_offset,
        })?;
        Ok(page)
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn header(&self) -> QuillIndexResult<BPlusTreeLeafPageHeader> {
        let bytes = self.block.read(0, BPlusTreeLeafPageHeader::SIZE)?;
        Ok(BPlusTreeLeafPageHeaderCodec::decode(bytes)?.0)
    }

    fn write_header(&mut self, header: &BPlusTreeLeafPageHeader) -> QuillIndexResult<()> {
        self.block
            .write(0, &BPlusTreeLeafPageHeaderCodec::encode(header))
    }

    pub fn num_entries(&self) -> QuillIndexResult<u16> {
        Ok(self.header()?.num_entries)
    }

    pub fn prev_leaf_id(&self) -> QuillIndexResult<BlockId> {
        Ok(self.header()?.prev_leaf_id)
    }

    pub fn next_leaf_id(&self) -> QuillIndexResult<BlockId> {
        Ok(self.header()?.next_leaf_id)
    }

    pub fn set_prev_leaf_id(&mut self, prev_leaf_id: BlockId) -> QuillIndexResult<()> {
        let mut header = self.header()?;
        header.prev_leaf_id = prev_leaf_id;
        self.write_header(&header)
    }

    pub fn set_next_leaf_id(&mut self, next_leaf_id: BlockId) -> QuillIndexResult<()> {
        let mut header = self.header()?;
        header.next_leaf_id = next_leaf_id;
        self.write_header(&header)
    }

    pub fn entries(&self) -> QuillIndexResult<Vec<LeafEntry>> {
        Ok(self
            .located_entries()?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect())
    }

    pub fn keys(&self) -> QuillIndexResult<Vec<Key>> {
        Ok(self
            .located_entries()?
            .into_iter()
            .map(|(_, entry)| entry.key)
            .collect())
    }

    pub fn record_pointers(&self) -> QuillIndexResult<Vec<RecordPointer>> {
        Ok(self
            .located_entries()?
            .into_iter()
            .map(|(_, entry)| entry.record_pointer)
            .collect())
    }

    pub fn first_key(&self) -> QuillIndexResult<Option<Key>> {
        Ok(self.keys()?.into_iter().next())
    }

    pub fn last_key(&self) -> QuillIndexResult<Option<Key>> {
        Ok(self.keys()?.pop())
    }

    /// Inserts after every entry with an equal key.
    pub fn insert(&mut self, key: Key, record_pointer: RecordPointer) -> QuillIndexResult<()> {
        let mut header = self.header()?;
        let free = header.next_free_offset as usize;
        let position = self
            .located_entries()?
            .into_iter()
            .find(|(_, entry)| entry.key.compare(&key).is_gt())
            .map(|(offset, _)| offset)
            .unwrap_or(free);

        let key_bytes = KeyCodec::encode(&key);
        let entry_len = LEAF_ENTRY_OVERHEAD + key_bytes.len();
        if free + entry_len > self.block.capacity() {
            return Err(QuillIndexError::Storage(format!(
                "leaf entry of {} bytes does not fit, {} of {} bytes used",
                entry_len,
                free,
                self.block.capacity()
            )));
        }

        self.block.copy_within(position..free, position + entry_len)?;
        let mut writer = BlockWriter::new(&mut self.block, position);
        writer.write_u16(record_pointer)?;
        writer.write_u16(key_bytes.len() as u16)?;
        writer.write_bytes(&key_bytes)?;

        header.num_entries += 1;
        header.next_free_offset = (free + entry_len) as u16;
        self.write_header(&header)
    }

    /// Record pointer of the first entry equal to `key`.
    pub fn search(&self, key: &Key) -> QuillIndexResult<Option<RecordPointer>> {
        Ok(self
            .located_entries()?
            .into_iter()
            .find(|(_, entry)| entry.key.compare(key).is_eq())
            .map(|(_, entry)| entry.record_pointer))
    }

    // entries paired with their starting byte offset
    fn located_entries(&self) -> QuillIndexResult<Vec<(usize, LeafEntry)>> {
        let header = self.header()?;
        let mut cursor = BlockCursor::new(&self.block, BPlusTreeLeafPageHeader::SIZE);
        let mut entries = Vec::with_capacity(header.num_entries as usize);
        for _ in 0..header.num_entries {
            let offset = cursor.offset();
            let record_pointer = cursor.read_u16()?;
            let key_len = cursor.read_u16()? as usize;
            let (key, _) = KeyCodec::decode(cursor.read_bytes(key_len)?, self.key_type)?;
            entries.push((offset, LeafEntry::new(key, record_pointer)));
        }
        if cursor.offset() > header.next_free_offset as usize {
            return Err(QuillIndexError::Storage(format!(
                "leaf entries end at {} past free offset {}",
                cursor.offset(),
                header.next_free_offset
            )));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::{BPlusTreeLeafPage, LeafEntry};
    use crate::catalog::{Key, KeyType};
    use crate::error::QuillIndexError;

    #[test]
    fn empty_leaf_layout() {
        let leaf = BPlusTreeLeafPage::new(KeyType::Int32, 64).unwrap();
        assert_eq!(&leaf.block().data()[..8], &[0, 0, 0, 0, 0, 0, 0, 8]);
        assert!(leaf.keys().unwrap().is_empty());
        assert_eq!(leaf.search(&Key::Int32(1)).unwrap(), None);
    }

    #[test]
    fn insert_keeps_order_and_layout() {
        let mut leaf = BPlusTreeLeafPage::new(KeyType::Int32, 64).unwrap();
        leaf.insert(Key::Int32(20), 2).unwrap();
        leaf.insert(Key::Int32(10), 1).unwrap();
        leaf.insert(Key::Int32(15), 7).unwrap();

        assert_eq!(
            leaf.keys().unwrap(),
            vec![Key::Int32(10), Key::Int32(15), Key::Int32(20)]
        );
        assert_eq!(leaf.record_pointers().unwrap(), vec![1, 7, 2]);
        let header = leaf.header().unwrap();
        assert_eq!(header.num_entries, 3);
        assert_eq!(header.next_free_offset, 8 + 3 * 8);
        // first entry: ptr 1, len 4, key 10
        assert_eq!(&leaf.block().data()[8..16], &[0, 1, 0, 4, 0, 0, 0, 10]);
        assert_eq!(leaf.search(&Key::Int32(15)).unwrap(), Some(7));
        assert_eq!(leaf.search(&Key::Int32(16)).unwrap(), None);
    }

    #[test]
    fn duplicates_keep_insertion_order() {
        let mut leaf = BPlusTreeLeafPage::new(KeyType::Boolean, 64).unwrap();
        leaf.insert(Key::Boolean(true), 1).unwrap();
        leaf.insert(Key::Boolean(false), 2).unwrap();
        leaf.insert(Key::Boolean(true), 3).unwrap();
        leaf.insert(Key::Boolean(false), 4).unwrap();
        assert_eq!(leaf.record_pointers().unwrap(), vec![2, 4, 1, 3]);
        assert_eq!(leaf.search(&Key::Boolean(true)).unwrap(), Some(1));
    }

    #[test]
    fn variable_length_keys() {
        let mut leaf = BPlusTreeLeafPage::new(KeyType::Varchar, 128).unwrap();
        for (i, word) in ["banana", "apple", "cherry", ""].iter().enumerate() {
            leaf.insert(Key::from(*word), i as u16).unwrap();
        }
        assert_eq!(
            leaf.keys().unwrap(),
            vec![
                Key::from(""),
                Key::from("apple"),
                Key::from("banana"),
                Key::from("cherry")
            ]
        );
        assert_eq!(leaf.header().unwrap().next_free_offset as usize, 8 + 16 + 17);
        assert_eq!(leaf.first_key().unwrap(), Some(Key::from("")));
        assert_eq!(leaf.last_key().unwrap(), Some(Key::from("cherry")));
    }

    #[test]
    fn from_entries_and_links() {
        let entries = vec![
            LeafEntry::new(Key::Float64(0.5), 5),
            LeafEntry::new(Key::Float64(1.5), 6),
        ];
        let mut leaf = BPlusTreeLeafPage::from_entries(KeyType::Float64, 64, &entries).unwrap();
        leaf.set_prev_leaf_id(3).unwrap();
        leaf.set_next_leaf_id(9).unwrap();
        assert_eq!(leaf.entries().unwrap(), entries);
        assert_eq!(leaf.prev_leaf_id().unwrap(), 3);
        assert_eq!(leaf.next_leaf_id().unwrap(), 9);
        assert_eq!(leaf.num_entries().unwrap(), 2);
        assert_eq!(leaf.header().unwrap().next_free_offset, 8 + 2 * 12);
    }

    #[test]
    fn overflowing_insert_fails() {
        let mut leaf = BPlusTreeLeafPage::new(KeyType::Int32, 20).unwrap();
        leaf.insert(Key::Int32(1), 1).unwrap();
        assert!(matches!(
            leaf.insert(Key::Int32(2), 2),
            Err(QuillIndexError::Storage(_))
        ));
        assert_eq!(leaf.keys().unwrap(), vec![Key::Int32(1)]);
    }
}
