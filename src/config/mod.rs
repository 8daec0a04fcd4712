use derive_with::With;

use crate::catalog::KeyType;
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::block::BLOCK_SIZE;
use crate::storage::page::{BPlusTreeInternalPageHeader, BPlusTreeLeafPageHeader};

pub const MIN_ORDER: u16 = 3;

// per-entry bytes besides the key: record pointer or child id, plus key length
const ENTRY_OVERHEAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, With)]
pub struct BTreeConfig {
    /// Maximum fan-out of an internal node; nodes hold at most `order - 1` keys.
    pub order: u16,
    pub block_size: usize,
}

impl Default for BTreeConfig {
    fn default() -> Self {
        BTreeConfig {
            order: 4,
            block_size: BLOCK_SIZE,
        }
    }
}

impl BTreeConfig {
    /// Checks that a full node of `key_type` fits one block and returns the
    /// largest encoded key length the tree accepts.
    pub fn validate(&self, key_type: KeyType) -> QuillIndexResult<usize> {
        if self.order < MIN_ORDER {
            return Err(QuillIndexError::NotSupport(format!(
                "b+ tree order {} is below {}",
                self.order, MIN_ORDER
            )));
        }
        // free offsets are stored as u16
        if self.block_size > u16::MAX as usize {
            return Err(QuillIndexError::NotSupport(format!(
                "block size {} exceeds {}",
                self.block_size,
                u16::MAX
            )));
        }

        let max_keys = self.order as usize - 1;
        let leaf_room = self.block_size.saturating_sub(BPlusTreeLeafPageHeader::SIZE) / max_keys;
        let internal_room =
            self.block_size.saturating_sub(BPlusTreeInternalPageHeader::SIZE) / max_keys;
        let Some(max_key_len) = leaf_room.min(internal_room).checked_sub(ENTRY_OVERHEAD) else {
            return Err(QuillIndexError::NotSupport(format!(
                "block size {} cannot hold {} entries",
                self.block_size, max_keys
            )));
        };

        if let Some(width) = key_type.fixed_width() {
            if width > max_key_len {
                return Err(QuillIndexError::NotSupport(format!(
                    "{} keys of {} bytes do not fit order {} in {} byte blocks",
                    key_type, width, self.order, self.block_size
                )));
            }
        }
        Ok(max_key_len)
    }
}
