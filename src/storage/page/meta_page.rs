use crate::error::QuillIndexResult;
use crate::storage::block::{Block, BlockId};
use crate::storage::codec::BPlusTreeMetaPageCodec;

/// Header of block 0: `order (2) | root_id (2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BPlusTreeMetaPageHeader {
    pub order: u16,
    pub root_id: BlockId,
}

impl BPlusTreeMetaPageHeader {
    pub const SIZE: usize = 4;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BPlusTreeMetaPage {
    block: Block,
}

impl BPlusTreeMetaPage {
    pub fn new(block_size: usize, order: u16, root_id: BlockId) -> QuillIndexResult<Self> {
        let mut page = Self {
            block: Block::new(block_size),
        };
        page.write_header(&BPlusTreeMetaPageHeader { order, root_id })?;
        Ok(page)
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn header(&self) -> QuillIndexResult<BPlusTreeMetaPageHeader> {
        let bytes = self.block.read(0, BPlusTreeMetaPageHeader::SIZE)?;
        Ok(BPlusTreeMetaPageCodec::decode(bytes)?.0)
    }

    fn write_header(&mut self, header: &BPlusTreeMetaPageHeader) -> QuillIndexResult<()> {
        self.block.write(0, &BPlusTreeMetaPageCodec::encode(header))
    }

    pub fn order(&self) -> QuillIndexResult<u16> {
        Ok(self.header()?.order)
    }

    pub fn root_id(&self) -> QuillIndexResult<BlockId> {
        Ok(self.header()?.root_id)
    }

    pub fn set_root_id(&mut self, root_id: BlockId) -> QuillIndexResult<()> {
        let mut header = self.header()?;
        header.root_id = root_id;
        self.write_header(&header)
    }
}
