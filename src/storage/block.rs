use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::codec::CommonCodec;
use std::ops::Range;

pub type BlockId = u16;
pub type RecordPointer = u16;

/// Block 0 always holds the index metadata, so 0 doubles as "no block" in sibling links.
pub const INVALID_BLOCK_ID: BlockId = 0;
pub const BLOCK_SIZE: usize = 4096;

/// Fixed-capacity byte buffer, the unit of storage of an index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    data: Box<[u8]>,
}

impl Block {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn read(&self, offset: usize, len: usize) -> QuillIndexResult<&[u8]> {
        let range = self.checked_range(offset, len)?;
        Ok(&self.data[range])
    }

    pub fn write(&mut self, offset: usize, bytes: &[u8]) -> QuillIndexResult<()> {
        let range = self.checked_range(offset, bytes.len())?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Moves the bytes in `src` so they start at `dest`, overlapping ranges allowed.
    pub fn copy_within(&mut self, src: Range<usize>, dest: usize) -> QuillIndexResult<()> {
        if src.start > src.end {
            return Err(QuillIndexError::Storage(format!(
                "copy source [{}, {}) is reversed",
                src.start, src.end
            )));
        }
        let len = src.end - src.start;
        self.checked_range(src.start, len)?;
        self.checked_range(dest, len)?;
        self.data.copy_within(src, dest);
        Ok(())
    }

    fn checked_range(&self, offset: usize, len: usize) -> QuillIndexResult<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(offset..end),
            _ => Err(QuillIndexError::Storage(format!(
                "access [{}, +{}) is out of block bounds {}",
                offset,
                len,
                self.data.len()
            ))),
        }
    }
}

/// Read cursor over a block that tracks its own offset.
#[derive(Debug)]
pub struct BlockCursor<'a> {
    block: &'a Block,
    offset: usize,
}

impl<'a> BlockCursor<'a> {
    pub fn new(block: &'a Block, offset: usize) -> Self {
        Self { block, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn read_bytes(&mut self, len: usize) -> QuillIndexResult<&'a [u8]> {
        let bytes = self.block.read(self.offset, len)?;
        self.offset += len;
        Ok(bytes)
    }

    pub fn read_u16(&mut self) -> QuillIndexResult<u16> {
        let (value, consumed) = CommonCodec::decode_u16(self.block.read(self.offset, 2)?)?;
        self.offset += consumed;
        Ok(value)
    }

    pub fn skip(&mut self, len: usize) -> QuillIndexResult<()> {
        self.block.read(self.offset, len)?;
        self.offset += len;
        Ok(())
    }
}

/// Write cursor over a block.
#[derive(Debug)]
pub struct BlockWriter<'a> {
    block: &'a mut Block,
    offset: usize,
}

impl<'a> BlockWriter<'a> {
    pub fn new(block: &'a mut Block, offset: usize) -> Self {
        Self { block, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> QuillIndexResult<()> {
        self.block.write(self.offset, bytes)?;
        self.offset += bytes.len();
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> QuillIndexResult<()> {
        self.write_bytes(&CommonCodec::encode_u16(value))
    }
}
