use crate::error::QuillIndexResult;
use crate::storage::codec::{CommonCodec, DecodedData};
use crate::storage::page::{
    BPlusTreeInternalPageHeader, BPlusTreeLeafPageHeader, BPlusTreeMetaPageHeader,
};

pub struct BPlusTreeMetaPageCodec;

impl BPlusTreeMetaPageCodec {
    pub fn encode(header: &BPlusTreeMetaPageHeader) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BPlusTreeMetaPageHeader::SIZE);
        bytes.extend(CommonCodec::encode_u16(header.order));
        bytes.extend(CommonCodec::encode_u16(header.root_id));
        bytes
    }

    pub fn decode(bytes: &[u8]) -> QuillIndexResult<DecodedData<BPlusTreeMetaPageHeader>> {
        let mut left_bytes = bytes;

        let (order, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        let (root_id, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        Ok((
            BPlusTreeMetaPageHeader { order, root_id },
            bytes.len() - left_bytes.len(),
        ))
    }
}

pub struct BPlusTreeLeafPageHeaderCodec;

impl BPlusTreeLeafPageHeaderCodec {
    pub fn encode(header: &BPlusTreeLeafPageHeader) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BPlusTreeLeafPageHeader::SIZE);
        bytes.extend(CommonCodec::encode_u16(header.num_entries));
        bytes.extend(CommonCodec::encode_u16(header.prev_leaf_id));
        bytes.extend(CommonCodec::encode_u16(header.next_leaf_id));
        bytes.extend(CommonCodec::encode_u16(header.next_free_offset));
        bytes
    }

    pub fn decode(bytes: &[u8]) -> QuillIndexResult<DecodedData<BPlusTreeLeafPageHeader>> {
        let mut left_bytes = bytes;

        let (num_entries, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        let (prev_leaf_id, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        let (next_leaf_id, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        let (next_free_offset, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        Ok((
            BPlusTreeLeafPageHeader {
                num_entries,
                prev_leaf_id,
                next_leaf_id,
                next_free_offset,
            },
            bytes.len() - left_bytes.len(),
        ))
    }
}

pub struct BPlusTreeInternalPageHeaderCodec;

impl BPlusTreeInternalPageHeaderCodec {
    pub fn encode(header: &BPlusTreeInternalPageHeader) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BPlusTreeInternalPageHeader::SIZE);
        bytes.extend(CommonCodec::encode_u16(header.num_keys));
        bytes.extend(CommonCodec::encode_u16(header.next_free_offset));
        bytes.extend(CommonCodec::encode_u16(header.first_child));
        bytes
    }

    pub fn decode(bytes: &[u8]) -> QuillIndexResult<DecodedData<BPlusTreeInternalPageHeader>> {
        let mut left_bytes = bytes;

        let (num_keys, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        let (next_free_offset, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        let (first_child, offset) = CommonCodec::decode_u16(left_bytes)?;
        left_bytes = &left_bytes[offset..];

        Ok((
            BPlusTreeInternalPageHeader {
                num_keys,
                next_free_offset,
                first_child,
            },
            bytes.len() - left_bytes.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_header_layout() {
        let header = BPlusTreeLeafPageHeader {
            num_entries: 3,
            prev_leaf_id: 1,
            next_leaf_id: 0x0102,
            next_free_offset: 32,
        };
        let bytes = BPlusTreeLeafPageHeaderCodec::encode(&header);
        assert_eq!(bytes, vec![0, 3, 0, 1, 1, 2, 0, 32]);
        assert_eq!(
            BPlusTreeLeafPageHeaderCodec::decode(&bytes).unwrap(),
            (header, 8)
        );
    }

    #[test]
    fn internal_header_layout() {
        let header = BPlusTreeInternalPageHeader {
            num_keys: 1,
            next_free_offset: 14,
            first_child: 1,
        };
        let bytes = BPlusTreeInternalPageHeaderCodec::encode(&header);
        assert_eq!(bytes, vec![0, 1, 0, 14, 0, 1]);
        assert_eq!(
            BPlusTreeInternalPageHeaderCodec::decode(&bytes).unwrap(),
            (header, 6)
        );
    }

    #[test]
    fn meta_header_layout() {
        let header = BPlusTreeMetaPageHeader {
            order: 4,
            root_id: 3,
        };
        let bytes = BPlusTreeMetaPageCodec::encode(&header);
        assert_eq!(bytes, vec![0, 4, 0, 3]);
        assert_eq!(BPlusTreeMetaPageCodec::decode(&bytes).unwrap(), (header, 4));
        assert!(BPlusTreeMetaPageCodec::decode(&bytes[..3]).is_err());
    }
}
