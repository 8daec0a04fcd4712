use crate::catalog::{Key, KeyType};
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::codec::{CommonCodec, DecodedData};

/// Byte encoding of index keys as stored inside leaf and internal blocks.
///
/// Numbers are big-endian, booleans take one byte and strings are stored as
/// their raw UTF-8 bytes. The length prefix lives in the node entry, not here.
pub struct KeyCodec;

impl KeyCodec {
    pub fn encode(key: &Key) -> Vec<u8> {
        match key {
            Key::Null => vec![],
            Key::Boolean(v) => CommonCodec::encode_bool(*v),
            Key::Int32(v) => CommonCodec::encode_i32(*v),
            Key::Float32(v) => CommonCodec::encode_f32(*v),
            Key::Float64(v) => CommonCodec::encode_f64(*v),
            Key::Varchar(v) => CommonCodec::encode_string(v),
        }
    }

    /// Encoded length in bytes. For strings this is the UTF-8 byte length.
    pub fn encoded_len(key: &Key) -> usize {
        match key {
            Key::Null => 0,
            Key::Boolean(_) => 1,
            Key::Int32(_) | Key::Float32(_) => 4,
            Key::Float64(_) => 8,
            Key::Varchar(v) => v.len(),
        }
    }

    /// Decodes exactly `bytes` as a key of `key_type`.
    pub fn decode(bytes: &[u8], key_type: KeyType) -> QuillIndexResult<DecodedData<Key>> {
        if let Some(width) = key_type.fixed_width() {
            if bytes.len() != width {
                return Err(QuillIndexError::Storage(format!(
                    "stored {} key length {} does not match width {}",
                    key_type,
                    bytes.len(),
                    width
                )));
            }
        }
        match key_type {
            KeyType::Boolean => {
                let (value, offset) = CommonCodec::decode_bool(bytes)?;
                Ok((Key::Boolean(value), offset))
            }
            KeyType::Int32 => {
                let (value, offset) = CommonCodec::decode_i32(bytes)?;
                Ok((Key::Int32(value), offset))
            }
            KeyType::Float32 => {
                let (value, offset) = CommonCodec::decode_f32(bytes)?;
                Ok((Key::Float32(value), offset))
            }
            KeyType::Float64 => {
                let (value, offset) = CommonCodec::decode_f64(bytes)?;
                Ok((Key::Float64(value), offset))
            }
            KeyType::Varchar => {
                let (value, offset) = CommonCodec::decode_string(bytes)?;
                Ok((Key::Varchar(value), offset))
            }
        }
    }
}
