use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::codec::DecodedData;

pub struct CommonCodec;

impl CommonCodec {
    pub fn encode_bool(data: bool) -> Vec<u8> {
        if data {
            vec![1]
        } else {
            vec![0]
        }
    }

    pub fn decode_bool(bytes: &[u8]) -> QuillIndexResult<DecodedData<bool>> {
        if bytes.is_empty() {
            return Err(QuillIndexError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                1
            )));
        }
        Ok((bytes[0] != 0, 1))
    }

    pub fn encode_u16(data: u16) -> Vec<u8> {
        data.to_be_bytes().to_vec()
    }

    pub fn decode_u16(bytes: &[u8]) -> QuillIndexResult<DecodedData<u16>> {
        if bytes.len() < 2 {
            return Err(QuillIndexError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                2
            )));
        }
        let data = [bytes[0], bytes[1]];
        Ok((u16::from_be_bytes(data), 2))
    }

    pub fn encode_i32(data: i32) -> Vec<u8> {
        data.to_be_bytes().to_vec()
    }

    pub fn decode_i32(bytes: &[u8]) -> QuillIndexResult<DecodedData<i32>> {
        if bytes.len() < 4 {
            return Err(QuillIndexError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                4
            )));
        }
        let data = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok((i32::from_be_bytes(data), 4))
    }

    pub fn encode_f32(data: f32) -> Vec<u8> {
        data.to_be_bytes().to_vec()
    }

    pub fn decode_f32(bytes: &[u8]) -> QuillIndexResult<DecodedData<f32>> {
        if bytes.len() < 4 {
            return Err(QuillIndexError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                4
            )));
        }
        let data = [bytes[0], bytes[1], bytes[2], bytes[3]];
        Ok((f32::from_be_bytes(data), 4))
    }

    pub fn encode_f64(data: f64) -> Vec<u8> {
        data.to_be_bytes().to_vec()
    }

    pub fn decode_f64(bytes: &[u8]) -> QuillIndexResult<DecodedData<f64>> {
        if bytes.len() < 8 {
            return Err(QuillIndexError::Storage(format!(
                "bytes length {} is less than {}",
                bytes.len(),
                8
            )));
        }
        let data = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        Ok((f64::from_be_bytes(data), 8))
    }

    pub fn encode_string(data: &str) -> Vec<u8> {
        data.as_bytes().to_vec()
    }

    /// Decodes the whole slice as UTF-8.
    pub fn decode_string(bytes: &[u8]) -> QuillIndexResult<DecodedData<String>> {
        let data = String::from_utf8(bytes.to_vec())
            .map_err(|e| QuillIndexError::Storage(format!("Failed to decode string {}", e)))?;
        Ok((data, bytes.len()))
    }
}
