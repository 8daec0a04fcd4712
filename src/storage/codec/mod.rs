mod btree_page;
mod common;
mod key;

pub use btree_page::*;
pub use common::CommonCodec;
pub use key::KeyCodec;

// data + consumed offset
pub type DecodedData<T> = (T, usize);
