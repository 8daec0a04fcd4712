pub mod catalog;
pub mod config;
pub mod error;
pub mod storage;
pub mod utils;

pub use catalog::{IndexCatalog, Key, KeyType};
pub use config::BTreeConfig;
pub use error::{QuillIndexError, QuillIndexResult};
pub use storage::block::{BlockId, RecordPointer};
pub use storage::index::{BPlusTreeIndex, CompareOp, LeafIterator};
