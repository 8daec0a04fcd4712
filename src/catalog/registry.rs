use log::debug;
use std::collections::HashMap;

use crate::catalog::{Key, KeyType};
use crate::error::{QuillIndexError, QuillIndexResult};
use crate::storage::block::{BlockId, RecordPointer};
use crate::storage::index::BPlusTreeIndex;

pub fn index_name(table: &str, column: &str) -> String {
    format!("{}_{}_index", table, column)
}

/// Indexes by name, one per `(table, column)`.
#[derive(Debug, Default)]
pub struct IndexCatalog {
    indexes: HashMap<String, BPlusTreeIndex>,
}

impl IndexCatalog {
    pub fn new() -> Self {
        Self {
            indexes: HashMap::new(),
        }
    }

    /// Builds an index over `rows`. Returns `false` if it already exists.
    pub fn create_index(
        &mut self,
        table: &str,
        column: &str,
        key_type: KeyType,
        order: u16,
        rows: impl IntoIterator<Item = (Key, RecordPointer)>,
    ) -> QuillIndexResult<bool> {
        let name = index_name(table, column);
        if self.indexes.contains_key(&name) {
            return Ok(false);
        }

        let mut index = BPlusTreeIndex::new(order, key_type)?;
        let mut inserted = 0usize;
        for (key, record_pointer) in rows {
            if !key.is_null() {
                inserted += 1;
            }
            index.insert(key, record_pointer)?;
        }
        debug!(
            "created index {} with {} keys over {} blocks",
            name,
            inserted,
            index.num_blocks()
        );
        self.indexes.insert(name, index);
        Ok(true)
    }

    pub fn check_index_exists(&self, table: &str, column: &str) -> bool {
        self.indexes.contains_key(&index_name(table, column))
    }

    pub fn index(&self, table: &str, column: &str) -> QuillIndexResult<&BPlusTreeIndex> {
        let name = index_name(table, column);
        self.indexes
            .get(&name)
            .ok_or_else(|| QuillIndexError::NotFound(format!("index {} not found", name)))
    }

    pub fn search(&self, table: &str, column: &str, key: &Key) -> QuillIndexResult<Option<BlockId>> {
        self.index(table, column)?.search(key)
    }

    pub fn lookup(
        &self,
        table: &str,
        column: &str,
        key: &Key,
    ) -> QuillIndexResult<Option<RecordPointer>> {
        self.index(table, column)?.lookup(key)
    }

    pub fn return_bfs_index(&self, table: &str, column: &str) -> QuillIndexResult<Vec<Key>> {
        self.index(table, column)?.return_bfs()
    }

    pub fn drop_index(&mut self, table: &str, column: &str) -> bool {
        self.indexes.remove(&index_name(table, column)).is_some()
    }

    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.keys().cloned().collect();
        names.sort();
        names
    }
}
