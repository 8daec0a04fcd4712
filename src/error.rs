use thiserror::Error;

use crate::catalog::KeyType;

pub type QuillIndexResult<T, E = QuillIndexError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum QuillIndexError {
    #[error("Not support: {0}")]
    NotSupport(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Key type mismatch: index expects {expected}, got {found}")]
    KeyTypeMismatch { expected: KeyType, found: KeyType },
}
