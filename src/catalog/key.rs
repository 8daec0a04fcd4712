use crate::catalog::KeyType;
use std::cmp::Ordering;

/// A single index key. `Null` stands for an absent column value and is never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Null,
    Boolean(bool),
    Int32(i32),
    Float32(f32),
    Float64(f64),
    Varchar(String),
}

impl Key {
    /// Type of the key, `None` for `Null`.
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            Key::Null => None,
            Key::Boolean(_) => Some(KeyType::Boolean),
            Key::Int32(_) => Some(KeyType::Int32),
            Key::Float32(_) => Some(KeyType::Float32),
            Key::Float64(_) => Some(KeyType::Float64),
            Key::Varchar(_) => Some(KeyType::Varchar),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Key::Null)
    }

    /// Total order between two keys of the same type.
    ///
    /// Floats follow the IEEE total order, booleans order `false` before `true`
    /// and strings compare byte-wise. Comparing keys of different types (or a
    /// `Null`) is a caller bug and panics.
    pub fn compare(&self, other: &Key) -> Ordering {
        match (self, other) {
            (Key::Boolean(a), Key::Boolean(b)) => a.cmp(b),
            (Key::Int32(a), Key::Int32(b)) => a.cmp(b),
            (Key::Float32(a), Key::Float32(b)) => a.total_cmp(b),
            (Key::Float64(a), Key::Float64(b)) => a.total_cmp(b),
            (Key::Varchar(a), Key::Varchar(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => panic!("Cannot compare {:?} with {:?}", self, other),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_null() || self.key_type() != other.key_type() {
            return None;
        }
        Some(self.compare(other))
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Key::Null => write!(f, "NULL"),
            Key::Boolean(v) => write!(f, "{v}"),
            Key::Int32(v) => write!(f, "{v}"),
            Key::Float32(v) => write!(f, "{v}"),
            Key::Float64(v) => write!(f, "{v}"),
            Key::Varchar(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_for_key {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Key {
            fn from(value: $ty) -> Self {
                Key::$variant(value)
            }
        }

        impl From<Option<$ty>> for Key {
            fn from(value: Option<$ty>) -> Self {
                value.map(Key::$variant).unwrap_or(Key::Null)
            }
        }
    };
}

impl_from_for_key!(bool, Boolean);
impl_from_for_key!(i32, Int32);
impl_from_for_key!(f32, Float32);
impl_from_for_key!(f64, Float64);
impl_from_for_key!(String, Varchar);

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Varchar(value.to_string())
    }
}
