mod data_type;
mod key;
pub mod registry;

pub use data_type::KeyType;
pub use key::Key;
pub use registry::*;
