pub mod block;
pub mod codec;
pub mod index;
pub mod page;
