mod internal_page;
mod leaf_page;
mod meta_page;

pub use internal_page::*;
pub use leaf_page::*;
pub use meta_page::*;

/// A block of an index file, typed by the node it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BPlusTreePage {
    Meta(BPlusTreeMetaPage),
    Internal(BPlusTreeInternalPage),
    Leaf(BPlusTreeLeafPage),
}

impl BPlusTreePage {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn page_type(&self) -> BPlusTreePageType {
        match self {
            Self::Meta(_) => BPlusTreePageType::MetaPage,
            Self::Internal(_) => BPlusTreePageType::InternalPage,
            Self::Leaf(_) => BPlusTreePageType::LeafPage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BPlusTreePageType {
    MetaPage,
    LeafPage,
    InternalPage,
}
