pub mod build;
pub mod handle;
pub mod stats;
pub mod trie;
pub mod types;

pub use build::{build_index, build_index_with_report};
pub use handle::{IndexHandle, LoadedCatalog};
pub use trie::{PrefixIndex, TrieNode};
pub use types::*;
