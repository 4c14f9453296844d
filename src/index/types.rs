use crate::catalog::CatalogRecord;
use crate::utils::MIN_TOKEN_CHARS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Restaurant payload stored in the trie.
///
/// Built once per catalog record and shared (via `Arc`) by every key derived
/// from that record, so duplicates along trie paths are pointer copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub id: String,
    pub name: String,
    pub location: String,
    pub address: String,
    /// Raw comma-joined cuisines string
    pub cuisines: String,
    pub rating: String,
    pub rating_value: f64,
    pub vote_count: String,
    pub vote_value: u64,
    pub online_order: bool,
    pub book_table: bool,
    pub category: String,
}

impl EntityEntry {
    pub fn from_record(record: &CatalogRecord, position: usize) -> Self {
        Self {
            id: record.id_or_position(position),
            name: record.name.clone(),
            location: record.location.clone(),
            address: record.address.clone(),
            cuisines: record.cuisines.clone(),
            rating: record.rate.clone(),
            rating_value: record.rate_num,
            vote_count: record.votes.clone(),
            vote_value: record.votes_num,
            online_order: record.online_order,
            book_table: record.book_table,
            category: record.rest_type.clone(),
        }
    }
}

/// Cuisine payload stored in the trie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineEntry {
    pub name: String,
}

/// Data attached to every node along an inserted key's path
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Entity(Arc<EntityEntry>),
    Cuisine(Arc<CuisineEntry>),
}

impl Payload {
    pub fn entity(entry: EntityEntry) -> Self {
        Payload::Entity(Arc::new(entry))
    }

    pub fn cuisine(name: impl Into<String>) -> Self {
        Payload::Cuisine(Arc::new(CuisineEntry { name: name.into() }))
    }

    pub fn name(&self) -> &str {
        match self {
            Payload::Entity(e) => &e.name,
            Payload::Cuisine(c) => &c.name,
        }
    }
}

/// Configuration for the index builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Derive keys across threads (insertion order stays catalog order)
    pub parallel: bool,
    /// Name and cuisine tokens shorter than this are not indexed on their own
    pub min_token_chars: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_token_chars: MIN_TOKEN_CHARS,
        }
    }
}

/// Summary of one index build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Records in the snapshot
    pub records: usize,
    /// Records that produced at least one key
    pub indexed: usize,
    /// Records skipped for lacking a name
    pub skipped: usize,
    /// Accepted key insertions
    pub keys: usize,
    /// Trie nodes, excluding the root
    pub nodes: usize,
    pub elapsed_ms: f64,
}
