//! Character trie with per-node payload accumulation
//!
//! Every insertion appends its payload to each node along the key's path, so
//! a prefix lookup is a single walk down the tree with no subtree traversal.
//! Keys are lowercased on the way in and on the way out.

use crate::index::types::Payload;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Default)]
pub struct TrieNode {
    children: FxHashMap<char, TrieNode>,
    is_terminal: bool,
    entries: Vec<Payload>,
}

impl TrieNode {
    pub fn child(&self, ch: char) -> Option<&TrieNode> {
        self.children.get(&ch)
    }

    pub fn children_len(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = (char, &TrieNode)> {
        self.children.iter().map(|(&ch, node)| (ch, node))
    }

    /// True iff some inserted key ends exactly here
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Payloads of every key passing through this node, in insertion order
    pub fn entries(&self) -> &[Payload] {
        &self.entries
    }
}

/// Prefix index over lowercased keys
#[derive(Debug, Default)]
pub struct PrefixIndex {
    root: TrieNode,
    node_count: usize,
    key_count: usize,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` with `payload`. The empty key is ignored.
    pub fn insert(&mut self, key: &str, payload: Payload) {
        if key.is_empty() {
            return;
        }

        let key = key.to_lowercase();
        let mut node = &mut self.root;

        for ch in key.chars() {
            node = match node.children.entry(ch) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    self.node_count += 1;
                    e.insert(TrieNode::default())
                }
            };
            node.entries.push(payload.clone());
        }

        node.is_terminal = true;
        self.key_count += 1;
    }

    /// All payloads whose key starts with `prefix`, duplicates included.
    ///
    /// Returns an empty slice when no key has this prefix. The empty prefix
    /// resolves to the root, which never holds entries.
    pub fn prefix_lookup(&self, prefix: &str) -> &[Payload] {
        match self.find_node(prefix) {
            Some(node) => node.entries(),
            None => &[],
        }
    }

    /// True iff `key` was inserted exactly
    pub fn contains_key(&self, key: &str) -> bool {
        !key.is_empty() && self.find_node(key).is_some_and(TrieNode::is_terminal)
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn key_count(&self) -> usize {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    fn find_node(&self, prefix: &str) -> Option<&TrieNode> {
        let prefix = prefix.to_lowercase();
        let mut node = &self.root;
        for ch in prefix.chars() {
            node = node.child(ch)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::types::EntityEntry;

    fn entity(id: &str, name: &str) -> Payload {
        Payload::entity(EntityEntry {
            id: id.to_string(),
            name: name.to_string(),
            location: String::new(),
            address: String::new(),
            cuisines: String::new(),
            rating: String::new(),
            rating_value: 0.0,
            vote_count: String::new(),
            vote_value: 0,
            online_order: false,
            book_table: false,
            category: String::new(),
        })
    }

    #[test]
    fn test_every_prefix_contains_payload() {
        let mut index = PrefixIndex::new();
        let payload = entity("1", "Pizza Hut");
        index.insert("pizza hut", payload.clone());

        let key: Vec<char> = "pizza hut".chars().collect();
        for i in 1..=key.len() {
            let prefix: String = key[..i].iter().collect();
            let hits = index.prefix_lookup(&prefix);
            assert!(!hits.is_empty(), "prefix {:?} had no hits", prefix);
            assert!(hits.contains(&payload));
        }
    }

    #[test]
    fn test_unknown_prefix_is_empty() {
        let mut index = PrefixIndex::new();
        index.insert("pizza hut", entity("1", "Pizza Hut"));

        assert!(index.prefix_lookup("xyz").is_empty());
        assert!(index.prefix_lookup("pizzas").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let mut index = PrefixIndex::new();
        index.insert("KFC", entity("1", "KFC"));

        assert_eq!(index.prefix_lookup("kfc"), index.prefix_lookup("KfC"));
        assert_eq!(index.prefix_lookup("kfc").len(), 1);
        assert!(index.contains_key("kfc"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut index = PrefixIndex::new();
        index.insert("", entity("1", "Ghost"));

        assert!(index.is_empty());
        assert_eq!(index.node_count(), 0);
        assert!(!index.root().is_terminal());
        assert!(index.prefix_lookup("").is_empty());
        assert!(!index.contains_key(""));
    }

    #[test]
    fn test_entries_accumulate_in_insertion_order() {
        let mut index = PrefixIndex::new();
        let hut = entity("1", "Pizza Hut");
        let pizza_cuisine = Payload::cuisine("Pizza");

        index.insert("pizza hut", hut.clone());
        index.insert("pizza", pizza_cuisine.clone());
        index.insert("hut", hut.clone());

        assert_eq!(index.prefix_lookup("pi"), &[hut.clone(), pizza_cuisine.clone()]);
        assert_eq!(index.prefix_lookup("h"), &[hut.clone()]);
        assert!(index.contains_key("pizza"));
        assert!(!index.contains_key("pizz"));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut index = PrefixIndex::new();
        let cafe = entity("1", "Cafe Cafe");
        index.insert("cafe cafe", cafe.clone());
        index.insert("cafe", cafe.clone());
        index.insert("cafe", cafe.clone());

        assert_eq!(index.prefix_lookup("caf").len(), 3);
        assert_eq!(index.key_count(), 3);
    }

    #[test]
    fn test_node_count_shares_prefixes() {
        let mut index = PrefixIndex::new();
        index.insert("cafe", Payload::cuisine("Cafe"));
        index.insert("cake", Payload::cuisine("Cake"));

        // c, a, f, e, k, e
        assert_eq!(index.node_count(), 6);
        assert_eq!(index.root().children_len(), 1);
    }

    #[test]
    fn test_non_alphanumeric_characters() {
        let mut index = PrefixIndex::new();
        let dominos = entity("1", "Domino's");
        index.insert("domino's", dominos.clone());
        index.insert("#1 café & bar", Payload::cuisine("odd"));

        assert_eq!(index.prefix_lookup("DOMINO'"), &[dominos]);
        assert_eq!(index.prefix_lookup("#1 CAFÉ &").len(), 1);
        assert!(index.prefix_lookup("domino!").is_empty());
    }
}
