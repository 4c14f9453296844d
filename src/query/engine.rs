use crate::index::trie::PrefixIndex;
use crate::index::types::{EntityEntry, Payload};
use crate::utils::{contains_ignore_case, split_list};
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultItem {
    Cuisine { name: String },
    Restaurant(EntityEntry),
}

impl ResultItem {
    pub fn name(&self) -> &str {
        match self {
            ResultItem::Cuisine { name } => name,
            ResultItem::Restaurant(e) => &e.name,
        }
    }

    pub fn is_cuisine(&self) -> bool {
        matches!(self, ResultItem::Cuisine { .. })
    }
}

/// Bounded autocomplete answer; `total` is always `data.len()`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    pub total: usize,
    pub data: Vec<ResultItem>,
}

impl AutocompleteResponse {
    /// Truncate `items` to `limit` and wrap them
    pub fn from_items(mut items: Vec<ResultItem>, limit: usize) -> Self {
        items.truncate(limit);
        Self {
            total: items.len(),
            data: items,
        }
    }
}

/// Turns raw prefix hits into deduplicated cuisine and restaurant suggestions
pub struct QueryEngine<'a> {
    index: &'a PrefixIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a PrefixIndex) -> Self {
        Self { index }
    }

    /// Autocomplete `query`, returning at most `limit` suggestions.
    ///
    /// Cuisines come before restaurants; within each group suggestions keep
    /// the order in which the trie produced them.
    pub fn autocomplete(&self, query: &str, limit: usize) -> AutocompleteResponse {
        if query.is_empty() {
            return AutocompleteResponse::default();
        }
        AutocompleteResponse::from_items(self.matches(query), limit)
    }

    /// Every suggestion for `query`, unbounded
    pub fn matches(&self, query: &str) -> Vec<ResultItem> {
        if query.is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        let hits = self.index.prefix_lookup(&needle);

        let mut cuisines = OrderedNames::default();
        // Borrowed from the index; cloned once per surviving restaurant
        let mut restaurants: Vec<&EntityEntry> = Vec::new();
        let mut restaurant_slots: AHashMap<&str, usize> = AHashMap::new();

        for hit in hits {
            match hit {
                Payload::Cuisine(cuisine) => {
                    if contains_ignore_case(&cuisine.name, &needle) {
                        cuisines.insert(cuisine.name.trim());
                    }
                }
                Payload::Entity(entity) => {
                    let entity: &EntityEntry = entity;
                    if contains_ignore_case(&entity.name, &needle)
                        || contains_ignore_case(&entity.cuisines, &needle)
                    {
                        match restaurant_slots.get(entity.id.as_str()) {
                            Some(&slot) => restaurants[slot] = entity,
                            None => {
                                restaurant_slots.insert(entity.id.as_str(), restaurants.len());
                                restaurants.push(entity);
                            }
                        }
                    }

                    // Cuisines reachable only through a restaurant's own keys
                    for cuisine in split_list(&entity.cuisines) {
                        if contains_ignore_case(cuisine, &needle) {
                            cuisines.insert(cuisine);
                        }
                    }
                }
            }
        }

        cuisines
            .into_names()
            .into_iter()
            .map(|name| ResultItem::Cuisine { name })
            .chain(
                restaurants
                    .into_iter()
                    .map(|entity| ResultItem::Restaurant(entity.clone())),
            )
            .collect()
    }
}

/// Insertion-ordered set of cuisine names
#[derive(Default)]
struct OrderedNames {
    seen: AHashSet<String>,
    names: Vec<String>,
}

impl OrderedNames {
    fn insert(&mut self, name: &str) {
        if !self.seen.contains(name) {
            self.seen.insert(name.to_string());
            self.names.push(name.to_string());
        }
    }

    fn into_names(self) -> Vec<String> {
        self.names
    }
}
