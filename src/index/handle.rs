//! The published index and its atomic replacement
//!
//! A [`LoadedCatalog`] bundles one immutable index with the snapshot it was
//! built from and a query cache. [`IndexHandle`] publishes the current one
//! behind `RwLock<Arc<_>>`: readers clone the `Arc` and release the lock
//! before querying, and a rebuild swaps the pointer only after the new index
//! is complete.

use crate::catalog::{self, CatalogRecord};
use crate::index::build::build_index_with_report;
use crate::index::trie::PrefixIndex;
use crate::index::types::{BuildReport, IndexConfig};
use crate::query::{AutocompleteResponse, QueryEngine, ResultItem};
use anyhow::{Context, Result};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// A built index together with its source snapshot
pub struct LoadedCatalog {
    /// Catalog file the snapshot came from (None for in-memory snapshots)
    pub source: Option<PathBuf>,
    pub records: Vec<CatalogRecord>,
    pub index: PrefixIndex,
    pub report: BuildReport,
    /// Incremented on every publish
    pub generation: u64,
    /// Full (untruncated) suggestion lists keyed by lowercased query
    query_cache: Option<Mutex<LruCache<String, Vec<ResultItem>>>>,
}

impl LoadedCatalog {
    /// Build from an in-memory snapshot
    pub fn from_records(
        records: Vec<CatalogRecord>,
        source: Option<PathBuf>,
        config: &IndexConfig,
        cache_size: usize,
        silent: bool,
    ) -> Self {
        let (index, report) = build_index_with_report(&records, config, silent);
        Self {
            source,
            records,
            index,
            report,
            generation: 0,
            query_cache: NonZeroUsize::new(cache_size).map(|n| Mutex::new(LruCache::new(n))),
        }
    }

    /// Load a snapshot from disk and build it
    pub fn load(path: &Path, config: &IndexConfig, cache_size: usize, silent: bool) -> Result<Self> {
        let records = catalog::load_catalog(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?;
        Ok(Self::from_records(
            records,
            Some(path.to_path_buf()),
            config,
            cache_size,
            silent,
        ))
    }

    pub fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.index)
    }

    /// Autocomplete through the query cache.
    ///
    /// Returns the response and whether it was served from cache.
    pub fn autocomplete(&self, query: &str, limit: usize) -> (AutocompleteResponse, bool) {
        if query.is_empty() {
            return (AutocompleteResponse::default(), false);
        }

        let Some(cache) = &self.query_cache else {
            return (self.engine().autocomplete(query, limit), false);
        };

        // Matching is case-insensitive, so the lowercased query is a sound key
        let key = query.to_lowercase();

        if let Some(items) = cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return (AutocompleteResponse::from_items(items.clone(), limit), true);
        }

        let items = self.engine().matches(query);
        let response = AutocompleteResponse::from_items(items.clone(), limit);
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, items);

        (response, false)
    }
}

/// Holder of the currently published [`LoadedCatalog`]
pub struct IndexHandle {
    current: RwLock<Arc<LoadedCatalog>>,
    /// Serializes rebuilds; never held by readers
    rebuild: Mutex<()>,
}

impl IndexHandle {
    pub fn new(mut initial: LoadedCatalog) -> Self {
        initial.generation = 1;
        Self {
            current: RwLock::new(Arc::new(initial)),
            rebuild: Mutex::new(()),
        }
    }

    /// Snapshot of the published catalog; hold it for one request only
    pub fn current(&self) -> Arc<LoadedCatalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publish `next`, returning the catalog it replaced
    pub fn publish(&self, next: LoadedCatalog) -> Arc<LoadedCatalog> {
        self.swap(next).1
    }

    /// Install `next` as the successor of the published catalog.
    ///
    /// The generation is assigned under the write lock, so the published
    /// generation only ever grows and each value is published exactly once.
    fn swap(&self, mut next: LoadedCatalog) -> (Arc<LoadedCatalog>, Arc<LoadedCatalog>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        next.generation = guard.generation + 1;
        let next = Arc::new(next);
        let previous = std::mem::replace(&mut *guard, Arc::clone(&next));
        (next, previous)
    }

    /// Build a replacement with `build` and publish it.
    ///
    /// Rebuilds run one at a time. If `build` fails the current catalog stays
    /// published.
    pub fn rebuild_with<F>(&self, build: F) -> Result<Arc<LoadedCatalog>>
    where
        F: FnOnce(&LoadedCatalog) -> Result<LoadedCatalog>,
    {
        let _serial = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current();
        let next = build(&current)?;
        drop(current);

        let (published, _) = self.swap(next);
        tracing::info!(
            generation = published.generation,
            records = published.report.records,
            keys = published.report.keys,
            "catalog index published"
        );
        Ok(published)
    }
}
