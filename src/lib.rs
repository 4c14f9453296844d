//! # Savor - Restaurant and Cuisine Autocomplete
//!
//! Savor builds an in-memory prefix index over a restaurant catalog and
//! answers type-ahead queries with cuisine and restaurant suggestions.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`catalog`] - Catalog snapshot loading, normalization and browsing
//! - [`index`] - The prefix trie, the builder and the swappable published index
//! - [`query`] - Autocomplete: prefix lookup, filtering and deduplication
//! - [`server`] - Persistent daemon that keeps the index warm
//! - [`tui`] - Interactive type-ahead terminal UI
//! - [`output`] - Colored terminal output
//! - [`utils`] - Configuration, tokenizing, progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use savor::catalog::load_catalog;
//! use savor::index::build_index;
//! use savor::query::QueryEngine;
//! use std::path::Path;
//!
//! let records = load_catalog(Path::new("restaurants.json")).unwrap();
//! let index = build_index(&records);
//!
//! let response = QueryEngine::new(&index).autocomplete("piz", 10);
//! for item in &response.data {
//!     println!("{}", item.name());
//! }
//! ```
//!
//! ## Concurrency
//!
//! A built [`index::PrefixIndex`] is immutable and shared freely between
//! threads. Rebuilds go through [`index::IndexHandle`], which publishes a new
//! index atomically; readers never observe a partially built trie.

pub mod catalog;
pub mod index;
pub mod output;
pub mod query;
pub mod server;
#[cfg(feature = "interactive")]
pub mod tui;
pub mod utils;
