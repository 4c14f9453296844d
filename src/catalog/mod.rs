//! Restaurant catalog snapshots
//!
//! The catalog store is an external collaborator; this module covers its
//! boundary: reading a full snapshot ([`loader`]), the record shape
//! ([`types`]) and the read-only listing and browse operations served next to
//! autocomplete ([`browse`]).

pub mod browse;
pub mod loader;
pub mod types;

pub use browse::{
    by_cuisine, filter_options, list, BrowseError, CuisinePage, FilterOptions, ListFilters,
    ListQuery, ListSort, RestaurantPage, RestaurantSummary, SortField, SortOrder,
};
pub use loader::{load_catalog, parse_catalog, CatalogError};
pub use types::CatalogRecord;
