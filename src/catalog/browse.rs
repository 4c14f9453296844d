//! Catalog browsing: the filtered and sorted restaurant listing, restaurants
//! by cuisine and filter option listing

use crate::catalog::types::CatalogRecord;
use crate::utils::{contains_ignore_case, split_list};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

/// Largest page size accepted by [`by_cuisine`]
pub const MAX_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowseError {
    #[error("Cuisine name must not be empty")]
    EmptyName,

    #[error("Page must be at least 1 (got {0})")]
    InvalidPage(usize),

    #[error("Limit must be between 1 and {MAX_PAGE_LIMIT} (got {0})")]
    InvalidLimit(usize),

    #[error("Unknown sort field '{0}'")]
    UnknownSortField(String),

    #[error("Unknown filter '{0}' (expected cuisines, rest_type, location, online_order or book_table)")]
    UnknownFilter(String),

    #[error("Invalid yes/no value '{0}'")]
    InvalidFlag(String),
}

fn validate_page(page: usize, limit: usize) -> Result<(), BrowseError> {
    if page < 1 {
        return Err(BrowseError::InvalidPage(page));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(BrowseError::InvalidLimit(limit));
    }
    Ok(())
}

/// Compact restaurant view returned by cuisine browsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub id: String,
    pub name: String,
    pub location: String,
    pub address: String,
    pub cuisines: String,
    pub rate: String,
    pub votes: String,
}

impl RestaurantSummary {
    /// Display fields of `record`, found at catalog `position`
    pub fn from_record(record: &CatalogRecord, position: usize) -> Self {
        let rate = if !record.rate.is_empty() {
            record.rate.clone()
        } else if record.rate_num > 0.0 {
            record.rate_num.to_string()
        } else {
            "N/A".to_string()
        };

        let votes = if !record.votes.is_empty() {
            record.votes.clone()
        } else {
            record.votes_num.to_string()
        };

        Self {
            id: record.id_or_position(position),
            name: record.name.clone(),
            location: record.location.clone(),
            address: record.address.clone(),
            cuisines: record.cuisines.clone(),
            rate,
            votes,
        }
    }
}

/// One page of restaurants serving a cuisine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuisinePage {
    pub total_records: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub limit: usize,
    pub data: Vec<RestaurantSummary>,
}

/// Distinct values available for catalog filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub online_order: Vec<bool>,
    pub book_table: Vec<bool>,
    pub location: Vec<String>,
    pub rest_type: Vec<String>,
    pub cuisines: Vec<String>,
}

/// Record field a listing can be sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Numeric rating (`rateNum`)
    Rate,
    /// Numeric vote count (`votesNum`)
    Votes,
    Name,
    Location,
    Address,
    Cuisines,
    RestType,
    OnlineOrder,
    BookTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Listing order, written `<field>_<asc|desc>` on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl ListSort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    fn compare(&self, a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
        let ord = match self.field {
            SortField::Rate => a.rate_num.total_cmp(&b.rate_num),
            SortField::Votes => a.votes_num.cmp(&b.votes_num),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Location => a.location.cmp(&b.location),
            SortField::Address => a.address.cmp(&b.address),
            SortField::Cuisines => a.cuisines.cmp(&b.cuisines),
            SortField::RestType => a.rest_type.cmp(&b.rest_type),
            SortField::OnlineOrder => a.online_order.cmp(&b.online_order),
            SortField::BookTable => a.book_table.cmp(&b.book_table),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

impl FromStr for ListSort {
    type Err = BrowseError;

    /// Parse `rate_desc`, `votes_asc`, `name_asc`, ... A missing or
    /// unrecognized direction suffix means descending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (key, order) = match s.rsplit_once('_') {
            Some((key, "asc")) => (key, SortOrder::Asc),
            Some((key, "desc")) => (key, SortOrder::Desc),
            _ => (s.as_str(), SortOrder::Desc),
        };

        let field = match key {
            "rate" | "ratenum" => SortField::Rate,
            "votes" | "votesnum" => SortField::Votes,
            "name" => SortField::Name,
            "location" => SortField::Location,
            "address" => SortField::Address,
            "cuisines" => SortField::Cuisines,
            "rest_type" => SortField::RestType,
            "online_order" => SortField::OnlineOrder,
            "book_table" => SortField::BookTable,
            _ => return Err(BrowseError::UnknownSortField(key.to_string())),
        };

        Ok(Self::new(field, order))
    }
}

/// Listing filters. Every non-empty field must match.
///
/// `cuisines` and `rest_type` match when the record's comma-joined string
/// contains any of the values (case-insensitive). `location` and the flags
/// match exact values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListFilters {
    pub cuisines: Vec<String>,
    pub rest_type: Vec<String>,
    pub location: Vec<String>,
    pub online_order: Vec<bool>,
    pub book_table: Vec<bool>,
}

impl ListFilters {
    /// Add comma-separated `values` to the filter named `field`
    pub fn add(&mut self, field: &str, values: &str) -> Result<(), BrowseError> {
        let values = split_list(values);
        match field.trim() {
            "cuisines" => self.cuisines.extend(values.map(str::to_string)),
            "rest_type" => self.rest_type.extend(values.map(str::to_string)),
            "location" => self.location.extend(values.map(str::to_string)),
            "online_order" => {
                for value in values {
                    self.online_order.push(parse_flag(value)?);
                }
            }
            "book_table" => {
                for value in values {
                    self.book_table.push(parse_flag(value)?);
                }
            }
            other => return Err(BrowseError::UnknownFilter(other.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.cuisines.is_empty()
            && self.rest_type.is_empty()
            && self.location.is_empty()
            && self.online_order.is_empty()
            && self.book_table.is_empty()
    }

    pub fn matches(&self, record: &CatalogRecord) -> bool {
        contains_any(&record.cuisines, &self.cuisines)
            && contains_any(&record.rest_type, &self.rest_type)
            && (self.location.is_empty()
                || self.location.iter().any(|l| l.trim() == record.location.trim()))
            && (self.online_order.is_empty() || self.online_order.contains(&record.online_order))
            && (self.book_table.is_empty() || self.book_table.contains(&record.book_table))
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.is_empty()
        || needles
            .iter()
            .any(|n| contains_ignore_case(haystack, &n.trim().to_lowercase()))
}

fn parse_flag(value: &str) -> Result<bool, BrowseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        _ => Err(BrowseError::InvalidFlag(value.to_string())),
    }
}

/// Parameters of [`list`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filters: ListFilters,
    /// None keeps catalog order
    #[serde(default)]
    pub sort: Option<ListSort>,
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: ListFilters::default(),
            sort: None,
            page: 1,
            limit: 10,
        }
    }
}

/// One page of the filtered, sorted listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantPage {
    /// Records matching the filters, across all pages
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    /// Full records; `id` is always set
    pub data: Vec<CatalogRecord>,
}

/// Filter, sort and paginate the catalog.
///
/// Sorting is stable: records that compare equal keep catalog order.
pub fn list(records: &[CatalogRecord], query: &ListQuery) -> Result<RestaurantPage, BrowseError> {
    validate_page(query.page, query.limit)?;

    let mut matching: Vec<(usize, &CatalogRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| query.filters.matches(r))
        .collect();

    if let Some(sort) = &query.sort {
        matching.sort_by(|a, b| sort.compare(a.1, b.1));
    }

    let total = matching.len();
    let skip = (query.page - 1).saturating_mul(query.limit);

    let data = matching
        .into_iter()
        .skip(skip)
        .take(query.limit)
        .map(|(pos, r)| CatalogRecord {
            id: Some(r.id_or_position(pos)),
            ..r.clone()
        })
        .collect();

    Ok(RestaurantPage {
        total,
        page: query.page,
        limit: query.limit,
        data,
    })
}

/// List restaurants whose cuisines mention `name`, sorted by restaurant name
pub fn by_cuisine(
    records: &[CatalogRecord],
    name: &str,
    page: usize,
    limit: usize,
) -> Result<CuisinePage, BrowseError> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Err(BrowseError::EmptyName);
    }
    validate_page(page, limit)?;

    let mut matching: Vec<(usize, &CatalogRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| contains_ignore_case(&r.cuisines, &needle))
        .collect();

    // Stable: equal names keep catalog order
    matching.sort_by(|a, b| a.1.name.cmp(&b.1.name));

    let total_records = matching.len();
    let total_pages = total_records.div_ceil(limit);
    let skip = (page - 1).saturating_mul(limit);

    let data = matching
        .into_iter()
        .skip(skip)
        .take(limit)
        .map(|(pos, r)| RestaurantSummary::from_record(r, pos))
        .collect();

    Ok(CuisinePage {
        total_records,
        total_pages,
        current_page: page,
        limit,
        data,
    })
}

/// Collect sorted distinct filter values across the catalog
pub fn filter_options(records: &[CatalogRecord]) -> FilterOptions {
    let mut online_order = BTreeSet::new();
    let mut book_table = BTreeSet::new();
    let mut location = BTreeSet::new();
    let mut rest_type = BTreeSet::new();
    let mut cuisines = BTreeSet::new();

    for record in records {
        online_order.insert(record.online_order);
        book_table.insert(record.book_table);

        let loc = record.location.trim();
        if !loc.is_empty() {
            location.insert(loc.to_string());
        }
        rest_type.extend(split_list(&record.rest_type).map(str::to_string));
        cuisines.extend(split_list(&record.cuisines).map(str::to_string));
    }

    FilterOptions {
        online_order: online_order.into_iter().collect(),
        book_table: book_table.into_iter().collect(),
        location: location.into_iter().collect(),
        rest_type: rest_type.into_iter().collect(),
        cuisines: cuisines.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, cuisines: &str) -> CatalogRecord {
        CatalogRecord {
            id: Some(name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            cuisines: cuisines.to_string(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<CatalogRecord> {
        vec![
            record("Pizza Hut", "Pizza, Fast Food"),
            record("Domino's", "Pizza"),
            record("Truffles", "Cafe, American, Burger"),
            record("Chianti", "Italian, Pizza"),
            record("Empire", "North Indian, Mughlai"),
        ]
    }

    #[test]
    fn test_by_cuisine_sorted_and_paginated() {
        let records = sample();
        let page = by_cuisine(&records, " pizza ", 1, 2).unwrap();

        assert_eq!(page.total_records, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 1);
        let names: Vec<_> = page.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Chianti", "Domino's"]);

        let page2 = by_cuisine(&records, "PIZZA", 2, 2).unwrap();
        let names: Vec<_> = page2.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pizza Hut"]);
    }

    fn rated(id: &str, name: &str, rate: f64, votes: u64) -> CatalogRecord {
        CatalogRecord {
            id: Some(id.to_string()),
            rate_num: rate,
            votes_num: votes,
            ..record(name, "Cafe")
        }
    }

    fn ids(page: &RestaurantPage) -> Vec<&str> {
        page.data.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    fn sorted(records: &[CatalogRecord], sort: &str) -> Vec<String> {
        let query = ListQuery {
            sort: Some(sort.parse().unwrap()),
            limit: MAX_PAGE_LIMIT,
            ..Default::default()
        };
        ids(&list(records, &query).unwrap())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_list_sort_by_rate() {
        let records = vec![
            rated("a", "Onesta", 4.6, 2556),
            rated("b", "Empire", 4.1, 4884),
            rated("c", "Truffles", 4.7, 14726),
        ];
        assert_eq!(sorted(&records, "rate_desc"), vec!["c", "a", "b"]);
        assert_eq!(sorted(&records, "rate_asc"), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_list_sort_by_votes() {
        let records = vec![
            rated("a", "Onesta", 4.6, 2556),
            rated("b", "Empire", 4.1, 4884),
            rated("c", "Truffles", 4.7, 14726),
        ];
        assert_eq!(sorted(&records, "votes_desc"), vec!["c", "b", "a"]);
        assert_eq!(sorted(&records, "votes_asc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_list_sort_by_named_field() {
        let records = vec![
            rated("a", "Onesta", 4.6, 2556),
            rated("b", "Empire", 4.1, 4884),
            rated("c", "Truffles", 4.7, 14726),
        ];
        assert_eq!(sorted(&records, "name_asc"), vec!["b", "a", "c"]);
        assert_eq!(sorted(&records, "name_desc"), vec!["c", "a", "b"]);
        // No direction suffix sorts descending
        assert_eq!(sorted(&records, "name"), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_list_sort_ties_keep_catalog_order() {
        let records = vec![
            rated("a", "One", 4.0, 10),
            rated("b", "Two", 4.0, 10),
            rated("c", "Three", 3.0, 10),
        ];
        assert_eq!(sorted(&records, "rate_desc"), vec!["a", "b", "c"]);
        assert_eq!(sorted(&records, "votes_asc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_list_without_sort_keeps_catalog_order() {
        let records = sample();
        let page = list(&records, &ListQuery::default()).unwrap();
        assert_eq!(page.total, 5);
        let names: Vec<_> = page.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pizza Hut", "Domino's", "Truffles", "Chianti", "Empire"]);
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            "rate_desc".parse::<ListSort>().unwrap(),
            ListSort::new(SortField::Rate, SortOrder::Desc)
        );
        assert_eq!(
            "rest_type_asc".parse::<ListSort>().unwrap(),
            ListSort::new(SortField::RestType, SortOrder::Asc)
        );
        assert_eq!(
            "rest_type".parse::<ListSort>().unwrap(),
            ListSort::new(SortField::RestType, SortOrder::Desc)
        );
        assert_eq!(
            "Votes_ASC".parse::<ListSort>().unwrap(),
            ListSort::new(SortField::Votes, SortOrder::Asc)
        );
        assert_eq!(
            "stars_asc".parse::<ListSort>(),
            Err(BrowseError::UnknownSortField("stars".to_string()))
        );
    }

    #[test]
    fn test_list_cuisine_filter_matches_any_value() {
        let records = sample();
        let mut filters = ListFilters::default();
        filters.add("cuisines", "burger, MUGHLAI").unwrap();

        let page = list(&records, &ListQuery { filters, ..Default::default() }).unwrap();
        let names: Vec<_> = page.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Truffles", "Empire"]);
    }

    #[test]
    fn test_list_filters_combine() {
        let mut records = sample();
        records[0].location = "BTM".to_string();
        records[0].online_order = true;
        records[1].location = "BTM".to_string();
        records[3].location = "Indiranagar".to_string();
        records[3].online_order = true;

        let mut filters = ListFilters::default();
        filters.add("cuisines", "pizza").unwrap();
        filters.add("location", "BTM, Indiranagar").unwrap();
        filters.add("online_order", "yes").unwrap();

        let page = list(&records, &ListQuery { filters, ..Default::default() }).unwrap();
        let names: Vec<_> = page.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pizza Hut", "Chianti"]);
    }

    #[test]
    fn test_list_location_is_exact() {
        let mut records = sample();
        records[0].location = "BTM".to_string();
        records[1].location = "BTM Layout".to_string();

        let mut filters = ListFilters::default();
        filters.add("location", "btm").unwrap();
        assert_eq!(list(&records, &ListQuery { filters, ..Default::default() }).unwrap().total, 0);

        let mut filters = ListFilters::default();
        filters.add("location", "BTM").unwrap();
        let page = list(&records, &ListQuery { filters, ..Default::default() }).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Pizza Hut");
    }

    #[test]
    fn test_list_rest_type_filter() {
        let mut records = sample();
        records[2].rest_type = "Cafe, Quick Bites".to_string();
        records[4].rest_type = "Casual Dining".to_string();

        let mut filters = ListFilters::default();
        filters.add("rest_type", "quick").unwrap();
        let page = list(&records, &ListQuery { filters, ..Default::default() }).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Truffles");
    }

    #[test]
    fn test_filter_add_errors() {
        let mut filters = ListFilters::default();
        assert_eq!(
            filters.add("price", "cheap"),
            Err(BrowseError::UnknownFilter("price".to_string()))
        );
        assert_eq!(
            filters.add("book_table", "maybe"),
            Err(BrowseError::InvalidFlag("maybe".to_string()))
        );
        filters.add("book_table", "No").unwrap();
        assert_eq!(filters.book_table, vec![false]);
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_list_pagination() {
        let records = sample();
        let query = ListQuery {
            sort: Some(ListSort::new(SortField::Name, SortOrder::Asc)),
            page: 2,
            limit: 2,
            ..Default::default()
        };
        let page = list(&records, &query).unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 2);
        let names: Vec<_> = page.data.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Empire", "Pizza Hut"]);

        let query = ListQuery { page: 0, ..Default::default() };
        assert_eq!(list(&records, &query), Err(BrowseError::InvalidPage(0)));
        let query = ListQuery { limit: 51, ..Default::default() };
        assert_eq!(list(&records, &query), Err(BrowseError::InvalidLimit(51)));
    }

    #[test]
    fn test_list_fills_missing_ids() {
        let mut records = sample();
        records[1].id = None;
        let page = list(&records, &ListQuery::default()).unwrap();
        assert_eq!(page.data[1].id.as_deref(), Some("row-1"));
        assert_eq!(page.data[0].id.as_deref(), Some("pizza-hut"));
    }

    #[test]
    fn test_by_cuisine_page_past_end() {
        let records = sample();
        let page = by_cuisine(&records, "mughlai", 3, 10).unwrap();
        assert_eq!(page.total_records, 1);
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_by_cuisine_validation() {
        let records = sample();
        assert_eq!(by_cuisine(&records, "  ", 1, 10), Err(BrowseError::EmptyName));
        assert_eq!(by_cuisine(&records, "pizza", 0, 10), Err(BrowseError::InvalidPage(0)));
        assert_eq!(by_cuisine(&records, "pizza", 1, 0), Err(BrowseError::InvalidLimit(0)));
        assert_eq!(by_cuisine(&records, "pizza", 1, 51), Err(BrowseError::InvalidLimit(51)));
    }

    #[test]
    fn test_summary_fallbacks() {
        let mut r = record("Onesta", "Pizza");
        r.rate_num = 4.6;
        r.votes_num = 2556;
        let summary = RestaurantSummary::from_record(&r, 0);
        assert_eq!(summary.rate, "4.6");
        assert_eq!(summary.votes, "2556");

        let bare = RestaurantSummary::from_record(&record("X", ""), 3);
        assert_eq!(bare.rate, "N/A");
        assert_eq!(bare.votes, "0");
    }

    #[test]
    fn test_filter_options() {
        let mut records = sample();
        records[0].online_order = true;
        records[0].location = "BTM".to_string();
        records[1].location = " Banashankari ".to_string();
        records[2].rest_type = "Cafe, Quick Bites".to_string();

        let options = filter_options(&records);
        assert_eq!(options.online_order, vec![false, true]);
        assert_eq!(options.book_table, vec![false]);
        assert_eq!(options.location, vec!["BTM", "Banashankari"]);
        assert_eq!(options.rest_type, vec!["Cafe", "Quick Bites"]);
        assert!(options.cuisines.contains(&"Fast Food".to_string()));
        assert_eq!(
            options.cuisines.iter().filter(|c| c.as_str() == "Pizza").count(),
            1
        );
    }

    #[test]
    fn test_filter_options_empty_catalog() {
        assert_eq!(filter_options(&[]), FilterOptions::default());
    }
}
