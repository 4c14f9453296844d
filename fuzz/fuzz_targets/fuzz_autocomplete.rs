#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use savor::catalog::CatalogRecord;
use savor::index::build_index;
use savor::query::QueryEngine;

#[derive(Arbitrary, Debug)]
struct Input {
    names: Vec<(String, String)>,
    query: String,
    limit: u8,
}

fuzz_target!(|input: Input| {
    let records: Vec<CatalogRecord> = input
        .names
        .into_iter()
        .take(64)
        .enumerate()
        .map(|(i, (name, cuisines))| CatalogRecord {
            id: Some(i.to_string()),
            name,
            cuisines,
            ..Default::default()
        })
        .collect();

    let index = build_index(&records);
    let response = QueryEngine::new(&index).autocomplete(&input.query, input.limit as usize);

    assert!(response.data.len() <= input.limit as usize);
    assert_eq!(response.total, response.data.len());
});
