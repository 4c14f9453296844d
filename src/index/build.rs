use crate::catalog::CatalogRecord;
use crate::index::trie::PrefixIndex;
use crate::index::types::{BuildReport, EntityEntry, IndexConfig, Payload};
use crate::utils::progress::{ProgressBar, ProgressStyle};
use crate::utils::{cuisine_tokens, name_tokens};
use rayon::prelude::*;
use std::time::Instant;

/// Keys derived from one catalog record (computed in parallel)
pub struct DerivedKeys {
    pub keys: Vec<(String, Payload)>,
}

/// Derive every index key for a single record.
///
/// Returns `None` for records without a usable name.
pub fn derive_keys(record: &CatalogRecord, position: usize, min_token_chars: usize) -> Option<DerivedKeys> {
    if !record.has_name() {
        return None;
    }

    let entity = Payload::entity(EntityEntry::from_record(record, position));
    let mut keys = Vec::new();

    // Full name
    keys.push((record.name.to_lowercase(), entity.clone()));

    // Individual name words, so "hut" reaches "Pizza Hut"
    for token in name_tokens(&record.name, min_token_chars) {
        keys.push((token.to_lowercase(), entity.clone()));
    }

    // Cuisines get their own payloads
    for cuisine in cuisine_tokens(&record.cuisines, min_token_chars) {
        keys.push((cuisine.to_lowercase(), Payload::cuisine(cuisine)));
    }

    Some(DerivedKeys { keys })
}

/// Build a prefix index from a full catalog snapshot
pub fn build_index(catalog: &[CatalogRecord]) -> PrefixIndex {
    build_index_with_report(catalog, &IndexConfig::default(), true).0
}

/// Build a prefix index and report what went into it
pub fn build_index_with_report(
    catalog: &[CatalogRecord],
    config: &IndexConfig,
    silent: bool,
) -> (PrefixIndex, BuildReport) {
    let start = Instant::now();
    let min_chars = config.min_token_chars;

    let progress_bar = if !silent {
        let pb = ProgressBar::new(catalog.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        pb.set_message("Deriving keys...");
        Some(pb)
    } else {
        None
    };

    let derive = |(position, record): (usize, &CatalogRecord)| {
        let derived = derive_keys(record, position, min_chars);
        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
        derived
    };

    // Order-preserving collect keeps insertion deterministic
    let derived: Vec<Option<DerivedKeys>> = if config.parallel {
        catalog.par_iter().enumerate().map(derive).collect()
    } else {
        catalog.iter().enumerate().map(derive).collect()
    };

    if let Some(ref pb) = progress_bar {
        pb.set_message("Inserting keys...");
    }

    let mut index = PrefixIndex::new();
    let mut report = BuildReport {
        records: catalog.len(),
        ..Default::default()
    };

    for record_keys in derived {
        let Some(record_keys) = record_keys else {
            report.skipped += 1;
            continue;
        };
        report.indexed += 1;
        for (key, payload) in record_keys.keys {
            index.insert(&key, payload);
        }
    }

    report.keys = index.key_count();
    report.nodes = index.node_count();
    report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Indexed {} restaurants", report.indexed));
    }

    tracing::info!(
        records = report.records,
        indexed = report.indexed,
        skipped = report.skipped,
        keys = report.keys,
        nodes = report.nodes,
        elapsed_ms = report.elapsed_ms,
        "catalog index built"
    );

    (index, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, cuisines: &str) -> CatalogRecord {
        CatalogRecord {
            id: Some(id.to_string()),
            name: name.to_string(),
            cuisines: cuisines.to_string(),
            ..Default::default()
        }
    }

    fn payload_names(index: &PrefixIndex, prefix: &str) -> Vec<String> {
        index
            .prefix_lookup(prefix)
            .iter()
            .map(|p| match p {
                Payload::Entity(e) => format!("entity:{}", e.id),
                Payload::Cuisine(c) => format!("cuisine:{}", c.name),
            })
            .collect()
    }

    #[test]
    fn test_derive_keys() {
        let r = record("1", "Pizza Hut", "Pizza, Fast Food, X");
        let derived = derive_keys(&r, 0, 2).unwrap();
        let keys: Vec<_> = derived.keys.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["pizza hut", "pizza", "hut", "pizza", "fast food"]);
    }

    #[test]
    fn test_name_tokens_share_entity() {
        let r = record("1", "Pizza Hut", "");
        let derived = derive_keys(&r, 0, 2).unwrap();
        let (_, first) = &derived.keys[0];
        for (_, payload) in &derived.keys {
            match (first, payload) {
                (Payload::Entity(a), Payload::Entity(b)) => assert!(std::sync::Arc::ptr_eq(a, b)),
                _ => panic!("expected entity payloads"),
            }
        }
    }

    #[test]
    fn test_empty_names_skipped() {
        let missing = CatalogRecord {
            id: Some("2".to_string()),
            cuisines: "Sushi".to_string(),
            ..Default::default()
        };
        let catalog = vec![
            record("1", "", "Pizza"),
            missing,
            record("3", "KFC", "Burger"),
        ];
        let (index, report) = build_index_with_report(&catalog, &IndexConfig::default(), true);

        assert_eq!(report.records, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.indexed, 1);
        // Only KFC's cuisine made it in
        assert_eq!(payload_names(&index, "pizza"), Vec::<String>::new());
        assert_eq!(payload_names(&index, "sus"), Vec::<String>::new());
        assert_eq!(payload_names(&index, "bur"), vec!["cuisine:Burger"]);
    }

    #[test]
    fn test_whitespace_name_is_indexed() {
        let catalog = vec![record("1", "   ", "Pizza"), record("2", "KFC", "Burger")];
        let (index, report) = build_index_with_report(&catalog, &IndexConfig::default(), true);

        assert_eq!(report.skipped, 0);
        assert_eq!(report.indexed, 2);
        // The name has no words, but its raw key and cuisines are in
        assert_eq!(payload_names(&index, " "), vec!["entity:1"]);
        assert_eq!(payload_names(&index, "piz"), vec!["cuisine:Pizza"]);
    }

    #[test]
    fn test_hut_reaches_pizza_hut() {
        let index = build_index(&[record("1", "Pizza Hut", "Pizza, Fast Food")]);
        assert_eq!(payload_names(&index, "hut"), vec!["entity:1"]);
        assert_eq!(
            payload_names(&index, "piz"),
            vec!["entity:1", "entity:1", "cuisine:Pizza"]
        );
    }

    #[test]
    fn test_missing_id_uses_position() {
        let mut r = record("x", "Empire", "");
        r.id = None;
        let index = build_index(&[record("1", "KFC", ""), r]);
        assert_eq!(payload_names(&index, "emp"), vec!["entity:row-1"]);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let catalog: Vec<_> = (0..200)
            .map(|i| record(&i.to_string(), &format!("Cafe Number {}", i), "Cafe, Coffee"))
            .collect();

        let parallel = IndexConfig { parallel: true, ..Default::default() };
        let sequential = IndexConfig { parallel: false, ..Default::default() };
        let (a, ra) = build_index_with_report(&catalog, &parallel, true);
        let (b, rb) = build_index_with_report(&catalog, &sequential, true);

        assert_eq!(ra.keys, rb.keys);
        assert_eq!(ra.nodes, rb.nodes);
        for prefix in ["c", "cafe", "number 1", "coffee", "17"] {
            assert_eq!(a.prefix_lookup(prefix), b.prefix_lookup(prefix));
        }
    }

    #[test]
    fn test_report_counts() {
        let (index, report) = build_index_with_report(
            &[record("1", "Cafe Coffee Day", "Cafe, Coffee")],
            &IndexConfig::default(),
            true,
        );
        // full name + 3 words + 2 cuisines
        assert_eq!(report.keys, 6);
        assert_eq!(report.nodes, index.node_count());
    }
}
