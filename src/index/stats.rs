use crate::index::handle::LoadedCatalog;
use crate::index::trie::{PrefixIndex, TrieNode};
use serde::Serialize;

/// Structural summary of a built trie
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexShape {
    pub nodes: usize,
    pub terminals: usize,
    pub max_depth: usize,
    /// Payload references stored across all nodes
    pub entry_refs: usize,
    /// Distinct first characters
    pub root_branches: usize,
}

/// Walk the whole trie once and measure it
pub fn index_shape(index: &PrefixIndex) -> IndexShape {
    let mut shape = IndexShape {
        root_branches: index.root().children_len(),
        ..Default::default()
    };

    let mut stack: Vec<(&TrieNode, usize)> = index.root().children().map(|(_, n)| (n, 1)).collect();
    while let Some((node, depth)) = stack.pop() {
        shape.nodes += 1;
        shape.entry_refs += node.entries().len();
        shape.max_depth = shape.max_depth.max(depth);
        if node.is_terminal() {
            shape.terminals += 1;
        }
        stack.extend(node.children().map(|(_, child)| (child, depth + 1)));
    }

    shape
}

/// Display index statistics
pub fn show_stats(catalog: &LoadedCatalog) {
    let report = &catalog.report;
    let shape = index_shape(&catalog.index);

    println!("Index Statistics");
    println!("================");
    println!();
    if let Some(source) = &catalog.source {
        println!("Catalog:          {}", source.display());
    }
    println!("Records:          {}", report.records);
    println!("Indexed:          {}", report.indexed);
    println!("Skipped:          {}", report.skipped);
    println!("Keys inserted:    {}", report.keys);
    println!("Distinct keys:    {}", shape.terminals);
    println!("Trie nodes:       {}", shape.nodes);
    println!("Max key length:   {}", shape.max_depth);
    println!("Payload refs:     {}", shape.entry_refs);
    println!("Root branches:    {}", shape.root_branches);
    println!("Build time:       {:.1} ms", report.elapsed_ms);

    // Cuisine spread
    let mut cuisine_counts = std::collections::HashMap::new();
    for record in &catalog.records {
        for cuisine in crate::utils::split_list(&record.cuisines) {
            *cuisine_counts.entry(cuisine).or_insert(0usize) += 1;
        }
    }

    if !cuisine_counts.is_empty() {
        println!();
        println!("Top cuisines:");
        let mut sorted: Vec<_> = cuisine_counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

        for (cuisine, count) in sorted.iter().take(15) {
            println!("  {:20} {}", cuisine, count);
        }

        if sorted.len() > 15 {
            println!("  ... and {} more", sorted.len() - 15);
        }
    }
}
