use crate::index::reader::FamilyReader;
use crate::index::types::{Family, IndexConfig};
use anyhow::Result;
use std::fs;

/// Whether all twelve files of the four text families are on disk.
/// The filter family is rebuilt on every pass and is not part of the probe.
pub fn index_exists(config: &IndexConfig) -> bool {
    Family::TEXT
        .iter()
        .all(|&family| config.family_files(family).all_exist())
}

/// Size figures for one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyStats {
    pub family: Family,
    /// None when the family cannot be opened
    pub terms: Option<usize>,
    /// Combined size of the three files
    pub bytes: u64,
}

/// Collect statistics for every family
pub fn family_stats(config: &IndexConfig) -> Vec<FamilyStats> {
    Family::ALL
        .iter()
        .map(|&family| {
            let files = config.family_files(family);
            let bytes = [&files.dict, &files.postings, &files.offsets]
                .iter()
                .filter_map(|p| fs::metadata(p).ok())
                .map(|m| m.len())
                .sum();
            let terms = FamilyReader::open(config, family)
                .ok()
                .map(|reader| reader.term_count());
            FamilyStats { family, terms, bytes }
        })
        .collect()
}

/// Display index statistics
pub fn show_stats(config: &IndexConfig) -> Result<()> {
    println!("Index Statistics");
    println!("================");
    println!();
    println!("Index location:   {}", config.index_dir.display());
    println!("Complete:         {}", if index_exists(config) { "yes" } else { "no" });
    println!();

    let mut total = 0;
    for stats in family_stats(config) {
        total += stats.bytes;
        let terms = stats
            .terms
            .map_or_else(|| "missing".to_string(), |n| n.to_string());
        println!("  {:12} {:>10} terms  {}", stats.family, terms, format_size(stats.bytes));
    }

    println!();
    println!("Index size:       {}", format_size(total));
    Ok(())
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
