//! Shared fixtures for integration tests.

use nasfind::index::{Family, FamilyTerms, FileMeta, IndexConfig, IndexWriter, MetaCatalog, TermMap};
use nasfind::query::SearchEngine;
use std::path::Path;

/// Metadata for an entry that only exists in the index
pub fn meta(file_id: u64, path: &str) -> FileMeta {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    FileMeta {
        file_id,
        path: path.to_string(),
        ext: nasfind::index::extension_of(&name),
        name,
        ..Default::default()
    }
}

/// Persist the entries and write all five families under `index_dir`
pub fn engine_with(index_dir: &Path, metas: &[FileMeta]) -> SearchEngine {
    let config = IndexConfig::new(index_dir);
    let catalog = MetaCatalog::in_memory();
    let mut terms = FamilyTerms::new();
    let mut filter = TermMap::new();

    for m in metas {
        catalog.persist(m).unwrap();
        terms.add_meta(m);
        for t in Family::Filter.terms(m) {
            filter.add(t, m.file_id);
        }
    }

    let writer = IndexWriter::new(&config);
    for family in Family::TEXT {
        writer.write_family(family, terms.get(family).unwrap()).unwrap();
    }
    writer.write_family(Family::Filter, &filter).unwrap();

    SearchEngine::new(config, catalog)
}
