use crate::index::identity::identify;
use crate::index::store::MetaCatalog;
use crate::index::types::*;
use crate::index::writer::IndexWriter;
use anyhow::{Context, Result};
use ignore::{DirEntry, WalkBuilder};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, trace, warn};

/// Subtree holding deleted files; never indexed
pub const TRASH_DIR_NAME: &str = ".nas-trash";

/// Pseudo filesystems skipped when walked as directories
const PSEUDO_FS: &[&str] = &["/proc", "/sys", "/dev", "/run", "/tmp", "/var/run", "/var/tmp"];

/// Knobs for a walk
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Index dotfiles and dot-directories
    pub include_hidden: bool,
    /// Walk each root on its own rayon worker and merge afterwards
    pub parallel_roots: bool,
}

/// Summary of an indexing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Entries persisted and tokenized
    pub entries: usize,
    /// Entries dropped because of stat, identity, or store errors
    pub skipped: usize,
    /// Terms written per family
    pub families: Vec<(Family, usize)>,
}

/// Terms and counters produced by walking one root
#[derive(Default)]
struct RootWalk {
    terms: FamilyTerms,
    entries: usize,
    skipped: usize,
}

impl RootWalk {
    fn merge(&mut self, other: RootWalk) {
        self.terms.merge(other.terms);
        self.entries += other.entries;
        self.skipped += other.skipped;
    }
}

/// Walk the roots, persist metadata, and rebuild every index family.
///
/// Per-entry failures are skipped. A failure writing any family aborts the
/// call; files already swapped in for earlier families stay in place.
pub fn index_paths(
    config: &IndexConfig,
    catalog: &MetaCatalog,
    roots: &[PathBuf],
    options: IndexOptions,
) -> Result<IndexReport> {
    if roots.is_empty() {
        return Ok(IndexReport::default());
    }
    let start = Instant::now();

    let walked = if options.parallel_roots {
        roots
            .par_iter()
            .map(|root| walk_root(root, catalog, options))
            .collect::<Vec<_>>()
    } else {
        roots.iter().map(|root| walk_root(root, catalog, options)).collect()
    };

    let mut total = RootWalk::default();
    for walk in walked {
        total.merge(walk);
    }
    catalog.flush().context("Failed to flush metadata store")?;

    let writer = IndexWriter::new(config);
    let empty = TermMap::new();
    let mut families = Vec::with_capacity(Family::ALL.len());
    for family in Family::TEXT {
        let terms = total.terms.get(family).unwrap_or(&empty);
        let count = writer
            .write_family(family, terms)
            .with_context(|| format!("Failed to write {family} index"))?;
        families.push((family, count));
    }

    let filter_terms = build_filter_index(config, catalog)?;
    families.push((Family::Filter, filter_terms));

    info!(
        roots = roots.len(),
        entries = total.entries,
        skipped = total.skipped,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "indexing complete"
    );

    Ok(IndexReport {
        entries: total.entries,
        skipped: total.skipped,
        families,
    })
}

/// Rebuild the filter family from every entry in the metadata store,
/// not only the ones seen by the latest walk. Returns the term count.
pub fn build_filter_index(config: &IndexConfig, catalog: &MetaCatalog) -> Result<usize> {
    let mut terms = TermMap::new();
    catalog
        .for_each_meta(|meta| {
            for term in Family::Filter.terms(&meta) {
                terms.add(term, meta.file_id);
            }
        })
        .context("Failed to scan metadata store")?;

    IndexWriter::new(config)
        .write_family(Family::Filter, &terms)
        .context("Failed to write filter index")
}

fn walk_root(root: &Path, catalog: &MetaCatalog, options: IndexOptions) -> RootWalk {
    let mut walk = RootWalk::default();
    let include_hidden = options.include_hidden;

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .filter_entry(move |entry| !is_excluded(entry, include_hidden))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!(error = %e, "walk error");
                continue;
            }
        };

        match index_entry(&entry, catalog) {
            Ok(meta) => {
                walk.terms.add_meta(&meta);
                walk.entries += 1;
            }
            Err(e) => {
                trace!(path = %entry.path().display(), error = %e, "skipping entry");
                walk.skipped += 1;
            }
        }
    }

    if walk.skipped > 0 {
        warn!(root = %root.display(), skipped = walk.skipped, "some entries were not indexed");
    }
    walk
}

/// Identify, describe, and persist one entry
fn index_entry(entry: &DirEntry, catalog: &MetaCatalog) -> crate::Result<FileMeta> {
    let path = entry.path();
    let metadata = fs::symlink_metadata(path)?;
    let file_id = identify(&metadata)?;
    let name = entry.file_name().to_string_lossy();

    let meta = FileMeta::from_entry(file_id, path, &name, &metadata);
    catalog.persist(&meta)?;
    Ok(meta)
}

/// Exclusion rules applied below each root
fn is_excluded(entry: &DirEntry, include_hidden: bool) -> bool {
    // Roots are always walked
    if entry.depth() == 0 {
        return false;
    }

    let path = entry.path();
    if path.components().any(|c| c.as_os_str() == TRASH_DIR_NAME) {
        return true;
    }

    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
    if is_pseudo_fs(path, is_dir) {
        return true;
    }

    !include_hidden && entry.file_name().to_string_lossy().starts_with('.')
}

/// Pseudo filesystem mount point; only directories qualify
fn is_pseudo_fs(path: &Path, is_dir: bool) -> bool {
    is_dir && PSEUDO_FS.iter().any(|p| path == Path::new(p))
}
