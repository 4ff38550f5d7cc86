use crate::error::{Error, Result};
use crate::index::filter::size_filter_ids;
use crate::index::reader::FamilyReader;
use crate::index::store::MetaCatalog;
use crate::index::types::{Family, FileId, FileMeta, IndexConfig};
use crate::query::op::CompareOp;
use crate::utils::paths;
use crate::utils::{build_ngrams, intersect_all, intersect_sorted, tokenize, union_sorted};
use std::fs;
use tracing::{debug, trace, warn};

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 500;

/// Per-n-gram posting cap during fuzzy fallback
pub const FUZZY_POSTING_CAP: usize = 20_000;

/// Fuzzy fallback runs while exact hits are fewer than this many pages
const FUZZY_TRIGGER_PAGES: usize = 3;

/// Exact size comparison; buckets in the filter family only pre-select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    pub op: CompareOp,
    pub bytes: u64,
}

impl SizeFilter {
    pub fn new(op: CompareOp, bytes: u64) -> Self {
        Self { op, bytes }
    }

    pub fn matches(&self, size: u64) -> bool {
        self.op.matches(size, self.bytes)
    }
}

/// Arguments of one search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free text, or a path when it contains `/`
    pub text: String,
    /// Scope: prefix for name queries, base for relative path queries
    pub parent: String,
    pub offset: usize,
    /// 0 selects the default; larger values are capped
    pub limit: usize,
    pub size: Option<SizeFilter>,
}

/// Request after normalization
struct Plan {
    text: String,
    parent: String,
    offset: usize,
    limit: usize,
    size: Option<SizeFilter>,
    path_query: bool,
    /// Resolved query: cleaned path for path queries, the text otherwise
    q: String,
    boundary: String,
    dir_prefix: String,
}

impl Plan {
    fn new(req: &SearchRequest) -> Self {
        let limit = match req.limit {
            0 => DEFAULT_LIMIT,
            n => n.min(MAX_LIMIT),
        };
        let text = req.text.trim().to_string();
        let parent = req.parent.replace('\\', "/");
        let path_query = text.contains('/');

        let mut q = text.clone();
        let mut boundary = String::new();
        if path_query {
            if !parent.is_empty() && !q.starts_with('/') {
                q = paths::join(&parent, &q);
            }
            q = paths::clean(&q);
            boundary = q.clone();
        }

        Self {
            text,
            parent,
            offset: req.offset,
            limit,
            size: req.size,
            path_query,
            q,
            boundary,
            dir_prefix: String::new(),
        }
    }

    fn page(&self, out: Vec<String>) -> Vec<String> {
        slice_page(out, self.offset, self.limit)
    }
}

/// Executes searches against the on-disk families and the metadata store
pub struct SearchEngine {
    config: IndexConfig,
    catalog: MetaCatalog,
}

impl SearchEngine {
    pub fn new(config: IndexConfig, catalog: MetaCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Positional form of [`search_index`](Self::search_index)
    pub fn search(
        &self,
        text: &str,
        parent: &str,
        offset: usize,
        limit: usize,
        size: Option<SizeFilter>,
    ) -> Result<Vec<String>> {
        self.search_index(&SearchRequest {
            text: text.to_string(),
            parent: parent.to_string(),
            offset,
            limit,
            size,
        })
    }

    /// Token search with fuzzy fallback, scope filters, and an optional size filter.
    ///
    /// Missing or corrupt index families yield an empty page, not an error.
    /// Only metadata store failures are returned.
    pub fn search_index(&self, req: &SearchRequest) -> Result<Vec<String>> {
        let mut plan = Plan::new(req);

        if plan.path_query {
            if let Some(out) = list_existing_path(&plan.q) {
                debug!(path = %plan.q, "served from filesystem");
                return Ok(plan.page(out));
            }
            if let Some(prefix) = self.boundary_dir_prefix(&plan.boundary)? {
                plan.dir_prefix = prefix;
            }
        }

        let size_ids = match plan.size {
            Some(size) => {
                let ids = size_filter_ids(&self.config, size.op, size.bytes);
                if plan.text.is_empty() {
                    let out = self.collect_paths(&ids, &plan)?;
                    return Ok(plan.page(out));
                }
                ids
            }
            None => Vec::new(),
        };

        let exact_family = Family::exact(plan.path_query);
        let reader = match FamilyReader::open(&self.config, exact_family) {
            Ok(reader) => reader,
            Err(e) => {
                debug!(family = %exact_family, error = %e, "index family unavailable");
                return Ok(Vec::new());
            }
        };

        let terms = tokenize(if plan.path_query { &plan.q } else { &plan.text });
        let exact = match exact_ids(&reader, &terms) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(family = %exact_family, error = %e, "corrupt postings");
                return Ok(Vec::new());
            }
        };
        reader.close();

        let mut ids = self.with_fuzzy(exact, &plan);

        if !size_ids.is_empty() {
            ids = intersect_sorted(&ids, &size_ids);
        }

        let out = self.collect_paths(&ids, &plan)?;
        Ok(plan.page(out))
    }

    /// Union fuzzy n-gram matches into the exact hits while they are scarce
    fn with_fuzzy(&self, exact: Vec<FileId>, plan: &Plan) -> Vec<FileId> {
        if exact.len() >= plan.limit * FUZZY_TRIGGER_PAGES {
            return exact;
        }

        let family = Family::fuzzy(plan.path_query);
        let reader = match FamilyReader::open(&self.config, family) {
            Ok(reader) => reader,
            Err(e) => {
                debug!(family = %family, error = %e, "fuzzy family unavailable");
                return exact;
            }
        };

        let ngrams = build_ngrams(if plan.path_query { &plan.q } else { &plan.text });
        if ngrams.is_empty() {
            return exact;
        }

        let mut sets = Vec::with_capacity(ngrams.len());
        for ngram in &ngrams {
            match reader.posting_capped(reader.term_id(ngram), FUZZY_POSTING_CAP) {
                Ok(ids) if !ids.is_empty() => sets.push(ids),
                Ok(_) => {}
                Err(e) => {
                    warn!(family = %family, error = %e, "corrupt postings, skipping fuzzy match");
                    return exact;
                }
            }
        }

        let fuzzy = intersect_all(sets);
        debug!(exact = exact.len(), fuzzy = fuzzy.len(), "fuzzy fallback");
        union_sorted(&exact, &fuzzy)
    }

    /// `dir/` when the boundary names an indexed directory
    fn boundary_dir_prefix(&self, boundary: &str) -> Result<Option<String>> {
        let id = match self.catalog.id_by_path(boundary) {
            Ok(Some(id)) => id,
            Ok(None) | Err(Error::InvalidData(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(meta) = self.load_meta(id)? else {
            return Ok(None);
        };
        if !meta.is_dir {
            return Ok(None);
        }

        let mut prefix = meta.path;
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        Ok(Some(prefix))
    }

    /// Map ids to paths, applying scope and exact size filters in id order
    fn collect_paths(&self, ids: &[FileId], plan: &Plan) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(ids.len());

        for &id in ids {
            let Some(meta) = self.load_meta(id)? else {
                continue;
            };
            if plan.size.is_some() && meta.is_dir {
                continue;
            }
            if !in_scope(&meta, plan) {
                continue;
            }
            if plan.size.is_some_and(|size| !size.matches(meta.size)) {
                continue;
            }
            out.push(meta.path);
        }

        Ok(out)
    }

    /// Corrupt records read as absent
    fn load_meta(&self, id: FileId) -> Result<Option<FileMeta>> {
        match self.catalog.load(id) {
            Err(Error::Json(e)) => {
                trace!(id, error = %e, "unreadable metadata");
                Ok(None)
            }
            other => other,
        }
    }
}

fn in_scope(meta: &FileMeta, plan: &Plan) -> bool {
    if plan.path_query {
        if !plan.dir_prefix.is_empty() {
            meta.path.starts_with(&plan.dir_prefix)
        } else if !plan.boundary.is_empty() {
            meta.path == plan.boundary
                || meta
                    .path
                    .strip_prefix(&plan.boundary)
                    .is_some_and(|rest| rest.starts_with('/'))
        } else {
            true
        }
    } else {
        plan.parent.is_empty() || meta.path.starts_with(&plan.parent)
    }
}

/// Conjunctive match: postings per token, intersected smallest-first
fn exact_ids(reader: &FamilyReader, terms: &[String]) -> Result<Vec<FileId>> {
    let mut sets = Vec::with_capacity(terms.len());
    for term in terms {
        sets.push(reader.posting(reader.term_id(term))?);
    }
    Ok(intersect_all(sets))
}

/// Resolve an absolute path straight from the filesystem: the file itself, or
/// the directory's direct children sorted by name. None when it does not exist.
fn list_existing_path(q: &str) -> Option<Vec<String>> {
    if !q.starts_with('/') {
        return None;
    }
    let metadata = fs::metadata(q).ok()?;
    if !metadata.is_dir() {
        return Some(vec![q.to_string()]);
    }

    let Ok(entries) = fs::read_dir(q) else {
        return Some(Vec::new());
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort_unstable();

    Some(names.iter().map(|name| paths::child(q, name)).collect())
}

fn slice_page(mut out: Vec<String>, offset: usize, limit: usize) -> Vec<String> {
    if offset >= out.len() {
        return Vec::new();
    }
    out.truncate(offset.saturating_add(limit).min(out.len()));
    out.drain(..offset);
    out
}
