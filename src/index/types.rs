use crate::utils::{build_ngrams, tokenize};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Stable identifier for a filesystem entry, hashed from (device, inode, ctime)
pub type FileId = u64;

/// Dense 1-based id of a term within one family's dictionary; 0 means absent
pub type TermId = u32;

/// Per-entry metadata, the source of truth kept in the metadata store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub file_id: FileId,
    /// Slash-normalized absolute path
    pub path: String,
    pub name: String,
    /// Lowercased extension without the dot
    pub ext: String,
    pub size: u64,
    /// Unix seconds
    pub mtime: i64,
    pub is_dir: bool,
    #[serde(default)]
    pub content_indexed: bool,
}

impl FileMeta {
    /// Build metadata for a walked entry
    pub fn from_entry(file_id: FileId, path: &Path, name: &str, metadata: &Metadata) -> Self {
        Self {
            file_id,
            path: to_slash(path),
            name: name.to_string(),
            ext: extension_of(name),
            size: metadata.len(),
            mtime: unix_seconds(metadata),
            is_dir: metadata.is_dir(),
            content_indexed: false,
        }
    }
}

/// Lowercased text after the last dot of a file name ("" when there is none)
pub fn extension_of(name: &str) -> String {
    name.rfind('.')
        .map(|i| name[i + 1..].to_lowercase())
        .unwrap_or_default()
}

/// Render a path with forward slashes
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn unix_seconds(metadata: &Metadata) -> i64 {
    match metadata.modified() {
        Ok(t) => match t.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        },
        Err(_) => 0,
    }
}

/// One of the five independent index families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Exact tokens of the file name
    Name,
    /// Exact tokens of the full path
    Path,
    /// Fuzzy n-grams of the file name
    NameNgram,
    /// Fuzzy n-grams of the full path
    PathNgram,
    /// Extension, size bucket, and mtime bucket terms
    Filter,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Name,
        Family::Path,
        Family::NameNgram,
        Family::PathNgram,
        Family::Filter,
    ];

    /// Families fed directly by the walk
    pub const TEXT: [Family; 4] = [
        Family::Name,
        Family::Path,
        Family::NameNgram,
        Family::PathNgram,
    ];

    /// File name stem shared by the family's three files
    pub fn stem(self) -> &'static str {
        match self {
            Family::Name => "name",
            Family::Path => "path",
            Family::NameNgram => "name_ngram",
            Family::PathNgram => "path_ngram",
            Family::Filter => "filter",
        }
    }

    /// Exact family for a query mode
    pub fn exact(path_query: bool) -> Self {
        if path_query { Family::Path } else { Family::Name }
    }

    /// Fuzzy family for a query mode
    pub fn fuzzy(path_query: bool) -> Self {
        if path_query { Family::PathNgram } else { Family::NameNgram }
    }

    /// Terms this family indexes for an entry
    pub fn terms(self, meta: &FileMeta) -> Vec<String> {
        match self {
            Family::Name => tokenize(&meta.name),
            Family::Path => tokenize(&meta.path),
            Family::NameNgram => build_ngrams(&meta.name),
            Family::PathNgram => build_ngrams(&meta.path),
            Family::Filter => {
                let mut terms = Vec::with_capacity(3);
                if !meta.ext.is_empty() {
                    terms.push(ext_term(&meta.ext));
                }
                terms.push(SizeBucket::of(meta.size).term());
                terms.push(mtime_term(meta.mtime));
                terms
            }
        }
    }

    fn text_slot(self) -> Option<usize> {
        Family::TEXT.iter().position(|&f| f == self)
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.stem())
    }
}

/// On-disk locations of one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyFiles {
    /// `<family>.dict.json`
    pub dict: PathBuf,
    /// `<family>.postings.dat`
    pub postings: PathBuf,
    /// `<family>.postings.idx`
    pub offsets: PathBuf,
}

impl FamilyFiles {
    pub fn new(index_dir: &Path, family: Family) -> Self {
        let stem = family.stem();
        Self {
            dict: index_dir.join(format!("{stem}.dict.json")),
            postings: index_dir.join(format!("{stem}.postings.dat")),
            offsets: index_dir.join(format!("{stem}.postings.idx")),
        }
    }

    pub fn all_exist(&self) -> bool {
        self.dict.exists() && self.postings.exists() && self.offsets.exists()
    }
}

/// Configuration threaded through the builder, pipeline, and query engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub index_dir: PathBuf,
}

impl IndexConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        Self {
            index_dir: index_dir.into(),
        }
    }

    pub fn family_files(&self, family: Family) -> FamilyFiles {
        FamilyFiles::new(&self.index_dir, family)
    }
}

/// Term -> file ids accumulated during a build
#[derive(Debug, Clone, Default)]
pub struct TermMap {
    terms: AHashMap<String, Vec<FileId>>,
}

impl TermMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, term: impl Into<String>, id: FileId) {
        self.terms.entry(term.into()).or_default().push(id);
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&[FileId]> {
        self.terms.get(term).map(Vec::as_slice)
    }

    /// Fold another map's postings into this one
    pub fn merge(&mut self, other: TermMap) {
        for (term, ids) in other.terms {
            self.terms.entry(term).or_default().extend(ids);
        }
    }

    /// Terms in lexicographic order; this order defines term ids
    pub fn sorted_terms(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.terms.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Term maps for the four walk-fed families
#[derive(Debug, Clone, Default)]
pub struct FamilyTerms {
    maps: [TermMap; 4],
}

impl FamilyTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribute every text-family term of an entry
    pub fn add_meta(&mut self, meta: &FileMeta) {
        for (family, map) in Family::TEXT.iter().zip(self.maps.iter_mut()) {
            for term in family.terms(meta) {
                map.add(term, meta.file_id);
            }
        }
    }

    /// Map for a text family; None for the filter family
    pub fn get(&self, family: Family) -> Option<&TermMap> {
        family.text_slot().map(|i| &self.maps[i])
    }

    pub fn merge(&mut self, other: FamilyTerms) {
        for (mine, theirs) in self.maps.iter_mut().zip(other.maps) {
            mine.merge(theirs);
        }
    }
}

/// Coarse size ranges used by the filter family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeBucket {
    /// < 1 KiB
    S0,
    /// < 1 MiB
    S1,
    /// < 10 MiB
    S2,
    /// < 100 MiB
    S3,
    /// < 1 GiB
    S4,
    /// >= 1 GiB
    S5,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 6] = [
        SizeBucket::S0,
        SizeBucket::S1,
        SizeBucket::S2,
        SizeBucket::S3,
        SizeBucket::S4,
        SizeBucket::S5,
    ];

    pub fn of(size: u64) -> Self {
        match size {
            s if s < 1 << 10 => SizeBucket::S0,
            s if s < 1 << 20 => SizeBucket::S1,
            s if s < 10 << 20 => SizeBucket::S2,
            s if s < 100 << 20 => SizeBucket::S3,
            s if s < 1 << 30 => SizeBucket::S4,
            _ => SizeBucket::S5,
        }
    }

    pub fn term(self) -> String {
        format!("size:s{}", self as u8)
    }
}

/// 30-day months since the epoch; non-positive timestamps land in month 0
pub fn mtime_bucket(ts: i64) -> i64 {
    if ts <= 0 {
        return 0;
    }
    ts / (24 * 3600) / 30
}

pub fn mtime_term(ts: i64) -> String {
    mtime_bucket_term(mtime_bucket(ts))
}

pub fn mtime_bucket_term(month: i64) -> String {
    format!("mtime:m{month}")
}

pub fn ext_term(ext: &str) -> String {
    format!("ext:{}", ext.to_lowercase())
}
