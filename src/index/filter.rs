//! Coarse pre-filters over the `filter` family.
//!
//! Size and mtime are bucketed at build time, so a comparison selects whole
//! buckets. Exact comparison against the stored metadata happens afterwards
//! in the query engine.

use crate::error::Result;
use crate::index::reader::FamilyReader;
use crate::index::types::*;
use crate::query::op::CompareOp;
use roaring::RoaringTreemap;
use tracing::warn;

const MTIME_TERM_PREFIX: &str = "mtime:m";

/// Buckets that may hold sizes satisfying `<op> bytes`
pub fn size_buckets_for(op: CompareOp, bytes: u64) -> Vec<SizeBucket> {
    let target = SizeBucket::of(bytes);
    SizeBucket::ALL
        .into_iter()
        .filter(|&b| op.admits_bucket(b, target))
        .collect()
}

/// Reader over the filter family
pub struct FilterIndex {
    reader: FamilyReader,
}

impl FilterIndex {
    pub fn open(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            reader: FamilyReader::open(config, Family::Filter)?,
        })
    }

    /// Union of the postings of every size bucket admitted by the comparison
    pub fn size_ids(&self, op: CompareOp, bytes: u64) -> Result<RoaringTreemap> {
        let mut ids = RoaringTreemap::new();
        for bucket in size_buckets_for(op, bytes) {
            self.union_term(&bucket.term(), &mut ids)?;
        }
        Ok(ids)
    }

    /// Entries with the given extension (case-insensitive, no dot)
    pub fn ext_ids(&self, ext: &str) -> Result<RoaringTreemap> {
        let mut ids = RoaringTreemap::new();
        self.union_term(&ext_term(ext.trim_start_matches('.')), &mut ids)?;
        Ok(ids)
    }

    /// Union of the month buckets admitted by `<op> unix_secs`
    pub fn mtime_ids(&self, op: CompareOp, unix_secs: i64) -> Result<RoaringTreemap> {
        let target = mtime_bucket(unix_secs);
        let mut ids = RoaringTreemap::new();

        for (term, term_id) in self.reader.terms_with_prefix(MTIME_TERM_PREFIX) {
            let Ok(month) = term[MTIME_TERM_PREFIX.len()..].parse::<i64>() else {
                continue;
            };
            if op.admits_bucket(month, target) {
                ids.extend(self.reader.posting(term_id)?);
            }
        }
        Ok(ids)
    }

    fn union_term(&self, term: &str, ids: &mut RoaringTreemap) -> Result<()> {
        let term_id = self.reader.term_id(term);
        if term_id > 0 {
            ids.extend(self.reader.posting(term_id)?);
        }
        Ok(())
    }
}

/// Size-filter ids for the query engine; a missing or unreadable filter
/// family yields an empty set
pub fn size_filter_ids(config: &IndexConfig, op: CompareOp, bytes: u64) -> Vec<FileId> {
    let ids = FilterIndex::open(config).and_then(|index| index.size_ids(op, bytes));
    match ids {
        Ok(ids) => ids.iter().collect(),
        Err(e) => {
            warn!(error = %e, "filter index unavailable");
            Vec::new()
        }
    }
}
