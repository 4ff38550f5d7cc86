use crate::error::{Error, Result};
use crate::index::types::*;
use crate::utils::{decode_postings, read_offset_record, OFFSET_RECORD_SIZE};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read-only view of one index family.
///
/// The dictionary is loaded into memory; postings and offsets are memory-mapped.
/// Any number of readers may share the same files. A rebuild swaps new files in
/// by path, so an open reader keeps serving the previous view until reopened.
///
/// The three files are renamed one after another, so a reader opened during a
/// rebuild can see files from two builds. `open` rejects such a mix when the
/// term count or blob size differs; a mix of two builds with identical counts
/// and sizes is not detected.
pub struct FamilyReader {
    family: Family,
    dict: HashMap<String, TermId>,
    postings: Option<Mmap>,
    offsets: Option<Mmap>,
}

impl FamilyReader {
    /// Open a family from the configured index directory
    pub fn open(config: &IndexConfig, family: Family) -> Result<Self> {
        let files = config.family_files(family);
        let dict_file = File::open(&files.dict)?;
        let dict: HashMap<String, TermId> = serde_json::from_reader(BufReader::new(dict_file))?;

        let reader = Self {
            family,
            dict,
            postings: map_file(&files.postings)?,
            offsets: map_file(&files.offsets)?,
        };
        reader.check_consistent()?;
        Ok(reader)
    }

    /// Reject files from different builds: the offset table must hold one
    /// record per dictionary term and its last span must end the blob.
    fn check_consistent(&self) -> Result<()> {
        let table = self.offsets.as_deref().unwrap_or_default();
        if table.len() != self.dict.len() * OFFSET_RECORD_SIZE {
            return Err(Error::InvalidData(format!(
                "{} offset table holds {} bytes for {} terms",
                self.family,
                table.len(),
                self.dict.len()
            )));
        }

        let last = TermId::try_from(self.dict.len())
            .map_err(|_| Error::InvalidData(format!("too many terms in {}", self.family)))?;
        let end = read_offset_record(table, last)
            .map_or(0, |(offset, length)| offset.saturating_add(u64::from(length)));
        if end != self.postings_bytes() as u64 {
            return Err(Error::InvalidData(format!(
                "{} postings end at {end} but the blob is {} bytes",
                self.family,
                self.postings_bytes()
            )));
        }
        Ok(())
    }

    /// Term id for a term, 0 when absent
    pub fn term_id(&self, term: &str) -> TermId {
        self.dict.get(term).copied().unwrap_or(0)
    }

    /// Vocabulary size
    pub fn term_count(&self) -> usize {
        self.dict.len()
    }

    /// Dictionary entries whose term starts with `prefix`, in no particular order
    pub fn terms_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, TermId)> + 'a {
        self.dict
            .iter()
            .filter(move |(term, _)| term.starts_with(prefix))
            .map(|(term, &id)| (term.as_str(), id))
    }

    /// Size of the postings blob in bytes
    pub fn postings_bytes(&self) -> usize {
        self.postings.as_deref().map_or(0, <[u8]>::len)
    }

    /// Ascending file ids for a term id; term id 0 yields an empty list
    pub fn posting(&self, term_id: TermId) -> Result<Vec<FileId>> {
        self.decode(term_id, None)
    }

    /// Like [`posting`](Self::posting) but stops after `cap` ids
    pub fn posting_capped(&self, term_id: TermId, cap: usize) -> Result<Vec<FileId>> {
        self.decode(term_id, Some(cap))
    }

    /// Postings for a term string
    pub fn term_posting(&self, term: &str) -> Result<Vec<FileId>> {
        self.posting(self.term_id(term))
    }

    /// Release both mappings
    pub fn close(self) {}

    fn decode(&self, term_id: TermId, cap: Option<usize>) -> Result<Vec<FileId>> {
        let table = self.offsets.as_deref().unwrap_or_default();
        let Some((offset, length)) = read_offset_record(table, term_id) else {
            return Ok(Vec::new());
        };

        let data = self.postings.as_deref().unwrap_or_default();
        let start = usize::try_from(offset).map_err(|_| Error::Decode {
            term_id,
            reason: "offset overflow",
        })?;
        let span = start
            .checked_add(length as usize)
            .and_then(|end| data.get(start..end))
            .ok_or(Error::Decode {
                term_id,
                reason: "span past end of postings",
            })?;

        decode_postings(span, cap).map_err(|reason| Error::Decode { term_id, reason })
    }
}

/// Map a file read-only; zero-length files map to None
fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(None);
    }
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Some(mmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::writer::IndexWriter;
    use std::fs;
    use tempfile::TempDir;

    fn build(dir: &TempDir, terms: &TermMap) -> IndexConfig {
        let config = IndexConfig::new(dir.path());
        IndexWriter::new(&config).write_family(Family::Name, terms).unwrap();
        config
    }

    #[test]
    fn test_posting_returns_written_set() {
        let dir = TempDir::new().unwrap();
        let mut terms = TermMap::new();
        for id in [30, 10, 20, 10] {
            terms.add("video", id);
        }
        terms.add("audio", u64::MAX);
        let config = build(&dir, &terms);

        let reader = FamilyReader::open(&config, Family::Name).unwrap();
        assert_eq!(reader.term_count(), 2);
        assert_eq!(reader.term_posting("video").unwrap(), vec![10, 20, 30]);
        assert_eq!(reader.term_posting("audio").unwrap(), vec![u64::MAX]);
        reader.close();
    }

    #[test]
    fn test_absent_term_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut terms = TermMap::new();
        terms.add("a", 1);
        let config = build(&dir, &terms);

        let reader = FamilyReader::open(&config, Family::Name).unwrap();
        assert_eq!(reader.term_id("zzz"), 0);
        assert!(reader.posting(0).unwrap().is_empty());
        assert!(reader.posting(99).unwrap().is_empty());
    }

    #[test]
    fn test_posting_capped() {
        let dir = TempDir::new().unwrap();
        let mut terms = TermMap::new();
        for id in 1..=50 {
            terms.add("ab", id);
        }
        let config = build(&dir, &terms);

        let reader = FamilyReader::open(&config, Family::Name).unwrap();
        let id = reader.term_id("ab");
        assert_eq!(reader.posting_capped(id, 5).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(reader.posting_capped(id, 0).unwrap().len(), 50);
    }

    #[test]
    fn test_empty_family_opens() {
        let dir = TempDir::new().unwrap();
        let config = build(&dir, &TermMap::new());

        let reader = FamilyReader::open(&config, Family::Name).unwrap();
        assert_eq!(reader.term_count(), 0);
        assert_eq!(reader.postings_bytes(), 0);
        assert!(reader.posting(1).unwrap().is_empty());
    }

    #[test]
    fn test_missing_family_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let config = IndexConfig::new(dir.path());
        assert!(FamilyReader::open(&config, Family::Path).is_err());
    }

    #[test]
    fn test_mixed_builds_are_rejected() {
        let old_dir = TempDir::new().unwrap();
        let new_dir = TempDir::new().unwrap();
        let mut old_terms = TermMap::new();
        old_terms.add("a", 1);
        let mut new_terms = TermMap::new();
        new_terms.add("a", 1);
        new_terms.add("b", 300);
        let old = build(&old_dir, &old_terms);
        let new = build(&new_dir, &new_terms);

        // New postings and dictionary next to the previous offset table
        let old_files = old.family_files(Family::Name);
        let new_files = new.family_files(Family::Name);
        fs::copy(&new_files.postings, &old_files.postings).unwrap();
        fs::copy(&new_files.dict, &old_files.dict).unwrap();
        assert!(matches!(
            FamilyReader::open(&old, Family::Name),
            Err(Error::InvalidData(_))
        ));

        // Matching table but a postings blob from another build
        fs::copy(&new_files.offsets, &old_files.offsets).unwrap();
        fs::write(&old_files.postings, [1u8, 1]).unwrap();
        assert!(matches!(
            FamilyReader::open(&old, Family::Name),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_corrupt_postings_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let mut terms = TermMap::new();
        terms.add("x", 1);
        let config = build(&dir, &terms);

        // Truncated varint where the doc count should be
        let files = config.family_files(Family::Name);
        fs::write(&files.postings, [0x80u8, 0x80]).unwrap();

        let reader = FamilyReader::open(&config, Family::Name).unwrap();
        let err = reader.term_posting("x").unwrap_err();
        assert!(matches!(err, Error::Decode { term_id: 1, .. }));
    }
}
