use crate::error::{Error, Result};
use crate::index::types::*;
use crate::utils::{encode_postings, write_offset_record};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Materializes term maps into on-disk index families
pub struct IndexWriter {
    index_dir: PathBuf,
}

impl IndexWriter {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            index_dir: config.index_dir.clone(),
        }
    }

    /// Write the dictionary, postings blob, and offset table of one family.
    ///
    /// Term ids are assigned 1..N in lexicographic order, so the same term map
    /// always produces byte-identical files. Each file is written beside its
    /// target and renamed into place, dictionary last. The three renames are
    /// not one atomic step; [`FamilyReader::open`] rejects a mix of builds
    /// whose term counts or blob sizes differ. Returns the number of terms
    /// written.
    ///
    /// [`FamilyReader::open`]: crate::index::FamilyReader::open
    pub fn write_family(&self, family: Family, terms: &TermMap) -> Result<usize> {
        fs::create_dir_all(&self.index_dir)?;
        let files = FamilyFiles::new(&self.index_dir, family);

        let dict_tmp = tmp_path(&files.dict);
        let postings_tmp = tmp_path(&files.postings);
        let offsets_tmp = tmp_path(&files.offsets);

        let mut dict: BTreeMap<&str, TermId> = BTreeMap::new();
        let mut postings = BufWriter::new(File::create(&postings_tmp)?);
        let mut offsets = BufWriter::new(File::create(&offsets_tmp)?);

        let mut offset: u64 = 0;
        let mut buf = Vec::new();

        for (i, term) in terms.sorted_terms().into_iter().enumerate() {
            let term_id = TermId::try_from(i + 1)
                .map_err(|_| Error::InvalidData(format!("too many terms in {family}")))?;

            let mut ids: Vec<FileId> = terms.get(term).unwrap_or_default().to_vec();
            ids.sort_unstable();
            ids.dedup();

            buf.clear();
            encode_postings(&ids, &mut buf);
            let length = u32::try_from(buf.len()).map_err(|_| {
                Error::InvalidData(format!("postings for {term:?} exceed u32 length"))
            })?;

            postings.write_all(&buf)?;
            write_offset_record(&mut offsets, offset, length)?;
            offset += buf.len() as u64;

            dict.insert(term, term_id);
        }

        postings.flush()?;
        offsets.flush()?;
        drop(postings);
        drop(offsets);

        let mut dict_writer = BufWriter::new(File::create(&dict_tmp)?);
        serde_json::to_writer(&mut dict_writer, &dict)?;
        dict_writer.flush()?;
        drop(dict_writer);

        fs::rename(&postings_tmp, &files.postings)?;
        fs::rename(&offsets_tmp, &files.offsets)?;
        fs::rename(&dict_tmp, &files.dict)?;

        debug!(family = %family, terms = dict.len(), bytes = offset, "wrote index family");
        Ok(dict.len())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
