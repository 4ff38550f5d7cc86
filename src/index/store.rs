//! Metadata store: the source of truth for every indexed entry.
//!
//! Two keys are written per entry:
//! - `f:<decimal id>` holds the JSON-encoded [`FileMeta`]
//! - `p:<slash path>` holds the decimal id (reverse lookup for path queries)
//!
//! Entries are overwritten on each indexing pass and never pruned.

use crate::error::Result;
use crate::index::types::{FileId, FileMeta};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::trace;

const META_PREFIX: &str = "f:";
const PATH_PREFIX: &str = "p:";

/// Ordered key-value backend
pub trait MetaStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Last writer wins
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Visit every pair whose key starts with `prefix`, in key order.
    /// Stops when the visitor returns false.
    fn iterate_prefix(&self, prefix: &str, visit: &mut dyn FnMut(&str, &[u8]) -> bool) -> Result<()>;

    /// Make prior writes durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// In-memory store for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetaStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn iterate_prefix(&self, prefix: &str, visit: &mut dyn FnMut(&str, &[u8]) -> bool) -> Result<()> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        for (key, value) in entries.range(prefix.to_string()..) {
            if !key.starts_with(prefix) || !visit(key.as_str(), value.as_slice()) {
                break;
            }
        }
        Ok(())
    }
}

/// Persistent store backed by sled
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create a database at the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Throwaway database, removed on drop
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

impl MetaStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn iterate_prefix(&self, prefix: &str, visit: &mut dyn FnMut(&str, &[u8]) -> bool) -> Result<()> {
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, value) = item?;
            let key = String::from_utf8_lossy(&key);
            if !visit(key.as_ref(), value.as_ref()) {
                break;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// Typed view over a [`MetaStore`]
#[derive(Clone)]
pub struct MetaCatalog {
    store: Arc<dyn MetaStore>,
}

impl MetaCatalog {
    pub fn new(store: Arc<dyn MetaStore>) -> Self {
        Self { store }
    }

    /// Catalog over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Write both keys for an entry, replacing any prior values
    pub fn persist(&self, meta: &FileMeta) -> Result<()> {
        let json = serde_json::to_vec(meta)?;
        self.store.set(&meta_key(meta.file_id), &json)?;
        self.store
            .set(&path_key(&meta.path), meta.file_id.to_string().as_bytes())?;
        Ok(())
    }

    /// Metadata for an id; None when unknown
    pub fn load(&self, id: FileId) -> Result<Option<FileMeta>> {
        match self.store.get(&meta_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Reverse lookup by exact slash path; None when unknown
    pub fn id_by_path(&self, path: &str) -> Result<Option<FileId>> {
        let Some(bytes) = self.store.get(&path_key(path))? else {
            return Ok(None);
        };
        let text = String::from_utf8_lossy(&bytes);
        match text.trim().parse::<FileId>() {
            Ok(id) => Ok(Some(id)),
            Err(_) => Err(crate::error::Error::InvalidData(format!(
                "non-numeric id for path {path}"
            ))),
        }
    }

    /// Flush the underlying store
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Visit every stored entry in key order; corrupt records are skipped
    pub fn for_each_meta(&self, mut visit: impl FnMut(FileMeta)) -> Result<()> {
        self.store.iterate_prefix(META_PREFIX, &mut |key, value| {
            match serde_json::from_slice::<FileMeta>(value) {
                Ok(meta) => visit(meta),
                Err(e) => trace!(key, error = %e, "skipping corrupt metadata record"),
            }
            true
        })
    }
}

fn meta_key(id: FileId) -> String {
    format!("{META_PREFIX}{id}")
}

fn path_key(path: &str) -> String {
    format!("{PATH_PREFIX}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: FileId, path: &str) -> FileMeta {
        FileMeta {
            file_id: id,
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_persist_writes_both_keys() {
        let store = Arc::new(MemoryStore::new());
        let catalog = MetaCatalog::new(store.clone());
        catalog.persist(&sample(42, "/a/b.txt")).unwrap();

        assert_eq!(store.get("p:/a/b.txt").unwrap(), Some(b"42".to_vec()));
        let raw = store.get("f:42").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["path"], "/a/b.txt");
    }

    #[test]
    fn test_load_and_reverse_lookup() {
        let catalog = MetaCatalog::in_memory();
        let meta = sample(7, "/x/y.mp4");
        catalog.persist(&meta).unwrap();

        assert_eq!(catalog.load(7).unwrap(), Some(meta));
        assert_eq!(catalog.id_by_path("/x/y.mp4").unwrap(), Some(7));
        assert_eq!(catalog.load(8).unwrap(), None);
        assert_eq!(catalog.id_by_path("/nope").unwrap(), None);
    }

    #[test]
    fn test_persist_overwrites() {
        let catalog = MetaCatalog::in_memory();
        catalog.persist(&sample(1, "/a")).unwrap();
        let mut updated = sample(1, "/a");
        updated.size = 99;
        catalog.persist(&updated).unwrap();

        assert_eq!(catalog.load(1).unwrap().unwrap().size, 99);
    }

    #[test]
    fn test_for_each_meta_skips_corrupt() {
        let store = Arc::new(MemoryStore::new());
        let catalog = MetaCatalog::new(store.clone());
        catalog.persist(&sample(1, "/a")).unwrap();
        catalog.persist(&sample(2, "/b")).unwrap();
        store.set("f:3", b"{not json").unwrap();

        let mut seen = Vec::new();
        catalog.for_each_meta(|m| seen.push(m.file_id)).unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_memory_prefix_iteration_stops() {
        let store = MemoryStore::new();
        store.set("f:1", b"a").unwrap();
        store.set("f:2", b"b").unwrap();
        store.set("p:/x", b"1").unwrap();

        let mut keys = Vec::new();
        store
            .iterate_prefix("f:", &mut |k, _| {
                keys.push(k.to_string());
                false
            })
            .unwrap();
        assert_eq!(keys, vec!["f:1"]);
    }

    #[test]
    fn test_sled_store_roundtrip() {
        let catalog = MetaCatalog::new(Arc::new(SledStore::open_temporary().unwrap()));
        catalog.persist(&sample(5, "/s/t.bin")).unwrap();
        catalog.flush().unwrap();

        assert_eq!(catalog.id_by_path("/s/t.bin").unwrap(), Some(5));
        let mut count = 0;
        catalog.for_each_meta(|_| count += 1).unwrap();
        assert_eq!(count, 1);
    }
}
