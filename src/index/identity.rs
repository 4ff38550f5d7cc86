use crate::error::Result;
use crate::index::types::FileId;
use std::fs::Metadata;

/// Derive the stable id of an entry from its (device, inode, ctime) triple
#[cfg(unix)]
pub fn identify(metadata: &Metadata) -> Result<FileId> {
    use std::os::unix::fs::MetadataExt;

    Ok(file_id_from_parts(metadata.dev(), metadata.ino(), metadata.ctime()))
}

/// Platforms without inode data cannot produce stable ids
#[cfg(not(unix))]
pub fn identify(_metadata: &Metadata) -> Result<FileId> {
    Err(crate::error::Error::UnsupportedStat)
}

/// First 8 bytes (little-endian) of the BLAKE3 hash of `dev:ino:ctime`
pub fn file_id_from_parts(dev: u64, ino: u64, ctime: i64) -> FileId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(format!("{dev}:{ino}:{ctime}").as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}
