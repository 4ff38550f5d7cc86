use thiserror::Error;

/// Errors produced by the index engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Platform stat data lacks device/inode/ctime.
    #[error("unsupported stat")]
    UnsupportedStat,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    /// Malformed postings data for a term.
    #[error("uvarint decode error for term {term_id}: {reason}")]
    Decode { term_id: u32, reason: &'static str },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
