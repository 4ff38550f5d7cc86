pub mod build;
pub mod filter;
pub mod identity;
pub mod reader;
pub mod stats;
pub mod store;
pub mod types;
pub mod writer;

pub use build::{build_filter_index, index_paths, IndexOptions, IndexReport};
pub use filter::FilterIndex;
pub use identity::identify;
pub use reader::FamilyReader;
pub use stats::index_exists;
pub use store::{MemoryStore, MetaCatalog, MetaStore, SledStore};
pub use types::*;
pub use writer::IndexWriter;
