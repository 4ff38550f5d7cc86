pub mod executor;
pub mod files;
pub mod op;
pub mod parser;

pub use executor::{SearchEngine, SearchRequest, SizeFilter};
pub use files::{parse_file_size, FilesQuery};
pub use op::{CompareOp, Operator};
pub use parser::{parse, parse_with_tag_mapping, Predicate};
