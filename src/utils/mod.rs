//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration and data directory management (XDG-compliant)
//! - [`encoding`] - Unsigned varint and delta-encoded postings
//! - [`paths`] - Lexical clean/join for slash paths
//! - [`progress`] - Optional progress spinners
//! - [`sorted`] - Intersect/union over sorted id lists
//! - [`tokenizer`] - Exact tokens and fuzzy n-grams for names and paths
//!
//! ## Key Functions
//!
//! ```
//! use nasfind::utils::{build_ngrams, tokenize};
//!
//! assert_eq!(tokenize("IMG_1048.mp4"), vec!["img", "1048", "mp4"]);
//! assert_eq!(build_ngrams("clip"), vec!["cl", "li", "ip"]);
//! ```

pub mod app_data;
pub mod encoding;
pub mod paths;
pub mod progress;
pub mod sorted;
pub mod tokenizer;

pub use app_data::*;
pub use encoding::*;
pub use sorted::*;
pub use tokenizer::*;
