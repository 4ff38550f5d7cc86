//! # nasfind - File Search Index for NAS Volumes
//!
//! nasfind walks storage roots, keeps per-entry metadata in an embedded
//! key-value store, and builds memory-mapped inverted indexes over file
//! names and paths for fast keyword, path, and fuzzy search.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Identity, metadata store, index families (build + read), filter buckets
//! - [`query`] - Query language, operators, and the search engine
//! - [`utils`] - Tokenizer, postings codec, sorted-set helpers, configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use nasfind::index::{index_paths, IndexConfig, IndexOptions, MetaCatalog};
//! use nasfind::query::SearchEngine;
//! use std::path::PathBuf;
//!
//! let config = IndexConfig::new("/var/lib/nasfind/searchidx");
//! let catalog = MetaCatalog::in_memory();
//!
//! // Walk a volume and write all five index families
//! let roots = vec![PathBuf::from("/mnt/usb1")];
//! index_paths(&config, &catalog, &roots, IndexOptions::default()).unwrap();
//!
//! // Keyword search over file names
//! let engine = SearchEngine::new(config, catalog);
//! for path in engine.search("holiday", "", 0, 50, None).unwrap() {
//!     println!("{path}");
//! }
//! ```
//!
//! ## Index Families
//!
//! Five independent families share one on-disk layout
//! (`<family>.dict.json`, `<family>.postings.dat`, `<family>.postings.idx`):
//!
//! 1. **name / path** - Exact lowercase tokens of the file name or full path
//! 2. **name_ngram / path_ngram** - 2-grams used as a fuzzy fallback
//! 3. **filter** - Extension, size bucket, and mtime bucket terms
//!
//! Postings are delta-encoded varints, located through a fixed-width offset
//! table so a term's postings are one lookup away.

pub mod error;
pub mod index;
pub mod query;
pub mod utils;

pub use error::{Error, Result};
