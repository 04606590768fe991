//! # kmer-screen
//!
//! A library for classifying sequences against a collection of reference
//! genomes by shared k-mer content.
//!
//! Every reference genome in a directory of FASTA files is reduced to its set
//! of distinct k-mers. A Bloom filter over all reference k-mers discards query
//! k-mers that cannot match, and an exact k-mer index resolves the rest to the
//! references that contain them. Each (query, reference) pair is then scored
//! by Jaccard similarity and reference coverage, thresholded, and reduced to
//! the single best reference per query.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kmer_screen::{DatabaseBuilder, SequenceMatcher, Thresholds};
//! use kmer_screen::core::config::BloomConfig;
//! use kmer_screen::matching::scoring::score;
//! use std::path::Path;
//!
//! let db = DatabaseBuilder::new(21, BloomConfig::default())
//!     .unwrap()
//!     .build(Path::new("references/"))
//!     .unwrap();
//!
//! let matcher = SequenceMatcher::new(&db);
//! let query = matcher.match_sequence("read1", b"ACGTACGTACGTACGTACGTACGTACGT");
//!
//! for hit in score(query.records(&db), &Thresholds::default()) {
//!     println!("{} -> {} ({:.4})", hit.query_name, hit.reference, hit.jaccard);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: k-mers, reference metadata, configuration and errors
//! - [`database`]: Bloom filter, k-mer index, builder and persistence
//! - [`matching`]: sequence matcher and scorer
//! - [`parsing`]: FASTA input, CSV tables and the TaxID map
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod database;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::config::{ScreenConfig, Thresholds};
pub use core::error::{Result, ScreenError};
pub use core::types::*;
pub use database::builder::DatabaseBuilder;
pub use database::store::ReferenceDatabase;
pub use matching::engine::{QueryMatch, SequenceMatcher};
pub use matching::scoring::MatchRecord;
