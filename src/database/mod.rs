//! Reference database: a Bloom pre-filter over an exact k-mer index.
//!
//! - [`BloomFilter`](bloom::BloomFilter): probabilistic membership, no false
//!   negatives
//! - [`ReferenceIndex`](index::ReferenceIndex): k-mer to reference ids
//! - [`DatabaseBuilder`](builder::DatabaseBuilder): builds both from a
//!   directory of FASTA files
//! - [`ReferenceDatabase`](store::ReferenceDatabase): the built, immutable
//!   database, with save and load

pub mod bloom;
pub mod builder;
pub mod index;
pub mod store;
