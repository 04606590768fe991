//! Core types shared by the database, matcher and CLI.
//!
//! - [`KmerSize`](types::KmerSize), [`ReferenceId`](types::ReferenceId) and
//!   [`ReferenceGenome`](types::ReferenceGenome): reference metadata
//! - [`kmer`]: sequence normalization and sliding-window k-mer extraction
//! - [`config`]: run parameters and their validation
//! - [`error`]: the crate-wide error type
//!
//! ## K-mers
//!
//! A k-mer is any length-`k` substring of a normalized sequence. Sequences are
//! upper-cased and stripped of whitespace before extraction, so a soft-masked
//! reference and an upper-case query compare equal. K-mers are not
//! canonicalized: a k-mer and its reverse complement are different k-mers.

pub mod config;
pub mod error;
pub mod kmer;
pub mod types;
