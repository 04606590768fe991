//! Readers and writers for the files a screening run touches.
//!
//! - [`fasta`]: streaming FASTA reader, plain or gzip-compressed
//! - [`tables`]: the matching-results and scored CSV tables
//! - [`taxid`]: the accession to TaxID map

pub mod fasta;
pub mod tables;
pub mod taxid;
