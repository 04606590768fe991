//! Reference database builder.
//!
//! The `DatabaseBuilder` reads a directory of FASTA files, one genome per
//! file, and produces a [`ReferenceDatabase`]. Files are parsed in parallel
//! batches; each batch is merged into the exact k-mer index in file order.
//! Once every reference is indexed the distinct k-mer count is known, so the
//! Bloom filter is allocated at its final size and filled from the index
//! keys. Every indexed k-mer is therefore present in the filter.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::core::config::BloomConfig;
use crate::core::error::{Result, ScreenError};
use crate::core::kmer::extract_kmers;
use crate::core::types::{KmerSize, ReferenceGenome};
use crate::database::bloom::BloomFilter;
use crate::database::index::{ReferenceIndex, ReferenceIndexId};
use crate::database::store::ReferenceDatabase;
use crate::parsing::fasta::FastaRecords;
use crate::utils::validation::{extract_accession, is_fasta_file, reference_name};

/// A reference file parsed into its distinct k-mers
#[derive(Debug)]
struct LoadedReference {
    path: PathBuf,
    name: String,
    accession: String,
    kmers: Vec<Box<[u8]>>,
}

/// Builds a [`ReferenceDatabase`] from a directory of reference genomes
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    kmer_size: KmerSize,
    bloom: BloomConfig,
}

impl DatabaseBuilder {
    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` if `kmer_size` is zero or the
    /// Bloom filter parameters are invalid.
    pub fn new(kmer_size: usize, bloom: BloomConfig) -> Result<Self> {
        let kmer_size = KmerSize::new(kmer_size)?;
        bloom.validate()?;
        Ok(Self { kmer_size, bloom })
    }

    #[must_use]
    pub fn kmer_size(&self) -> KmerSize {
        self.kmer_size
    }

    /// Build the database from every FASTA file directly inside `directory`.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::DatabaseRead` if the directory is missing or
    /// unreadable, a reference file cannot be read, two files map to the same
    /// reference id (e.g. `virus.fa` and `virus.fa.gz`), or no file contains
    /// a sequence record.
    pub fn build(&self, directory: &Path) -> Result<ReferenceDatabase> {
        let files = reference_files(directory)?;
        info!(
            "Found {} reference files in {}",
            files.len(),
            directory.display()
        );

        let mut index = ReferenceIndex::new();
        let mut references: Vec<ReferenceGenome> = Vec::new();
        // Reference id to the file it came from
        let mut sources: FxHashMap<String, PathBuf> = FxHashMap::default();

        // Bounds how many parsed genomes are held in memory at once
        let batch_size = rayon::current_num_threads().max(1) * 2;

        for batch in files.chunks(batch_size) {
            let loaded = batch
                .par_iter()
                .map(|path| load_reference(path, self.kmer_size))
                .collect::<Result<Vec<_>>>()?;

            for reference in loaded.into_iter().flatten() {
                if let Some(first) = sources.get(&reference.name) {
                    return Err(ScreenError::DatabaseRead(format!(
                        "Reference id '{}' is shared by {} and {}",
                        reference.name,
                        first.display(),
                        reference.path.display()
                    )));
                }
                sources.insert(reference.name.clone(), reference.path.clone());

                let id = ReferenceIndexId::try_from(references.len()).map_err(|_| {
                    ScreenError::DatabaseRead("Too many reference genomes".to_string())
                })?;
                for kmer in &reference.kmers {
                    index.add(kmer, id);
                }
                debug!(
                    reference = %reference.name,
                    accession = %reference.accession,
                    kmers = reference.kmers.len(),
                    "Indexed reference"
                );
                references.push(ReferenceGenome::new(
                    reference.name,
                    reference.accession,
                    reference.kmers.len(),
                ));
            }
        }

        if references.is_empty() {
            return Err(ScreenError::DatabaseRead(format!(
                "No sequence records found in {}",
                directory.display()
            )));
        }

        let bloom = self.fill_bloom(&index)?;
        info!(
            references = references.len(),
            distinct_kmers = index.len(),
            bloom_bits = bloom.num_bits(),
            bloom_hashes = bloom.num_hashes(),
            "Reference database built"
        );

        Ok(ReferenceDatabase::new(
            self.kmer_size,
            bloom,
            index,
            references,
        ))
    }

    /// Size the filter from the distinct k-mer count and insert every index key
    fn fill_bloom(&self, index: &ReferenceIndex) -> Result<BloomFilter> {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let capacity = (index.len() as f64 * self.bloom.capacity_factor).ceil() as usize;

        let mut bloom = BloomFilter::with_rate(capacity, self.bloom.error_rate)?;
        for kmer in index.kmers() {
            bloom.insert(kmer);
        }
        Ok(bloom)
    }
}

/// FASTA files directly inside `directory`, sorted by path
fn reference_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(ScreenError::DatabaseRead(format!(
            "Reference directory not found: {}",
            directory.display()
        )));
    }

    let entries = std::fs::read_dir(directory).map_err(|e| {
        ScreenError::DatabaseRead(format!("Cannot read {}: {e}", directory.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| {
                ScreenError::DatabaseRead(format!("Cannot read {}: {e}", directory.display()))
            })?
            .path();
        if path.is_file() && is_fasta_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parse one reference file. Returns `None` for a file with no records.
fn load_reference(path: &Path, kmer_size: KmerSize) -> Result<Option<LoadedReference>> {
    let read_error =
        |e: std::io::Error| ScreenError::DatabaseRead(format!("{}: {e}", path.display()));

    let mut kmers: FxHashSet<Box<[u8]>> = FxHashSet::default();
    let mut first_header: Option<String> = None;

    for record in FastaRecords::open(path).map_err(read_error)? {
        let record = record.map_err(read_error)?;
        if first_header.is_none() {
            first_header = Some(record.name.clone());
        }
        // K-mers never span two records of the same file
        for kmer in extract_kmers(&record.sequence, kmer_size) {
            if !kmers.contains(kmer) {
                kmers.insert(kmer.into());
            }
        }
    }

    let Some(header) = first_header else {
        warn!("Skipping {}: no sequence records", path.display());
        return Ok(None);
    };

    let name = reference_name(path);
    let accession = extract_accession(&name)
        .or_else(|| extract_accession(&header))
        .unwrap_or_else(|| name.clone());

    Ok(Some(LoadedReference {
        path: path.to_path_buf(),
        name,
        accession,
        kmers: kmers.into_iter().collect(),
    }))
}
