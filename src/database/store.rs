use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ScreenError};
use crate::core::types::{KmerSize, ReferenceGenome};
use crate::database::bloom::BloomFilter;
use crate::database::index::{ReferenceIndex, ReferenceIndexId};

/// On-disk format version for saved databases
pub const DATABASE_VERSION: &str = "1.0.0";

const DATABASE_MAGIC: [u8; 4] = *b"KSDB";

/// Record following the magic bytes of a saved database file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseHeader {
    version: String,
    created_at: String,
}

/// A built reference database: Bloom pre-filter, exact k-mer index and
/// per-reference metadata. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDatabase {
    kmer_size: KmerSize,
    bloom: BloomFilter,
    index: ReferenceIndex,
    references: Vec<ReferenceGenome>,
}

/// Summary statistics for display
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseSummary {
    pub kmer_size: usize,
    pub references: usize,
    pub distinct_kmers: usize,
    pub bloom_bits: u64,
    pub bloom_hashes: u32,
    pub bloom_error_rate: f64,
    pub bloom_estimated_error_rate: f64,
    pub genomes: Vec<ReferenceGenome>,
}

impl ReferenceDatabase {
    pub(crate) fn new(
        kmer_size: KmerSize,
        bloom: BloomFilter,
        index: ReferenceIndex,
        references: Vec<ReferenceGenome>,
    ) -> Self {
        Self {
            kmer_size,
            bloom,
            index,
            references,
        }
    }

    #[must_use]
    pub fn kmer_size(&self) -> KmerSize {
        self.kmer_size
    }

    #[must_use]
    pub fn bloom(&self) -> &BloomFilter {
        &self.bloom
    }

    #[must_use]
    pub fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    #[must_use]
    pub fn references(&self) -> &[ReferenceGenome] {
        &self.references
    }

    #[must_use]
    pub fn reference(&self, id: ReferenceIndexId) -> Option<&ReferenceGenome> {
        self.references.get(id as usize)
    }

    /// Number of references in the database
    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> DatabaseSummary {
        DatabaseSummary {
            kmer_size: self.kmer_size.get(),
            references: self.references.len(),
            distinct_kmers: self.index.len(),
            bloom_bits: self.bloom.num_bits(),
            bloom_hashes: self.bloom.num_hashes(),
            bloom_error_rate: self.bloom.error_rate(),
            bloom_estimated_error_rate: self.bloom.estimated_error_rate(),
            genomes: self.references.clone(),
        }
    }

    /// Write the database to `path`
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::Io` if the file cannot be written or
    /// `ScreenError::Serialization` if encoding fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let header = DatabaseHeader {
            version: DATABASE_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&DATABASE_MAGIC)?;
        bincode::serialize_into(&mut writer, &header)?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a database previously written by [`ReferenceDatabase::save`]
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::DatabaseRead` if the file is missing, is not a
    /// saved database, or was written by an incompatible version.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            ScreenError::DatabaseRead(format!("Cannot open {}: {e}", path.display()))
        })?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        if reader.read_exact(&mut magic).is_err() || magic != DATABASE_MAGIC {
            return Err(ScreenError::DatabaseRead(format!(
                "{} is not a database file",
                path.display()
            )));
        }

        let header: DatabaseHeader = bincode::deserialize_from(&mut reader).map_err(|e| {
            ScreenError::DatabaseRead(format!("Corrupt database header in {}: {e}", path.display()))
        })?;
        if header.version != DATABASE_VERSION {
            return Err(ScreenError::DatabaseRead(format!(
                "Database version mismatch (expected {DATABASE_VERSION}, found {})",
                header.version
            )));
        }

        let database: Self = bincode::deserialize_from(&mut reader).map_err(|e| {
            ScreenError::DatabaseRead(format!("Corrupt database {}: {e}", path.display()))
        })?;
        tracing::debug!(
            created_at = %header.created_at,
            references = database.len(),
            "Loaded database"
        );
        Ok(database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_database() -> ReferenceDatabase {
        let k = KmerSize::new(3).unwrap();
        let mut index = ReferenceIndex::new();
        index.add(b"ACG", 0);
        index.add(b"CGT", 0);
        index.add(b"CGT", 1);
        let mut bloom = BloomFilter::with_rate(index.len(), 0.01).unwrap();
        for kmer in index.kmers() {
            bloom.insert(kmer);
        }
        let references = vec![
            ReferenceGenome::new("ref_a", "GCA_000001.1", 2),
            ReferenceGenome::new("ref_b", "GCA_000002.1", 1),
        ];
        ReferenceDatabase::new(k, bloom, index, references)
    }

    #[test]
    fn test_save_and_load() {
        let db = tiny_database();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.ksdb");
        db.save(&path).unwrap();

        let loaded = ReferenceDatabase::load(&path).unwrap();
        assert_eq!(loaded.kmer_size().get(), 3);
        assert_eq!(loaded.references(), db.references());
        assert_eq!(loaded.index().lookup(b"CGT"), &[0, 1]);
        assert!(loaded.bloom().may_contain(b"ACG"));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.ksdb");
        std::fs::write(&path, b"definitely not a database").unwrap();
        assert!(matches!(
            ReferenceDatabase::load(&path),
            Err(ScreenError::DatabaseRead(_))
        ));

        let missing = dir.path().join("missing.ksdb");
        assert!(matches!(
            ReferenceDatabase::load(&missing),
            Err(ScreenError::DatabaseRead(_))
        ));
    }

    #[test]
    fn test_summary() {
        let summary = tiny_database().summary();
        assert_eq!(summary.references, 2);
        assert_eq!(summary.distinct_kmers, 2);
        assert_eq!(summary.kmer_size, 3);
        assert_eq!(summary.genomes[1].accession, "GCA_000002.1");
    }
}
