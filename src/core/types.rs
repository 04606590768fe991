use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ScreenError};

/// Length of the k-mers extracted from references and queries.
///
/// Fixed for a whole run: a database built with one size cannot be queried
/// with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KmerSize(usize);

impl KmerSize {
    /// Default k-mer size used by the CLI
    pub const DEFAULT: usize = 21;

    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` if `k` is zero.
    pub fn new(k: usize) -> Result<Self> {
        if k < 1 {
            return Err(ScreenError::Configuration(format!(
                "k-mer size must be at least 1, got {k}"
            )));
        }
        Ok(Self(k))
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for KmerSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl std::fmt::Display for KmerSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a reference genome in the database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceId(pub String);

impl ReferenceId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference genome as recorded at build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGenome {
    pub id: ReferenceId,

    /// Assembly accession (e.g. `GCA_000001405.29`) used for the TaxID join
    pub accession: String,

    /// Number of distinct k-mers in the genome
    pub kmer_count: usize,
}

impl ReferenceGenome {
    pub fn new(id: impl Into<String>, accession: impl Into<String>, kmer_count: usize) -> Self {
        Self {
            id: ReferenceId::new(id),
            accession: accession.into(),
            kmer_count,
        }
    }
}
