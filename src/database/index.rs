use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Position of a reference in `ReferenceDatabase::references`
pub type ReferenceIndexId = u32;

/// Exact inverted index from k-mer to the references containing it.
///
/// K-mers are held as full byte strings, so memory grows with the total
/// distinct k-mer length across the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceIndex {
    kmer_to_refs: FxHashMap<Box<[u8]>, Vec<ReferenceIndexId>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `reference` contains `kmer`.
    ///
    /// References are added in increasing id order, so a repeated add for the
    /// same reference only has to look at the last entry.
    pub fn add(&mut self, kmer: &[u8], reference: ReferenceIndexId) {
        if let Some(refs) = self.kmer_to_refs.get_mut(kmer) {
            if refs.last() != Some(&reference) {
                refs.push(reference);
            }
        } else {
            self.kmer_to_refs.insert(kmer.into(), vec![reference]);
        }
    }

    /// References containing `kmer`; empty if none
    #[must_use]
    pub fn lookup(&self, kmer: &[u8]) -> &[ReferenceIndexId] {
        self.kmer_to_refs.get(kmer).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn contains(&self, kmer: &[u8]) -> bool {
        self.kmer_to_refs.contains_key(kmer)
    }

    /// Number of distinct k-mers
    #[must_use]
    pub fn len(&self) -> usize {
        self.kmer_to_refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kmer_to_refs.is_empty()
    }

    pub fn kmers(&self) -> impl Iterator<Item = &[u8]> {
        self.kmer_to_refs.keys().map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut index = ReferenceIndex::new();
        index.add(b"AAAAA", 0);
        index.add(b"AAAAA", 0);
        index.add(b"AAAAA", 2);
        index.add(b"CCCCC", 1);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup(b"AAAAA"), &[0, 2]);
        assert_eq!(index.lookup(b"CCCCC"), &[1]);
        assert!(index.lookup(b"GGGGG").is_empty());
        assert!(index.contains(b"CCCCC"));
        assert!(!index.contains(b"GGGGG"));
    }
}
