//! K-mer extraction.
//!
//! K-mers are taken with a sliding window of step 1, so a sequence of length
//! `n >= k` yields `n - k + 1` k-mers and a shorter sequence yields none.
//! Reference and query extraction share these functions.

use rustc_hash::FxHashSet;

use crate::core::types::KmerSize;

/// Upper-case a raw sequence and drop any embedded whitespace.
///
/// Soft-masked (lower-case) bases would otherwise never match their
/// upper-case counterparts.
#[must_use]
pub fn normalize_sequence(raw: &[u8]) -> Vec<u8> {
    raw.iter()
        .filter(|b| !b.is_ascii_whitespace())
        .map(u8::to_ascii_uppercase)
        .collect()
}

/// All overlapping k-mers of `sequence` in positional order, duplicates included.
pub fn extract_kmers(sequence: &[u8], k: KmerSize) -> impl Iterator<Item = &[u8]> {
    // `windows` yields nothing when k > len
    sequence.windows(k.get())
}

/// Distinct k-mers of `sequence`, in order of first occurrence.
#[must_use]
pub fn unique_kmers(sequence: &[u8], k: KmerSize) -> Vec<&[u8]> {
    let mut seen: FxHashSet<&[u8]> = FxHashSet::default();
    extract_kmers(sequence, k)
        .filter(|kmer| seen.insert(kmer))
        .collect()
}

/// Join k-mers into the comma-separated form used by the matching table
#[must_use]
pub fn join_kmers<'a>(kmers: impl IntoIterator<Item = &'a [u8]>) -> String {
    let mut out = String::new();
    for (i, kmer) in kmers.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&String::from_utf8_lossy(kmer));
    }
    out
}
