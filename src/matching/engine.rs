use std::io;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::core::error::{Result, ScreenError};
use crate::core::kmer::unique_kmers;
use crate::database::index::ReferenceIndexId;
use crate::database::store::ReferenceDatabase;
use crate::matching::scoring::MatchRecord;
use crate::parsing::fasta::SequenceRecord;

/// Number of query records matched in parallel per batch
pub const QUERY_BATCH_SIZE: usize = 1024;

/// K-mers of one query shared with one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHit {
    pub reference: ReferenceIndexId,

    /// Positions in `QueryMatch::kmers` of the shared k-mers, ascending
    pub matched: Vec<usize>,
}

/// Result of matching a single query sequence against the database
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub name: String,

    /// Distinct query k-mers in order of first occurrence
    pub kmers: Vec<Box<[u8]>>,

    /// Candidate references, ordered by reference id
    pub hits: Vec<ReferenceHit>,
}

impl QueryMatch {
    /// Matched k-mers for one hit, in query order
    pub fn matched_kmers<'a>(&'a self, hit: &'a ReferenceHit) -> impl Iterator<Item = &'a [u8]> {
        hit.matched.iter().map(move |&i| self.kmers[i].as_ref())
    }

    /// One unscored-then-scored record per candidate reference
    #[must_use]
    pub fn records(&self, database: &ReferenceDatabase) -> Vec<MatchRecord> {
        self.hits
            .iter()
            .filter_map(|hit| {
                let reference = database.reference(hit.reference)?;
                Some(MatchRecord::new(
                    self.name.clone(),
                    self.kmers.len(),
                    reference.id.to_string(),
                    hit.matched.len(),
                    reference.kmer_count,
                    reference.accession.clone(),
                ))
            })
            .collect()
    }
}

/// Matches query sequences against a built [`ReferenceDatabase`].
///
/// Every k-mer that passes the Bloom filter is confirmed against the exact
/// index before it is counted, so filter false positives only cost a lookup.
pub struct SequenceMatcher<'a> {
    database: &'a ReferenceDatabase,
}

impl<'a> SequenceMatcher<'a> {
    pub fn new(database: &'a ReferenceDatabase) -> Self {
        Self { database }
    }

    /// Match a single query sequence.
    ///
    /// A sequence shorter than the k-mer size yields no k-mers and no hits.
    #[must_use]
    pub fn match_sequence(&self, name: &str, sequence: &[u8]) -> QueryMatch {
        let kmers = unique_kmers(sequence, self.database.kmer_size());
        let bloom = self.database.bloom();
        let index = self.database.index();

        let mut per_reference: FxHashMap<ReferenceIndexId, Vec<usize>> = FxHashMap::default();
        for (position, kmer) in kmers.iter().enumerate() {
            if !bloom.may_contain(kmer) {
                continue;
            }
            for &reference in index.lookup(kmer) {
                per_reference.entry(reference).or_default().push(position);
            }
        }

        let mut hits: Vec<ReferenceHit> = per_reference
            .into_iter()
            .map(|(reference, matched)| ReferenceHit { reference, matched })
            .collect();
        hits.sort_unstable_by_key(|hit| hit.reference);

        debug!(
            query = name,
            query_kmers = kmers.len(),
            matched_kmers = ?hits.iter().map(|h| h.matched.len()).collect::<Vec<_>>(),
            "Matched query"
        );

        QueryMatch {
            name: name.to_string(),
            kmers: kmers.into_iter().map(Box::from).collect(),
            hits,
        }
    }

    /// Match every record of a stream, in batches of [`QUERY_BATCH_SIZE`]
    /// spread over the rayon pool. `on_match` sees results in input order.
    ///
    /// Returns the number of records processed.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::InputRead` if the stream fails, or any error
    /// returned by `on_match`.
    pub fn match_records<I, F>(&self, records: I, mut on_match: F) -> Result<usize>
    where
        I: IntoIterator<Item = io::Result<SequenceRecord>>,
        F: FnMut(QueryMatch) -> Result<()>,
    {
        let mut records = records.into_iter();
        let mut processed = 0;

        loop {
            let batch = records
                .by_ref()
                .take(QUERY_BATCH_SIZE)
                .collect::<io::Result<Vec<_>>>()
                .map_err(|e| ScreenError::InputRead(e.to_string()))?;
            if batch.is_empty() {
                break;
            }

            let matches: Vec<QueryMatch> = batch
                .par_iter()
                .map(|record| self.match_sequence(&record.name, &record.sequence))
                .collect();

            processed += matches.len();
            for query_match in matches {
                on_match(query_match)?;
            }
        }

        Ok(processed)
    }
}
