use std::cmp::Ordering;

use crate::core::config::Thresholds;

/// Safely convert usize to f64 for ratio calculations
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Jaccard similarity of the query k-mer set Q and a reference k-mer set R,
/// given `matched = |Q ∩ R|`: `|M| / (|Q| + |R| - |M|)`.
///
/// Returns 0.0 when either set is empty.
#[must_use]
pub fn jaccard(query_kmers: usize, matched_kmers: usize, reference_kmers: usize) -> f64 {
    if query_kmers == 0 || reference_kmers == 0 {
        return 0.0;
    }
    let union = (query_kmers + reference_kmers).saturating_sub(matched_kmers);
    if union == 0 {
        return 0.0;
    }
    (count_to_f64(matched_kmers) / count_to_f64(union)).clamp(0.0, 1.0)
}

/// Fraction of the reference's k-mers recovered by the query: `|M| / |R|`.
///
/// Returns 0.0 when either set is empty.
#[must_use]
pub fn coverage(query_kmers: usize, matched_kmers: usize, reference_kmers: usize) -> f64 {
    if query_kmers == 0 || reference_kmers == 0 {
        return 0.0;
    }
    (count_to_f64(matched_kmers) / count_to_f64(reference_kmers)).clamp(0.0, 1.0)
}

/// One (query, reference) pair with its similarity scores
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub query_name: String,
    /// Distinct k-mers in the query
    pub query_kmers: usize,
    pub reference: String,
    /// Distinct k-mers shared by query and reference
    pub matched_kmers: usize,
    /// Distinct k-mers in the reference
    pub reference_kmers: usize,
    pub accession: String,
    pub jaccard: f64,
    pub coverage: f64,
}

impl MatchRecord {
    #[must_use]
    pub fn new(
        query_name: String,
        query_kmers: usize,
        reference: String,
        matched_kmers: usize,
        reference_kmers: usize,
        accession: String,
    ) -> Self {
        Self {
            jaccard: jaccard(query_kmers, matched_kmers, reference_kmers),
            coverage: coverage(query_kmers, matched_kmers, reference_kmers),
            query_name,
            query_kmers,
            reference,
            matched_kmers,
            reference_kmers,
            accession,
        }
    }

    #[must_use]
    pub fn passes(&self, thresholds: &Thresholds) -> bool {
        self.jaccard >= thresholds.jaccard && self.coverage >= thresholds.coverage
    }
}

/// Best-first ordering within one query: Jaccard, then coverage, descending
fn by_score_desc(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    b.jaccard
        .total_cmp(&a.jaccard)
        .then_with(|| b.coverage.total_cmp(&a.coverage))
}

/// Filter records by `thresholds` and keep the single best record per query.
///
/// Output is ordered by query name. Records with identical scores for the
/// same query keep their input order, so the first one seen wins.
#[must_use]
pub fn score<I>(records: I, thresholds: &Thresholds) -> Vec<MatchRecord>
where
    I: IntoIterator<Item = MatchRecord>,
{
    let mut passing: Vec<MatchRecord> = records
        .into_iter()
        .filter(|r| r.passes(thresholds))
        .collect();

    // Stable: ties keep input order
    passing.sort_by(|a, b| {
        a.query_name
            .cmp(&b.query_name)
            .then_with(|| by_score_desc(a, b))
    });
    passing.dedup_by(|later, earlier| later.query_name == earlier.query_name);
    passing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(query: &str, q: usize, reference: &str, m: usize, r: usize) -> MatchRecord {
        MatchRecord::new(
            query.to_string(),
            q,
            reference.to_string(),
            m,
            r,
            format!("GCA_{reference}"),
        )
    }

    fn zero() -> Thresholds {
        Thresholds {
            jaccard: 0.0,
            coverage: 0.0,
        }
    }

    fn rounded(x: f64) -> String {
        format!("{x:.4}")
    }

    #[test]
    fn test_scores_for_two_references() {
        let r1 = record("seq1", 150, "reference1", 50, 200);
        let r2 = record("seq1", 150, "reference2", 30, 180);

        // 50 / (150 + 200 - 50) and 50 / 200
        assert_eq!(rounded(r1.jaccard), "0.1667");
        assert_eq!(rounded(r1.coverage), "0.2500");
        // 30 / (150 + 180 - 30) and 30 / 180
        assert_eq!(rounded(r2.jaccard), "0.1000");
        assert_eq!(rounded(r2.coverage), "0.1667");

        // Default thresholds drop both
        assert!(score(vec![r1.clone(), r2.clone()], &Thresholds::default()).is_empty());

        // Permissive thresholds keep only the better row
        let best = score(vec![r2, r1], &zero());
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].reference, "reference1");
    }

    #[test]
    fn test_scores_bounded() {
        for (q, m, r) in [(0, 0, 0), (10, 0, 5), (10, 5, 5), (5, 5, 10), (1, 1, 1), (3, 9, 4)] {
            let rec = record("s", q, "r", m, r);
            assert!((0.0..=1.0).contains(&rec.jaccard));
            assert!((0.0..=1.0).contains(&rec.coverage));
        }
    }

    #[test]
    fn test_full_reference_coverage() {
        let rec = record("s", 100, "r", 40, 40);
        assert!((rec.coverage - 1.0).abs() < f64::EPSILON);
        assert!((rec.jaccard - 0.4).abs() < 1e-12);

        let partial = record("s", 100, "r", 39, 40);
        assert!(partial.coverage < 1.0);
    }

    #[test]
    fn test_empty_sets_score_zero() {
        let empty_query = record("s", 0, "r", 0, 10);
        assert_eq!(empty_query.jaccard, 0.0);
        assert_eq!(empty_query.coverage, 0.0);

        let empty_reference = record("s", 10, "r", 0, 0);
        assert_eq!(empty_reference.jaccard, 0.0);
        assert_eq!(empty_reference.coverage, 0.0);

        // Only zero thresholds let such a pair through
        assert_eq!(score(vec![empty_query.clone()], &zero()).len(), 1);
        let tiny = Thresholds {
            jaccard: 1e-9,
            coverage: 0.0,
        };
        assert!(score(vec![empty_query], &tiny).is_empty());
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let rec = record("s", 10, "r", 5, 10);
        // jaccard = 5 / 15, coverage = 0.5
        let exact = Thresholds {
            jaccard: rec.jaccard,
            coverage: 0.5,
        };
        assert_eq!(score(vec![rec], &exact).len(), 1);
    }

    #[test]
    fn test_dedup_and_ordering() {
        let records = vec![
            record("zeta", 10, "a", 10, 10),
            record("alpha", 10, "a", 5, 10),
            record("alpha", 10, "b", 8, 10),
            record("alpha", 10, "c", 8, 20),
            record("mid", 10, "a", 1, 10),
        ];

        let best = score(records, &zero());
        let names: Vec<&str> = best.iter().map(|r| r.query_name.as_str()).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
        // b beats c on Jaccard: 8/12 vs 8/22
        assert_eq!(best[0].reference, "b");
    }

    #[test]
    fn test_coverage_breaks_jaccard_tie() {
        // Same Jaccard 0.5 (5 / 10), coverage 0.5 vs 1.0
        let records = vec![
            record("q", 5, "x", 5, 10),
            record("q", 10, "y", 5, 5),
        ];
        assert!((records[0].jaccard - records[1].jaccard).abs() < 1e-12);
        let best = score(records, &zero());
        assert_eq!(best[0].reference, "y");
    }

    #[test]
    fn test_identical_scores_keep_first() {
        let records = vec![record("q", 10, "first", 5, 10), record("q", 10, "second", 5, 10)];
        let best = score(records, &zero());
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].reference, "first");
    }

    #[test]
    fn test_subset_of_single_reference_gives_one_row() {
        let records = vec![record("q", 6, "only", 6, 100)];
        let best = score(records, &zero());
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].reference, "only");
    }
}
