//! Screen command - match a FASTA file against reference genomes.
//!
//! Writes three tables into the output directory:
//!
//! - `matching_results.csv`: every candidate (query, reference) pair
//! - `scored_output.csv`: the best passing reference per query
//! - `scored_output_with_taxid.csv`: the scored output with TaxIDs joined on

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{configure_threads, DatabaseOptions, OutputFormat, ThresholdOptions};
use crate::core::config::ScreenConfig;
use crate::core::error::ScreenError;
use crate::database::builder::DatabaseBuilder;
use crate::database::store::ReferenceDatabase;
use crate::core::config::Thresholds;
use crate::matching::engine::{QueryMatch, SequenceMatcher};
use crate::matching::scoring::{score, MatchRecord};
use crate::parsing::fasta::FastaRecords;
use crate::parsing::tables::{write_scored_table_file, MatchingTableWriter};
use crate::parsing::taxid::TaxidMap;

pub const MATCHING_RESULTS_FILE: &str = "matching_results.csv";
pub const SCORED_OUTPUT_FILE: &str = "scored_output.csv";
pub const TAXID_OUTPUT_FILE: &str = "scored_output_with_taxid.csv";

/// Arguments for the screen command
#[derive(Args)]
pub struct ScreenArgs {
    /// Query FASTA file (plain or gzip-compressed)
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// Directory of reference genome FASTA files, one genome per file
    #[arg(short, long, required_unless_present = "index", conflicts_with = "index")]
    pub database: Option<PathBuf>,

    /// Saved reference database written by `kmer-screen build`
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Output directory (created if missing)
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Accession to TaxID map; a missing file reports every TaxID as N/A
    #[arg(long, default_value = "taxid.map")]
    pub taxid_map: PathBuf,

    #[command(flatten)]
    pub db: DatabaseOptions,

    #[command(flatten)]
    pub thresholds: ThresholdOptions,
}

/// Counts reported at the end of a run
#[derive(Debug, Serialize)]
struct ScreenSummary {
    references: usize,
    queries: usize,
    candidate_pairs: usize,
    classified: usize,
    matching_results: PathBuf,
    scored_output: PathBuf,
    taxid_output: PathBuf,
}

/// Execute the screen command
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the database cannot be
/// built or loaded, the query file cannot be read, or an output table cannot
/// be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScreenArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = ScreenConfig::new(
        args.db.kmer_size(),
        args.db.bloom(),
        args.thresholds.thresholds(),
    )?;
    configure_threads(args.db.threads);

    let database = open_database(&args, &config)?;
    if verbose {
        eprintln!(
            "Database: {} references, {} distinct {}-mers",
            database.len(),
            database.index().len(),
            database.kmer_size()
        );
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Cannot create output directory {}", args.output.display()))?;
    let matching_path = args.output.join(MATCHING_RESULTS_FILE);
    let scored_path = args.output.join(SCORED_OUTPUT_FILE);
    let taxid_path = args.output.join(TAXID_OUTPUT_FILE);

    let queries = FastaRecords::open(&args.input).map_err(|e| {
        ScreenError::InputRead(format!("Cannot open {}: {e}", args.input.display()))
    })?;

    let mut table = MatchingTableWriter::create(&matching_path)?;
    let mut candidates: Vec<MatchRecord> = Vec::new();
    let matcher = SequenceMatcher::new(&database);
    let processed = matcher.match_records(queries, |query| {
        table.write_query(&query, &database)?;
        candidates.extend(passing_records(&query, &database, &config.thresholds));
        Ok(())
    })?;
    let candidate_pairs = table.rows();
    table.finish()?;
    info!(queries = processed, candidate_pairs, "Matching complete");

    let scored = score(candidates, &config.thresholds);
    write_scored_table_file(&scored_path, &scored, None)?;

    let taxids = TaxidMap::load_or_empty(&args.taxid_map);
    write_scored_table_file(&taxid_path, &scored, Some(&taxids))?;
    info!(classified = scored.len(), "Scoring complete");

    let summary = ScreenSummary {
        references: database.len(),
        queries: processed,
        candidate_pairs,
        classified: scored.len(),
        matching_results: matching_path,
        scored_output: scored_path,
        taxid_output: taxid_path,
    };
    print_summary(&summary, format)
}

/// Candidate records of one query that clear the thresholds. Only these can
/// reach the scored output, so the rest are dropped as each query completes.
fn passing_records(
    query: &QueryMatch,
    database: &ReferenceDatabase,
    thresholds: &Thresholds,
) -> Vec<MatchRecord> {
    query
        .records(database)
        .into_iter()
        .filter(|r| r.passes(thresholds))
        .collect()
}

/// Build the database from a directory, or load a saved one
fn open_database(args: &ScreenArgs, config: &ScreenConfig) -> anyhow::Result<ReferenceDatabase> {
    match (&args.index, &args.database) {
        (Some(path), _) => {
            let ignored = args.db.explicit_bloom_options();
            if !ignored.is_empty() {
                warn!(
                    "{} ignored: {} keeps the Bloom filter it was built with",
                    ignored.join(" and "),
                    path.display()
                );
            }
            load_database(path, args.db.kmer_size)
        }
        (None, Some(directory)) => {
            let builder = DatabaseBuilder::new(config.kmer_size.get(), config.bloom)?;
            Ok(builder.build(directory)?)
        }
        (None, None) => Err(ScreenError::Configuration(
            "Either --database or --index is required".to_string(),
        )
        .into()),
    }
}

/// Load a saved database, rejecting an explicitly requested k-mer size that
/// differs from the one it was built with
fn load_database(
    path: &Path,
    requested_kmer_size: Option<usize>,
) -> anyhow::Result<ReferenceDatabase> {
    let database = ReferenceDatabase::load(path)?;
    if let Some(k) = requested_kmer_size {
        if k != database.kmer_size().get() {
            return Err(ScreenError::Configuration(format!(
                "Requested k-mer size {k} but {} was built with k = {}",
                path.display(),
                database.kmer_size()
            ))
            .into());
        }
    }
    Ok(database)
}

fn print_summary(summary: &ScreenSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "Screened {} queries against {} references",
                summary.queries, summary.references
            );
            println!("   Candidate pairs: {}", summary.candidate_pairs);
            println!("   Classified queries: {}", summary.classified);
            println!("\n   Matching results: {}", summary.matching_results.display());
            println!("   Scored output: {}", summary.scored_output.display());
            println!("   With TaxIDs: {}", summary.taxid_output.display());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Tsv => {
            println!("references\tqueries\tcandidate_pairs\tclassified\tmatching_results\tscored_output\ttaxid_output");
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                summary.references,
                summary.queries,
                summary.candidate_pairs,
                summary.classified,
                summary.matching_results.display(),
                summary.scored_output.display(),
                summary.taxid_output.display(),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BloomConfig;

    #[test]
    fn test_load_database_kmer_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let refs = dir.path().join("refs");
        std::fs::create_dir(&refs).unwrap();
        std::fs::write(refs.join("r.fa"), ">r\nACGTACGTAA\n").unwrap();

        let db = DatabaseBuilder::new(5, BloomConfig::default())
            .unwrap()
            .build(&refs)
            .unwrap();
        let saved = dir.path().join("refs.ksdb");
        db.save(&saved).unwrap();

        assert!(load_database(&saved, None).is_ok());
        assert!(load_database(&saved, Some(5)).is_ok());

        let err = load_database(&saved, Some(21)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScreenError>(),
            Some(ScreenError::Configuration(_))
        ));
    }

    #[test]
    fn test_passing_records_drops_below_threshold_pairs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.fa"), ">a\nAAAAACCCCC\n").unwrap();
        std::fs::write(dir.path().join("beta.fa"), ">b\nGGGGGATATA\n").unwrap();
        let db = DatabaseBuilder::new(5, BloomConfig::default())
            .unwrap()
            .build(dir.path())
            .unwrap();

        // 13 query k-mers: all 6 of alpha's, 3 of beta's
        let query = SequenceMatcher::new(&db).match_sequence("q", b"AAAAACCCCCGGGGGAT");
        let everything = Thresholds {
            jaccard: 0.0,
            coverage: 0.0,
        };
        assert_eq!(passing_records(&query, &db, &everything).len(), 2);

        let strict = Thresholds {
            jaccard: 0.4,
            coverage: 0.9,
        };
        let kept = passing_records(&query, &db, &strict);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].reference, "alpha");

        // Same best hit as scoring every candidate
        assert_eq!(score(kept, &strict), score(query.records(&db), &strict));
    }
}
