//! Score command - re-score a matching-results table.
//!
//! Reads the `matching_results.csv` written by `screen`, recomputes Jaccard
//! and coverage from its counts, and applies new thresholds without touching
//! the reference database.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{OutputFormat, ThresholdOptions};
use crate::matching::scoring::{score, MatchRecord};
use crate::parsing::tables::{format_score, read_matching_table_file, write_scored_table_file};
use crate::parsing::taxid::TaxidMap;

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// Matching-results table written by `kmer-screen screen`
    #[arg(required = true)]
    pub matching_results: PathBuf,

    /// Scored output table
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Accession to TaxID map
    #[arg(long, requires = "taxid_output")]
    pub taxid_map: Option<PathBuf>,

    /// Scored output with a TaxID column
    #[arg(long, requires = "taxid_map")]
    pub taxid_output: Option<PathBuf>,

    #[command(flatten)]
    pub thresholds: ThresholdOptions,
}

/// Execute the score command
///
/// # Errors
///
/// Returns an error if the thresholds are invalid, the table cannot be read,
/// or an output cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScoreArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let thresholds = args.thresholds.thresholds();
    thresholds.validate()?;

    let candidates = read_matching_table_file(&args.matching_results)?;
    let candidate_pairs = candidates.len();
    if verbose {
        eprintln!(
            "Read {candidate_pairs} candidate pairs from {}",
            args.matching_results.display()
        );
    }

    let scored = score(candidates, &thresholds);
    write_scored_table_file(&args.output, &scored, None)?;

    if let (Some(map_path), Some(taxid_output)) = (&args.taxid_map, &args.taxid_output) {
        let taxids = TaxidMap::load_or_empty(map_path);
        write_scored_table_file(taxid_output, &scored, Some(&taxids))?;
    }

    print_results(&scored, candidate_pairs, format);
    Ok(())
}

fn print_results(scored: &[MatchRecord], candidate_pairs: usize, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!(
                "Classified {} queries from {candidate_pairs} candidate pairs",
                scored.len()
            );
        }
        OutputFormat::Json => {
            let hits: Vec<_> = scored
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "query": r.query_name,
                        "reference": r.reference,
                        "accession": r.accession,
                        "jaccard": r.jaccard,
                        "coverage": r.coverage,
                    })
                })
                .collect();
            let output = serde_json::json!({
                "candidate_pairs": candidate_pairs,
                "classified": scored.len(),
                "hits": hits,
            });
            println!("{output:#}");
        }
        OutputFormat::Tsv => {
            println!("query\treference\taccession\tjaccard\tcoverage");
            for r in scored {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    r.query_name,
                    r.reference,
                    r.accession,
                    format_score(r.jaccard),
                    format_score(r.coverage)
                );
            }
        }
    }
}
