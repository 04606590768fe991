//! Info command - summarize a saved reference database.

use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::database::store::{DatabaseSummary, ReferenceDatabase};

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs {
    /// Database file written by `kmer-screen build`
    #[arg(required = true)]
    pub index: PathBuf,

    /// List every reference genome
    #[arg(long)]
    pub all_references: bool,
}

/// Execute the info command
///
/// # Errors
///
/// Returns an error if the database cannot be loaded.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: InfoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let database = ReferenceDatabase::load(&args.index)?;
    print_summary(&database.summary(), format, args.all_references)
}

/// Number of references listed in text output unless all are requested
const TEXT_PREVIEW: usize = 10;

pub(crate) fn print_summary(
    summary: &DatabaseSummary,
    format: OutputFormat,
    all_references: bool,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Reference database");
            println!("   K-mer size: {}", summary.kmer_size);
            println!("   References: {}", summary.references);
            println!("   Distinct k-mers: {}", summary.distinct_kmers);
            println!(
                "   Bloom filter: {} bits, {} hashes",
                summary.bloom_bits, summary.bloom_hashes
            );
            println!(
                "   False-positive rate: {:.6} target, {:.6} estimated",
                summary.bloom_error_rate, summary.bloom_estimated_error_rate
            );

            let shown = if all_references {
                summary.genomes.len()
            } else {
                TEXT_PREVIEW.min(summary.genomes.len())
            };
            if shown > 0 {
                println!("\n   {:<40} {:<20} {:>12}", "Reference", "Accession", "K-mers");
                for genome in &summary.genomes[..shown] {
                    println!(
                        "   {:<40} {:<20} {:>12}",
                        genome.id.as_str(),
                        genome.accession,
                        genome.kmer_count
                    );
                }
                if shown < summary.genomes.len() {
                    println!(
                        "   ... and {} more (use --all-references)",
                        summary.genomes.len() - shown
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Tsv => {
            println!("reference\taccession\tkmers");
            for genome in &summary.genomes {
                println!("{}\t{}\t{}", genome.id, genome.accession, genome.kmer_count);
            }
        }
    }
    Ok(())
}
