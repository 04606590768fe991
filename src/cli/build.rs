//! Build command - index a directory of reference genomes and save it.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{configure_threads, DatabaseOptions, OutputFormat};
use crate::cli::info::print_summary;
use crate::database::builder::DatabaseBuilder;

/// Arguments for the build command
#[derive(Args)]
pub struct BuildArgs {
    /// Directory of reference genome FASTA files, one genome per file
    #[arg(short, long, required = true)]
    pub database: PathBuf,

    /// Output database file
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    #[command(flatten)]
    pub db: DatabaseOptions,
}

/// Execute the build command
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the directory cannot be
/// indexed, or the database cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: BuildArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    configure_threads(args.db.threads);

    let builder = DatabaseBuilder::new(args.db.kmer_size(), args.db.bloom())?;
    let database = builder.build(&args.database)?;
    database.save(&args.output)?;

    if verbose {
        eprintln!("Saved database to {}", args.output.display());
    }
    print_summary(&database.summary(), format, false)
}
