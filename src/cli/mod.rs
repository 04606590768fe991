//! Command-line interface for kmer-screen.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **screen**: Match a FASTA file against reference genomes and write the
//!   matching, scored and TaxID-annotated tables
//! - **build**: Build a reference database from a directory and save it
//! - **score**: Re-score an existing matching-results table
//! - **info**: Summarize a saved reference database
//!
//! ## Usage
//!
//! ```text
//! # Screen against a directory of reference genomes
//! kmer-screen screen -i reads.fasta -d references/ -o results/
//!
//! # Build once, screen many times
//! kmer-screen build -d references/ -o refs.ksdb
//! kmer-screen screen -i reads.fasta --index refs.ksdb -o results/
//!
//! # Relax the thresholds without re-matching
//! kmer-screen score results/matching_results.csv -o relaxed.csv --jacc-threshold 0.5
//!
//! # JSON summary of a database
//! kmer-screen info refs.ksdb --format json
//! ```

use clap::{Parser, Subcommand};

pub mod build;
pub mod info;
pub mod score;
pub mod screen;

#[derive(Parser)]
#[command(name = "kmer-screen")]
#[command(version)]
#[command(about = "Classify sequences against reference genomes by shared k-mers")]
#[command(
    long_about = "kmer-screen decomposes reference genomes and query sequences into k-mers and reports, for each query, the reference it shares the most k-mers with.\n\nEach candidate is scored by:\n- Jaccard similarity of the query and reference k-mer sets\n- Coverage: the fraction of the reference's k-mers found in the query"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for run summaries
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Screen query sequences against reference genomes
    Screen(screen::ScreenArgs),

    /// Build a reference database and save it to a file
    Build(build::BuildArgs),

    /// Re-score a matching-results table with new thresholds
    Score(score::ScoreArgs),

    /// Show a summary of a saved reference database
    Info(info::InfoArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Options shared by every command that builds a database
#[derive(clap::Args, Debug, Clone)]
pub struct DatabaseOptions {
    /// K-mer length [default: 21]
    ///
    /// A saved database keeps the length it was built with; asking for a
    /// different one is an error.
    #[arg(short = 'k', long)]
    pub kmer_size: Option<usize>,

    /// Target Bloom filter false-positive rate [default: 0.001]
    #[arg(long)]
    pub error_rate: Option<f64>,

    /// Bloom filter capacity as a multiple of the distinct k-mer count
    /// [default: 1.0]
    #[arg(long)]
    pub capacity_factor: Option<f64>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl DatabaseOptions {
    #[must_use]
    pub fn kmer_size(&self) -> usize {
        self.kmer_size.unwrap_or(crate::core::types::KmerSize::DEFAULT)
    }

    #[must_use]
    pub fn bloom(&self) -> crate::core::config::BloomConfig {
        let defaults = crate::core::config::BloomConfig::default();
        crate::core::config::BloomConfig {
            error_rate: self.error_rate.unwrap_or(defaults.error_rate),
            capacity_factor: self.capacity_factor.unwrap_or(defaults.capacity_factor),
        }
    }

    /// Filter options given on the command line. A saved database keeps the
    /// filter it was built with, so these have no effect when loading one.
    #[must_use]
    pub fn explicit_bloom_options(&self) -> Vec<&'static str> {
        let mut given = Vec::new();
        if self.error_rate.is_some() {
            given.push("--error-rate");
        }
        if self.capacity_factor.is_some() {
            given.push("--capacity-factor");
        }
        given
    }
}

/// Score thresholds shared by `screen` and `score`
#[derive(clap::Args, Debug, Clone)]
pub struct ThresholdOptions {
    /// Minimum Jaccard similarity of a reported hit
    #[arg(long = "jacc-threshold", default_value_t = crate::core::config::DEFAULT_JACCARD_THRESHOLD)]
    pub jaccard: f64,

    /// Minimum fraction of the reference's k-mers found in the query
    #[arg(long = "qcov-threshold", default_value_t = crate::core::config::DEFAULT_COVERAGE_THRESHOLD)]
    pub coverage: f64,
}

impl ThresholdOptions {
    #[must_use]
    pub fn thresholds(&self) -> crate::core::config::Thresholds {
        crate::core::config::Thresholds {
            jaccard: self.jaccard,
            coverage: self.coverage,
        }
    }
}

/// Size the global rayon pool. Only the first call in a process has any effect.
pub(crate) fn configure_threads(threads: Option<usize>) {
    if let Some(n) = threads.filter(|&n| n > 0) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok();
    }
}
