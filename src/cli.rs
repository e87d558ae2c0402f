//! Command-line surface: argument parsing only. Config-file loading and
//! merging are out of scope, and output formatting is kept deliberately
//! plain — see `main::print_*`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "swa-engine")]
#[command(about = "Static analysis core: clone detection, unused-code reachability, symbol lookup")]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Root directory to analyze.
    #[arg(value_name = "PROJECT", default_value = ".")]
    pub project: PathBuf,

    /// Minimum token span considered for any clone or unused-code check.
    #[arg(long, default_value = "50")]
    pub min_tokens: usize,

    /// Disable the on-disk analysis cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Increase log verbosity (stderr only; stdout carries findings).
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect duplicated code.
    Clones {
        #[arg(long, value_enum, default_value = "rolling-hash")]
        algorithm: CliCloneAlgorithm,
        #[arg(long, default_value = "0.8")]
        min_similarity: f64,
    },
    /// Find declarations unreachable from any root.
    Unused {
        #[arg(long)]
        no_public_roots: bool,
        #[arg(long)]
        no_test_roots: bool,
    },
    /// Look up declarations by name.
    FindSymbol {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(long)]
        regex: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CliCloneAlgorithm {
    RollingHash,
    SuffixArray,
    MinhashLsh,
}

impl From<CliCloneAlgorithm> for crate::config::CloneAlgorithm {
    fn from(value: CliCloneAlgorithm) -> Self {
        match value {
            CliCloneAlgorithm::RollingHash => crate::config::CloneAlgorithm::RollingHash,
            CliCloneAlgorithm::SuffixArray => crate::config::CloneAlgorithm::SuffixArray,
            CliCloneAlgorithm::MinhashLsh => crate::config::CloneAlgorithm::MinHashLsh,
        }
    }
}
