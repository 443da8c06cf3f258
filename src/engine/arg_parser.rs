use clap::Parser;
use std::path::PathBuf;

/// Publish a local directory tree to a blob store.
#[derive(Clone, Parser)]
#[command(name = "bloblog")]
#[command(about = "Sync a directory to a blob store; only changed files are uploaded.")]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// Directory to publish. Overrides `sync.root_path`.
    #[arg(long, short = 'r', value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Worker threads for scanning and dispatching. Overrides `workers`.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Extra exclude patterns (regular expressions). Can specify multiple: -e pattern1 pattern2
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Walk the tree in parallel (jwalk). Overrides `sync.parallel_walk`.
    #[arg(
        long,
        short = 'p',
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub parallel_walk: Option<bool>,

    /// Verbose output.
    #[arg(
        long,
        short = 'v',
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub verbose: Option<bool>,
}
