use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Parser)]
#[command(name = "hgcollect")]
#[command(about = "Batch-collect hg history into a SQLite database", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Parent directory whose immediate subdirectories are collected
    /// (takes precedence over --repo)
    #[arg(long, short = 'R', value_name = "DIR")]
    pub repos_dir: Option<PathBuf>,

    /// A single repository directory
    #[arg(long, short = 'r', value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// SQLite database file receiving the results
    #[arg(long, short = 'd', value_name = "FILE")]
    pub db: PathBuf,

    /// Concurrent repository pipelines (only meaningful with --repos-dir)
    #[arg(long, short = 'n', default_value = "1", value_name = "N")]
    pub workers: usize,

    /// Kill an hg invocation that outlives this many seconds
    #[arg(long, default_value = "300", value_name = "SECS")]
    pub timeout_secs: u64,

    /// Mercurial binary to invoke
    #[arg(long, default_value = "hg", value_name = "PATH")]
    pub hg_bin: String,

    #[arg(long, default_value = "plain", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Report each repository as it is dispatched and completed
    #[arg(long)]
    pub verbose: bool,
}
