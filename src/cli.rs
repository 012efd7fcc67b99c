use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "dedupdash")]
#[command(about = "Terminal dashboard for a file-deduplication server")]
pub struct CliArgs {
    /// Base URL of the dedup server (overrides config)
    #[arg(long)]
    pub server: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file (overrides config)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
