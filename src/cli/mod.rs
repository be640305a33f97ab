//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docdex",
    version,
    about = "Hybrid retrieval over scraped documentation corpora",
    long_about = "Docdex loads scraped documentation records, cleans and chunks them, and serves \
                  hybrid retrieval that fuses BM25 keyword ranking with dense vector similarity. \
                  Built collections persist on disk and are reopened without re-embedding."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/docdex/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the collection from the corpus directory (no-op if already built)
    Index,

    /// Retrieve chunks for a query
    Query {
        /// Search query text
        query: String,

        /// Number of results requested from each underlying index
        #[arg(short, long)]
        k: Option<usize>,

        /// Skip query preprocessing even when enabled in the config
        #[arg(long)]
        no_preprocess: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the active configuration
    Show,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
