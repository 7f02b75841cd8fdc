//! CLI parse: clap types for Simmer. No behavior; definitions only.

use crate::artifact::Language;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Simmer CLI - illustrated recipe generation with prioritized scheduling
#[derive(Parser, Debug)]
#[command(name = "simmer")]
#[command(about = "Generate illustrated bilingual recipes through a prioritized job scheduler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one recipe, or return the stored one
    Generate {
        /// Dish name
        name: String,
        /// Language of the request (zh, en)
        #[arg(long, default_value = "zh")]
        lang: Language,
        /// Queue on the bulk lane instead of the interactive lane
        #[arg(long)]
        bulk: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Queue many recipes on the bulk lane and wait for all of them
    Batch {
        /// Dish names
        names: Vec<String>,
        /// Read additional names from a file, one per line ('#' starts a comment)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Language of the requests (zh, en)
        #[arg(long, default_value = "zh")]
        lang: Language,
    },
    /// List stored recipes
    List {
        /// Language used for display names (zh, en)
        #[arg(long, default_value = "zh")]
        lang: Language,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
