//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use quip_export_core::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_RETRIES, ExportFormat};

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./quip_export";

/// Export a Quip folder tree to local disk.
///
/// Every document is saved as .docx when possible and as .html otherwise;
/// attachments go to a `<document>_attachments` directory beside it.
#[derive(Parser, Debug)]
#[command(name = "quip-export")]
#[command(author, version, about)]
pub struct Args {
    /// Personal access token
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// File containing the access token (takes precedence over --token)
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Folder link (https://quip.com/...) or folder id
    #[arg(short = 'f', long, value_name = "LINK_OR_ID")]
    pub folder: Option<String>,

    /// Output directory
    #[arg(short = 'o', long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// API base URL (default: https://platform.<folder link host>)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Export formats in order of preference
    #[arg(long, value_delimiter = ',', default_value = "docx,html")]
    pub formats: Vec<ExportFormat>,

    /// Maximum folder nesting below the root before a subtree is skipped
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Delay between items of a folder in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: u64,

    /// Maximum attempts for transient failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
