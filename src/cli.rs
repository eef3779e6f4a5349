//! Command-line interface definitions for RawDupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan a photo volume and write a CSV report
//! rawdupe scan /volume1/photos --output /volume1/reports/duplicates.csv
//!
//! # JSON report, extra RAW formats, low priority on a NAS
//! nice -n 19 rawdupe scan /volume1/photos -o report.json -e .3fr,.raf
//!
//! # Show the effective configuration
//! rawdupe config
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::scanner::HashAlgorithm;

/// Find duplicate RAW photos by content hash.
///
/// RawDupe walks a directory tree, hashes every RAW file it finds and
/// reports groups of byte-identical files with the space they waste.
/// Files are never modified.
#[derive(Debug, Parser)]
#[command(name = "rawdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML); defaults to the platform config directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for RawDupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directory to scan for RAW files
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Report file to write; no report is written when omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (defaults to the report file's extension, else csv)
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Additional extensions to scan (comma-separated, e.g. .3fr,.raf)
    #[arg(short, long, value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Bytes read per chunk while hashing (e.g. 8KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Number of files hashed in parallel (1 = sequential, lowest disk impact)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Follow symbolic links (links looping back to an ancestor are skipped)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Content hash algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// How to display progress
    #[arg(long, value_enum, default_value = "auto")]
    pub progress: ProgressMode,

    /// Seconds between progress lines in log mode
    #[arg(long, value_name = "SECS")]
    pub progress_interval: Option<u64>,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One row per duplicate group
    Csv,
    /// Structured report with scan metadata
    Json,
}

impl ReportFormat {
    /// Pick the format for a report path: explicit choice, then the file
    /// extension, then CSV.
    #[must_use]
    pub fn resolve(explicit: Option<Self>, output: &Path) -> Self {
        explicit.unwrap_or_else(|| {
            match output
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                Some("json") => Self::Json,
                _ => Self::Csv,
            }
        })
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Progress display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressMode {
    /// Bars on an interactive terminal, log lines otherwise
    Auto,
    /// indicatif progress bars
    Bar,
    /// Throttled status lines through the logger
    Log,
    /// No progress output
    Off,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use rawdupe::cli::parse_size;
///
/// assert_eq!(parse_size("8192").unwrap(), 8192);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
