//! RawDupe - duplicate RAW photo finder
//!
//! Walks a directory tree, fingerprints every RAW file by content hash and
//! reports groups of byte-identical files together with the space the
//! extra copies waste. Built for long unattended scans of photo archives on
//! NAS volumes: reads are sequential by default, progress is logged at a
//! fixed interval, and unreadable files are reported instead of aborting
//! the run. Files are never modified.
//!
//! The library can be used without the CLI:
//!
//! ```no_run
//! use rawdupe::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let result = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("/volume1/photos"))
//!     .unwrap();
//! for group in result.groups() {
//!     println!("{}: {} copies", group.fingerprint, group.len());
//! }
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::Context;

use cli::{Cli, Commands, ProgressMode, ReportFormat, ScanArgs};
use config::Config;
use duplicates::{DuplicateFinder, ScanResult};
use error::ExitCode;
use progress::{Progress, ProgressCallback, ProgressMonitor};

/// Run the application for parsed arguments.
///
/// Returns the exit code for a completed run. Fatal failures (invalid
/// configuration, bad root, unwritable report, interruption) are returned
/// as errors; see [`ExitCode::for_error`].
///
/// # Errors
///
/// Returns an error if the run could not complete.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Config => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => run_scan(&args, config, cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, config: Config, quiet: bool) -> anyhow::Result<ExitCode> {
    let config = config
        .apply_scan_args(args)
        .context("Invalid scan options")?;
    let shutdown = signal::install_handler()?;

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(shutdown.get_flag());
    if let Some(callback) = progress_callback(args.progress, &config, quiet) {
        finder_config = finder_config.with_progress_callback(callback);
    }

    log::info!("Scan path: {}", args.path.display());
    if let Some(output) = &args.output {
        log::info!("Report: {}", output.display());
    }
    log::info!(
        "Extensions: {}",
        config.extension_set().iter().collect::<Vec<_>>().join(", ")
    );
    log::debug!(
        "Hashing with {} ({} byte chunks, {} thread(s))",
        config.algorithm,
        config.chunk_size,
        config.io_threads
    );

    let result = DuplicateFinder::new(finder_config)
        .find_duplicates(&args.path)
        .with_context(|| format!("Scan of {} failed", args.path.display()))?;

    if !quiet {
        output::Summary::new(&result)
            .write_to(io::stdout().lock())
            .context("Failed to print summary")?;
    }

    if let Some(path) = &args.output {
        let format = ReportFormat::resolve(args.format, path);
        output::write_report(&result, path, format)
            .with_context(|| format!("Failed to write {} report", format))?;
    }

    Ok(exit_code(&result))
}

/// Pick the progress reporter for the requested mode.
fn progress_callback(
    mode: ProgressMode,
    config: &Config,
    quiet: bool,
) -> Option<Arc<dyn ProgressCallback>> {
    if quiet {
        return None;
    }
    let bar = match mode {
        ProgressMode::Off => return None,
        ProgressMode::Bar => true,
        ProgressMode::Log => false,
        ProgressMode::Auto => io::stderr().is_terminal(),
    };
    if bar {
        Some(Arc::new(Progress::new()))
    } else {
        Some(Arc::new(ProgressMonitor::new(config.progress_interval())))
    }
}

fn exit_code(result: &ScanResult) -> ExitCode {
    if result.has_errors() {
        log::warn!(
            "Completed with errors: {} file(s) could not be hashed, {} entries skipped",
            result.stats().files_failed,
            result.stats().entries_skipped
        );
        ExitCode::PartialSuccess
    } else if result.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}
