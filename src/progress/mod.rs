//! Progress reporting for the scan pipeline.
//!
//! The pipeline reports through the [`ProgressCallback`] trait. Two
//! implementations are provided:
//!
//! - [`ProgressMonitor`]: time-throttled status lines (count, rate, ETA),
//!   suited to unattended runs over SSH or cron
//! - [`Progress`]: indicatif bars for interactive terminals
//!
//! Callbacks are informational only; nothing flows back into the pipeline.

pub mod bar;
pub mod monitor;

use std::path::Path;

pub use bar::Progress;
pub use monitor::{Clock, ManualClock, ProgressMonitor, ProgressStatus, SystemClock};

/// Phase name used while walking the tree.
pub const PHASE_ENUMERATE: &str = "enumerate";
/// Phase name used while fingerprinting candidates.
pub const PHASE_HASH: &str = "hash";

/// Progress callback for scan phases.
///
/// Implementations must be cheap: `on_progress` is called once per file,
/// possibly from several worker threads at once.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_ENUMERATE`] or [`PHASE_HASH`])
    /// * `total` - Number of items to process, 0 when unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called after each item, whether it succeeded or failed.
    ///
    /// # Arguments
    ///
    /// * `processed` - Items processed so far in this phase (1-based)
    /// * `path` - Path just processed
    fn on_progress(&self, processed: usize, path: &Path);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}
    fn on_progress(&self, _processed: usize, _path: &Path) {}
    fn on_phase_end(&self, _phase: &str) {}
}
