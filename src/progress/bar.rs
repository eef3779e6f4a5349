//! Progress bars using indicatif.
//!
//! [`Progress`] implements [`ProgressCallback`] with a spinner while the tree
//! is walked and a bar with throughput and ETA while files are hashed. It
//! is meant for interactive terminals; unattended runs should use
//! [`ProgressMonitor`](super::ProgressMonitor) instead.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::{ProgressCallback, PHASE_ENUMERATE, PHASE_HASH};

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
}

impl Progress {
    /// Create a new progress reporter drawing to stderr.
    ///
    /// # Examples
    ///
    /// ```
    /// use rawdupe::progress::Progress;
    ///
    /// let progress = Progress::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) {msg} {per_sec} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            PHASE_ENUMERATE => Some(&self.walking),
            PHASE_HASH => Some(&self.hashing),
            _ => None,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let pb = match phase {
            PHASE_ENUMERATE => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Walking directory");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            PHASE_HASH => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::hashing_style());
                pb.set_message("Hashing");
                pb
            }
            _ => return,
        };

        if let Some(slot) = self.slot(phase) {
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
        }
    }

    fn on_progress(&self, processed: usize, path: &Path) {
        let msg = truncate_path(&path.to_string_lossy(), 30);
        let active = [&self.hashing, &self.walking];
        for slot in active {
            if let Some(ref pb) = *slot.lock().unwrap_or_else(|e| e.into_inner()) {
                pb.set_position(processed as u64);
                pb.set_message(msg);
                return;
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        let done = match phase {
            PHASE_ENUMERATE => "Walking complete",
            PHASE_HASH => "Hashing complete",
            _ => return,
        };
        if let Some(slot) = self.slot(phase) {
            if let Some(pb) = slot.lock().unwrap_or_else(|e| e.into_inner()).take() {
                pb.finish_with_message(done);
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
