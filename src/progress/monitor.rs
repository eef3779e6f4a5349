//! Time-throttled progress status.
//!
//! [`ProgressMonitor`] counts processed files and, at most once per interval,
//! emits a [`ProgressStatus`] with the processed count, percentage,
//! throughput and estimated time remaining. Emission is a single call into
//! the configured emitter (an `info` log line by default); it never waits.
//!
//! Time comes from a [`Clock`], so throttling can be driven by a
//! [`ManualClock`] in tests.
//!
//! # Example
//!
//! ```
//! use rawdupe::progress::{ManualClock, ProgressMonitor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new());
//! let monitor = ProgressMonitor::with_clock(Duration::from_secs(5), clock.clone());
//! monitor.start(100);
//!
//! assert!(monitor.record().is_some()); // first file always reports
//! clock.advance(Duration::from_secs(1));
//! assert!(monitor.record().is_none()); // throttled
//! clock.advance(Duration::from_secs(4));
//! let status = monitor.record().unwrap();
//! assert_eq!(status.processed, 3);
//! ```

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{ProgressCallback, PHASE_ENUMERATE, PHASE_HASH};

/// Default time between two status lines.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A clock frozen at the moment of creation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One progress snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStatus {
    /// Files processed so far
    pub processed: usize,
    /// Files expected in total
    pub total: usize,
    /// Completion percentage, 0 when the total is 0
    pub percent: f64,
    /// Files per second since the phase started
    pub rate: f64,
    /// Time since the phase started
    pub elapsed: Duration,
    /// Estimated time remaining, zero when the rate is zero
    pub eta: Duration,
}

impl ProgressStatus {
    fn compute(processed: usize, total: usize, elapsed: Duration) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            processed as f64 / total as f64 * 100.0
        };
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 {
            processed as f64 / secs
        } else {
            0.0
        };
        let eta = if rate > 0.0 {
            Duration::from_secs_f64(total.saturating_sub(processed) as f64 / rate)
        } else {
            Duration::ZERO
        };

        Self {
            processed,
            total,
            percent,
            rate,
            elapsed,
            eta,
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress: {}/{} files ({:.1}%) | Rate: {:.1} files/sec | ETA: {:.1} min",
            self.processed,
            self.total,
            self.percent,
            self.rate,
            self.eta.as_secs_f64() / 60.0
        )
    }
}

/// Enumeration progress is logged every this many candidates.
const ENUMERATE_LOG_EVERY: usize = 1000;

type Emitter = Box<dyn Fn(&ProgressStatus) + Send + Sync>;

#[derive(Debug, Default)]
struct MonitorState {
    total: usize,
    processed: usize,
    started: Option<Instant>,
    last_emit: Option<Instant>,
}

/// Throttled progress reporter.
pub struct ProgressMonitor {
    clock: Arc<dyn Clock>,
    interval: Duration,
    emitter: Emitter,
    state: Mutex<MonitorState>,
}

impl fmt::Debug for ProgressMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressMonitor")
            .field("interval", &self.interval)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for ProgressMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl ProgressMonitor {
    /// Monitor on the wall clock that logs each status at `info`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Arc::new(SystemClock))
    }

    /// Monitor driven by the given clock.
    #[must_use]
    pub fn with_clock(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            interval,
            emitter: Box::new(|status| log::info!("{}", status)),
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Replace the emitter that receives each throttled status.
    #[must_use]
    pub fn with_emitter<F>(mut self, emitter: F) -> Self
    where
        F: Fn(&ProgressStatus) + Send + Sync + 'static,
    {
        self.emitter = Box::new(emitter);
        self
    }

    /// The throttle interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reset counters and start timing a phase of `total` files.
    pub fn start(&self, total: usize) {
        let mut state = self.lock();
        *state = MonitorState {
            total,
            started: Some(self.clock.now()),
            ..Default::default()
        };
    }

    /// Count one processed file.
    ///
    /// Returns the status if the interval has elapsed since the last one
    /// (the first file always reports). Does not call the emitter.
    pub fn record(&self) -> Option<ProgressStatus> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.processed += 1;

        let due = state
            .last_emit
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
        if !due {
            return None;
        }

        state.last_emit = Some(now);
        let started = *state.started.get_or_insert(now);
        Some(ProgressStatus::compute(
            state.processed,
            state.total,
            now.saturating_duration_since(started),
        ))
    }

    /// Current status regardless of throttling.
    #[must_use]
    pub fn snapshot(&self) -> ProgressStatus {
        let now = self.clock.now();
        let state = self.lock();
        let elapsed = state
            .started
            .map_or(Duration::ZERO, |s| now.saturating_duration_since(s));
        ProgressStatus::compute(state.processed, state.total, elapsed)
    }
}

impl ProgressCallback for ProgressMonitor {
    fn on_phase_start(&self, phase: &str, total: usize) {
        match phase {
            PHASE_ENUMERATE => {
                log::info!("Scanning directory structure");
                *self.lock() = MonitorState::default();
            }
            PHASE_HASH => {
                log::info!("Hashing {} candidate files", total);
                self.start(total);
            }
            _ => {}
        }
    }

    fn on_progress(&self, processed: usize, path: &Path) {
        log::trace!("Processed {}", path.display());
        // Still walking: the total is not known yet.
        if self.lock().started.is_none() {
            if processed % ENUMERATE_LOG_EVERY == 0 {
                log::info!("Found {} candidate files so far", processed);
            }
            return;
        }
        if let Some(status) = self.record() {
            (self.emitter)(&status);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if phase == PHASE_HASH {
            let status = self.snapshot();
            log::info!(
                "Hashed {}/{} files in {:.1}s",
                status.processed,
                status.total,
                status.elapsed.as_secs_f64()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn monitor(clock: &Arc<ManualClock>) -> ProgressMonitor {
        ProgressMonitor::with_clock(DEFAULT_INTERVAL, clock.clone() as Arc<dyn Clock>)
    }

    #[test]
    fn test_first_file_always_reports() {
        let clock = Arc::new(ManualClock::new());
        let monitor = monitor(&clock);
        monitor.start(10);

        let status = monitor.record().unwrap();
        assert_eq!(status.processed, 1);
        assert_eq!(status.total, 10);
        // No time has passed, so there is no rate to extrapolate from.
        assert_eq!(status.rate, 0.0);
        assert_eq!(status.eta, Duration::ZERO);
    }

    #[test]
    fn test_throttles_within_interval() {
        let clock = Arc::new(ManualClock::new());
        let monitor = monitor(&clock);
        monitor.start(100);

        assert!(monitor.record().is_some());
        for _ in 0..10 {
            clock.advance(Duration::from_millis(400));
            assert!(monitor.record().is_none());
        }
        clock.advance(Duration::from_secs(1));
        let status = monitor.record().unwrap();
        assert_eq!(status.processed, 12);
    }

    #[test]
    fn test_rate_percent_and_eta() {
        let clock = Arc::new(ManualClock::new());
        let monitor = monitor(&clock);
        monitor.start(100);

        monitor.record();
        for _ in 0..18 {
            monitor.record();
        }
        clock.advance(Duration::from_secs(10));
        let status = monitor.record().unwrap();

        assert_eq!(status.processed, 20);
        assert!((status.percent - 20.0).abs() < 1e-9);
        assert!((status.rate - 2.0).abs() < 1e-9);
        assert_eq!(status.eta, Duration::from_secs(40));
    }

    #[test]
    fn test_zero_total() {
        let status = ProgressStatus::compute(0, 0, Duration::ZERO);
        assert_eq!(status.percent, 0.0);
        assert_eq!(status.rate, 0.0);
        assert_eq!(status.eta, Duration::ZERO);
    }

    #[test]
    fn test_display_format() {
        let status = ProgressStatus::compute(20, 100, Duration::from_secs(10));
        assert_eq!(
            status.to_string(),
            "Progress: 20/100 files (20.0%) | Rate: 2.0 files/sec | ETA: 0.7 min"
        );
    }

    #[test]
    fn test_callback_emits_throttled_statuses() {
        let clock = Arc::new(ManualClock::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let monitor = monitor(&clock).with_emitter(move |s| sink.lock().unwrap().push(s.processed));

        monitor.on_phase_start(PHASE_HASH, 4);
        let path = PathBuf::from("/photos/a.arw");
        monitor.on_progress(1, &path);
        monitor.on_progress(2, &path);
        clock.advance(Duration::from_secs(5));
        monitor.on_progress(3, &path);
        monitor.on_progress(4, &path);
        monitor.on_phase_end(PHASE_HASH);

        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_enumeration_does_not_emit_status() {
        let clock = Arc::new(ManualClock::new());
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let monitor = monitor(&clock).with_emitter(move |_| *sink.lock().unwrap() += 1);

        monitor.on_phase_start(PHASE_ENUMERATE, 0);
        monitor.on_progress(1, Path::new("/photos/a.arw"));
        monitor.on_phase_end(PHASE_ENUMERATE);
        assert_eq!(*seen.lock().unwrap(), 0);

        monitor.on_phase_start(PHASE_HASH, 1);
        monitor.on_progress(1, Path::new("/photos/a.arw"));
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_second_scan_enumeration_is_quiet() {
        let clock = Arc::new(ManualClock::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let monitor =
            monitor(&clock).with_emitter(move |s| sink.lock().unwrap().push((s.processed, s.total)));

        monitor.on_phase_start(PHASE_HASH, 2);
        monitor.on_progress(1, Path::new("/photos/a.arw"));
        monitor.on_phase_end(PHASE_HASH);

        monitor.on_phase_start(PHASE_ENUMERATE, 0);
        clock.advance(Duration::from_secs(60));
        monitor.on_progress(1, Path::new("/photos/b.arw"));
        monitor.on_progress(2, Path::new("/photos/c.arw"));
        monitor.on_phase_end(PHASE_ENUMERATE);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2)]);

        monitor.on_phase_start(PHASE_HASH, 4);
        monitor.on_progress(1, Path::new("/photos/b.arw"));
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (1, 4)]);
    }

    #[test]
    fn test_start_resets_state() {
        let clock = Arc::new(ManualClock::new());
        let monitor = monitor(&clock);
        monitor.start(5);
        monitor.record();
        monitor.record();

        monitor.start(3);
        let status = monitor.record().unwrap();
        assert_eq!(status.processed, 1);
        assert_eq!(status.total, 3);
    }

    #[test]
    fn test_concurrent_records_are_counted() {
        let clock = Arc::new(ManualClock::new());
        let monitor = Arc::new(monitor(&clock));
        monitor.start(400);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&monitor);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        m.record();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(monitor.snapshot().processed, 400);
    }
}
