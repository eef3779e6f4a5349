//! Scan pipeline: enumerate, fingerprint, group.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs one complete scan:
//! 1. **Enumerate** - walk the root and collect candidate files
//! 2. **Hash** - fingerprint each candidate, one file at a time or on a
//!    bounded pool of `io_threads` workers
//! 3. **Group** - record every fingerprint in a [`GroupingIndex`] and
//!    finalize it into a [`ScanResult`]
//!
//! Only an invalid root or a user interruption aborts the scan. Unreadable
//! entries and files that fail to hash are collected in the result.
//!
//! # Ordering
//!
//! Hash outcomes are recorded in enumeration order by a single writer, also
//! when hashing runs on several threads, so groups and their members come
//! out the same as in a sequential run.
//!
//! # Example
//!
//! ```no_run
//! use rawdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let result = finder.find_duplicates(Path::new("/volume1/photos")).unwrap();
//!
//! println!("Found {} duplicate groups", result.stats().duplicate_groups);
//! for err in result.errors() {
//!     eprintln!("{}", err);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::groups::{GroupingIndex, ScanResult};
use crate::progress::{ProgressCallback, PHASE_ENUMERATE, PHASE_HASH};
use crate::scanner::{
    FileDescriptor, Fingerprint, HashAlgorithm, HashError, Hasher, ScanError, Walker,
    WalkerConfig, DEFAULT_CHUNK_SIZE,
};

/// Files above this size are logged when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Candidate selection and symlink policy.
    pub walker_config: WalkerConfig,
    /// Digest used for fingerprints.
    pub algorithm: HashAlgorithm,
    /// Bytes read per chunk while hashing.
    pub chunk_size: usize,
    /// Number of files hashed at once. 1 keeps the scan sequential.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("algorithm", &self.algorithm)
            .field("chunk_size", &self.chunk_size)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            io_threads: 1,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the hashing chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The bounded hashing pool could not be created.
    #[error("Failed to start hashing pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Any other scan error surfaced while setting up the walk.
    #[error(transparent)]
    Scan(ScanError),
}

impl From<ScanError> for FinderError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::RootNotFound(path) => Self::PathNotFound(path),
            ScanError::NotADirectory(path) => Self::NotADirectory(path),
            other => Self::Scan(other),
        }
    }
}

/// Per-file hashing outcome.
type HashOutcome = (FileDescriptor, Result<Fingerprint, HashError>);

/// Duplicate finder that runs the scan pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::new()
            .with_algorithm(config.algorithm)
            .with_chunk_size(config.chunk_size);
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Scan `path` and group its candidates by content.
    ///
    /// # Errors
    ///
    /// - [`FinderError::PathNotFound`] / [`FinderError::NotADirectory`] for an
    ///   invalid root, before any file is read
    /// - [`FinderError::Interrupted`] if the shutdown flag is raised
    /// - [`FinderError::ThreadPool`] if parallel hashing cannot start
    pub fn find_duplicates(&self, path: &Path) -> Result<ScanResult, FinderError> {
        let start_time = Instant::now();

        let mut walker = Walker::new(path, self.config.walker_config.clone())?;
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        log::info!("Scanning directory structure: {}", walker.root().display());

        let (files, skipped) = self.enumerate(&walker);
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        log::info!("Found {} candidate files to process", files.len());

        self.group_files(files, skipped, start_time)
    }

    /// Fingerprint and group an already enumerated list of files.
    ///
    /// Useful when candidates come from somewhere other than a directory
    /// walk. Files that fail to hash are reported in [`ScanResult::errors`].
    ///
    /// # Errors
    ///
    /// - [`FinderError::Interrupted`] if the shutdown flag is raised
    /// - [`FinderError::ThreadPool`] if parallel hashing cannot start
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileDescriptor>,
    ) -> Result<ScanResult, FinderError> {
        self.group_files(files, Vec::new(), Instant::now())
    }

    /// Walk the tree, splitting candidates from skipped entries.
    fn enumerate(&self, walker: &Walker) -> (Vec<FileDescriptor>, Vec<ScanError>) {
        self.notify(|cb| cb.on_phase_start(PHASE_ENUMERATE, 0));

        let mut files = Vec::new();
        let mut skipped = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(file) => {
                    let found = files.len() + 1;
                    self.notify(|cb| cb.on_progress(found, &file.path));
                    files.push(file);
                }
                Err(e) => skipped.push(e),
            }
        }

        self.notify(|cb| cb.on_phase_end(PHASE_ENUMERATE));
        (files, skipped)
    }

    /// Hash every file, record outcomes in order, and finalize.
    fn group_files(
        &self,
        files: Vec<FileDescriptor>,
        skipped: Vec<ScanError>,
        start_time: Instant,
    ) -> Result<ScanResult, FinderError> {
        let total = files.len();
        self.notify(|cb| cb.on_phase_start(PHASE_HASH, total));

        let outcomes = if self.config.io_threads > 1 && total > 1 {
            self.hash_parallel(files)?
        } else {
            self.hash_sequential(files)?
        };

        let mut index = GroupingIndex::new();
        let mut errors = Vec::new();
        for (file, outcome) in outcomes {
            match outcome {
                Ok(fingerprint) => index.record(fingerprint, file),
                Err(e) => errors.push(e),
            }
        }

        self.notify(|cb| cb.on_phase_end(PHASE_HASH));

        let result = index.finalize().with_errors(errors, skipped).with_run_info(
            total,
            self.config.algorithm,
            start_time.elapsed(),
        );
        log::info!(
            "Hashing complete: {} groups, {} duplicates, {} bytes reclaimable",
            result.stats().duplicate_groups,
            result.stats().duplicate_files,
            result.stats().wasted_bytes
        );
        Ok(result)
    }

    fn hash_sequential(&self, files: Vec<FileDescriptor>) -> Result<Vec<HashOutcome>, FinderError> {
        let mut outcomes = Vec::with_capacity(files.len());
        for (idx, file) in files.into_iter().enumerate() {
            if self.config.is_shutdown_requested() {
                log::debug!("Shutdown requested after {} files", idx);
                return Err(FinderError::Interrupted);
            }
            let outcome = self.hash_one(&file);
            self.notify(|cb| cb.on_progress(idx + 1, &file.path));
            outcomes.push((file, outcome));
        }
        Ok(outcomes)
    }

    fn hash_parallel(&self, files: Vec<FileDescriptor>) -> Result<Vec<HashOutcome>, FinderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .thread_name(|i| format!("rawdupe-hash-{}", i))
            .build()?;
        log::debug!("Hashing on {} threads", self.config.io_threads);

        let processed = AtomicUsize::new(0);
        // Indexed collect keeps enumeration order regardless of completion order.
        let outcomes: Vec<Option<HashOutcome>> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    let outcome = self.hash_one(&file);
                    let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.notify(|cb| cb.on_progress(done, &file.path));
                    Some((file, outcome))
                })
                .collect()
        });

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(outcomes.into_iter().flatten().collect())
    }

    fn hash_one(&self, file: &FileDescriptor) -> Result<Fingerprint, HashError> {
        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                file.size / (1024 * 1024),
                file.path.display()
            );
        }

        match self.hasher.fingerprint(file) {
            Ok(fingerprint) => {
                log::trace!("{} {}", fingerprint, file.path.display());
                Ok(fingerprint)
            }
            Err(e) => {
                log::warn!("Error hashing {}: {}", file.path.display(), e.source);
                Err(e)
            }
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn ProgressCallback)) {
        if let Some(ref callback) = self.config.progress_callback {
            f(callback.as_ref());
        }
    }
}
