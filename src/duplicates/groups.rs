//! Fingerprint grouping and scan results.
//!
//! # Overview
//!
//! [`GroupingIndex`] accumulates `fingerprint -> files` associations while a
//! scan runs. It is created at scan start, fed through
//! [`GroupingIndex::record`], and consumed by [`GroupingIndex::finalize`],
//! which keeps only fingerprints shared by two or more files and computes
//! the aggregate statistics.
//!
//! # Ordering
//!
//! Members of a group keep the order in which they were recorded. Groups are
//! sorted by descending member count; ties keep the order in which their
//! fingerprint was first recorded. The same sequence of `record` calls
//! therefore always yields the same [`ScanResult`].
//!
//! # Example
//!
//! ```
//! use rawdupe::duplicates::GroupingIndex;
//! use rawdupe::scanner::{FileDescriptor, Fingerprint};
//! use std::path::PathBuf;
//!
//! let x = Fingerprint::from_bytes([1; 32]);
//! let y = Fingerprint::from_bytes([2; 32]);
//!
//! let mut index = GroupingIndex::new();
//! index.record(x, FileDescriptor::new(PathBuf::from("/a.dng"), 100));
//! index.record(x, FileDescriptor::new(PathBuf::from("/b.dng"), 100));
//! index.record(y, FileDescriptor::new(PathBuf::from("/c.dng"), 50));
//!
//! let result = index.finalize();
//! assert_eq!(result.groups().len(), 1);
//! assert_eq!(result.stats().wasted_bytes, 100);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::scanner::{FileDescriptor, Fingerprint, HashAlgorithm, HashError, ScanError};

/// Files sharing one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content fingerprint shared by every member
    pub fingerprint: Fingerprint,
    /// Members in discovery order
    pub files: Vec<FileDescriptor>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, files: Vec<FileDescriptor>) -> Self {
        Self { fingerprint, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Reclaimable space: sizes of every member after the first.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.files.iter().skip(1).map(|f| f.size).sum()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Aggregate statistics for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Candidate files found by enumeration
    pub files_scanned: usize,
    /// Files whose fingerprint was computed
    pub files_hashed: usize,
    /// Files that could not be hashed
    pub files_failed: usize,
    /// Directory entries skipped during traversal
    pub entries_skipped: usize,
    /// Total size of the successfully hashed files, as recorded at enumeration
    pub bytes_hashed: u64,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Files beyond the first in every group
    pub duplicate_files: usize,
    /// Sum over groups of the sizes of all members after the first
    pub wasted_bytes: u64,
    /// Wall time for the whole scan
    pub scan_duration: Duration,
    /// Digest used for fingerprints
    pub algorithm: HashAlgorithm,
}

/// Outcome of one scan run.
///
/// Immutable once returned; consumed by reporting.
#[derive(Debug, Default)]
pub struct ScanResult {
    groups: Vec<DuplicateGroup>,
    stats: ScanStats,
    errors: Vec<HashError>,
    skipped: Vec<ScanError>,
}

impl ScanResult {
    /// Duplicate groups, largest first.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Look up the group for a fingerprint.
    #[must_use]
    pub fn group(&self, fingerprint: &Fingerprint) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| &g.fingerprint == fingerprint)
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Files that could not be hashed.
    #[must_use]
    pub fn errors(&self) -> &[HashError] {
        &self.errors
    }

    /// Entries skipped during traversal.
    #[must_use]
    pub fn skipped(&self) -> &[ScanError] {
        &self.skipped
    }

    /// True if no duplicate groups were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// True if any file or entry had to be left out.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || !self.skipped.is_empty()
    }

    /// Attach the non-fatal errors collected by the pipeline.
    pub(crate) fn with_errors(mut self, errors: Vec<HashError>, skipped: Vec<ScanError>) -> Self {
        self.stats.files_failed = errors.len();
        self.stats.entries_skipped = skipped.len();
        self.errors = errors;
        self.skipped = skipped;
        self
    }

    /// Fill in the run-level statistics the index cannot know.
    pub(crate) fn with_run_info(
        mut self,
        files_scanned: usize,
        algorithm: HashAlgorithm,
        scan_duration: Duration,
    ) -> Self {
        self.stats.files_scanned = files_scanned;
        self.stats.algorithm = algorithm;
        self.stats.scan_duration = scan_duration;
        self
    }
}

/// Accumulates fingerprint associations for one scan.
#[derive(Debug, Default)]
pub struct GroupingIndex {
    /// Position of each fingerprint in `entries`
    positions: HashMap<Fingerprint, usize>,
    /// Fingerprints in first-seen order with their members
    entries: Vec<(Fingerprint, Vec<FileDescriptor>)>,
    files_recorded: usize,
    bytes_recorded: u64,
}

impl GroupingIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `file` to the sequence for `fingerprint`.
    pub fn record(&mut self, fingerprint: Fingerprint, file: FileDescriptor) {
        self.files_recorded += 1;
        self.bytes_recorded += file.size;

        match self.positions.get(&fingerprint) {
            Some(&pos) => self.entries[pos].1.push(file),
            None => {
                self.positions.insert(fingerprint, self.entries.len());
                self.entries.push((fingerprint, vec![file]));
            }
        }
    }

    /// Number of files recorded so far.
    #[must_use]
    pub fn files_recorded(&self) -> usize {
        self.files_recorded
    }

    /// Number of distinct fingerprints seen so far.
    #[must_use]
    pub fn distinct_fingerprints(&self) -> usize {
        self.entries.len()
    }

    /// Consume the index and build the scan result.
    #[must_use]
    pub fn finalize(self) -> ScanResult {
        let mut stats = ScanStats {
            files_scanned: self.files_recorded,
            files_hashed: self.files_recorded,
            bytes_hashed: self.bytes_recorded,
            ..Default::default()
        };

        let mut groups: Vec<DuplicateGroup> = self
            .entries
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .map(|(fingerprint, files)| {
                log::debug!(
                    "Duplicate group {}: {} files",
                    fingerprint.short_hex(16),
                    files.len()
                );
                DuplicateGroup::new(fingerprint, files)
            })
            .collect();

        // Stable: equal counts keep first-seen order.
        groups.sort_by(|a, b| b.len().cmp(&a.len()));

        stats.duplicate_groups = groups.len();
        stats.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        stats.wasted_bytes = groups.iter().map(DuplicateGroup::wasted_space).sum();

        ScanResult {
            groups,
            stats,
            errors: Vec::new(),
            skipped: Vec::new(),
        }
    }
}
