//! JSON report.
//!
//! # Schema
//!
//! ```json
//! {
//!   "scan_date": "2026-10-16T21:04:11.512+02:00",
//!   "algorithm": "sha256",
//!   "files_scanned": 1200,
//!   "files_failed": 0,
//!   "total_duplicate_sets": 1,
//!   "total_duplicate_files": 2,
//!   "wasted_bytes": 25165824,
//!   "duplicates": [
//!     {
//!       "hash": "9f86d08188...",
//!       "count": 2,
//!       "size_mb": 48.0,
//!       "wasted_bytes": 25165824,
//!       "files": ["/volume1/photos/a.ARW", "/volume1/photos/copy/a.ARW"]
//!     }
//!   ]
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::to_mib;
use crate::duplicates::{DuplicateGroup, ScanResult};
use crate::scanner::HashAlgorithm;

/// One duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Full hex fingerprint
    pub hash: String,
    /// Files in the group
    pub count: usize,
    /// Combined size in MiB
    pub size_mb: f64,
    /// Bytes reclaimable by keeping one copy
    pub wasted_bytes: u64,
    /// Paths in discovery order
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.fingerprint.to_hex(),
            count: group.len(),
            size_mb: to_mib(group.total_size()),
            wasted_bytes: group.wasted_space(),
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Full JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    /// Time the report was generated (RFC 3339, local offset)
    pub scan_date: DateTime<Local>,
    /// Hash algorithm used
    pub algorithm: HashAlgorithm,
    /// Candidate files found
    pub files_scanned: usize,
    /// Candidates that could not be hashed
    pub files_failed: usize,
    /// Number of duplicate groups
    pub total_duplicate_sets: usize,
    /// Files across all groups, first members included
    pub total_duplicate_files: usize,
    /// Reclaimable bytes across all groups
    pub wasted_bytes: u64,
    /// Groups, largest first
    pub duplicates: Vec<JsonDuplicateGroup>,
}

impl JsonReport {
    /// Build a report stamped with the current time.
    #[must_use]
    pub fn new(result: &ScanResult) -> Self {
        Self::at(result, Local::now())
    }

    /// Build a report with an explicit timestamp.
    #[must_use]
    pub fn at(result: &ScanResult, scan_date: DateTime<Local>) -> Self {
        let stats = result.stats();
        Self {
            scan_date,
            algorithm: stats.algorithm,
            files_scanned: stats.files_scanned,
            files_failed: stats.files_failed,
            total_duplicate_sets: stats.duplicate_groups,
            total_duplicate_files: result.groups().iter().map(DuplicateGroup::len).sum(),
            wasted_bytes: stats.wasted_bytes,
            duplicates: result.groups().iter().map(JsonDuplicateGroup::from).collect(),
        }
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer).map_err(serde_json::Error::io)
    }
}
