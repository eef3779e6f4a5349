//! Report writers and the console summary.
//!
//! - CSV for spreadsheets, one row per duplicate group
//! - JSON for automation, with scan metadata
//!
//! # Example
//!
//! ```no_run
//! use rawdupe::cli::ReportFormat;
//! use rawdupe::duplicates::DuplicateFinder;
//! use rawdupe::output::write_report;
//! use std::path::Path;
//!
//! let result = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("/volume1/photos"))
//!     .unwrap();
//! write_report(&result, Path::new("reports/dupes.csv"), ReportFormat::Csv).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod summary;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cli::ReportFormat;
use crate::duplicates::ScanResult;

pub use self::csv::CsvReport;
pub use self::json::JsonReport;
pub use self::summary::Summary;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Errors writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report file or its directory could not be created or written.
    #[error("Cannot write report {path}: {source}")]
    Io {
        /// Report path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write `result` to `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns [`ReportError`] if the directory or file cannot be created or
/// the report cannot be serialized.
pub fn write_report(
    result: &ScanResult,
    path: &Path,
    format: ReportFormat,
) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    match format {
        ReportFormat::Csv => CsvReport::new(result.groups()).write_to(&mut writer)?,
        ReportFormat::Json => JsonReport::new(result).write_to(&mut writer)?,
    }
    writer.flush().map_err(|e| ReportError::io(path, e))?;

    log::info!("Report saved to {}", path.display());
    Ok(())
}

fn to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::DuplicateFinder;
    use tempfile::TempDir;

    fn scan_fixture(dir: &Path) -> ScanResult {
        fs::write(dir.join("a.dng"), b"same").unwrap();
        fs::write(dir.join("b.dng"), b"same").unwrap();
        DuplicateFinder::with_defaults().find_duplicates(dir).unwrap()
    }

    #[test]
    fn test_write_report_creates_parent_dirs() {
        let photos = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = scan_fixture(photos.path());

        let path = out.path().join("nested/deeper/report.csv");
        write_report(&result, &path, ReportFormat::Csv).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Hash,File_Count,Total_Size_MB,File_Paths"));
    }

    #[test]
    fn test_write_report_json() {
        let photos = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = scan_fixture(photos.path());

        let path = out.path().join("report.json");
        write_report(&result, &path, ReportFormat::Json).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_duplicate_sets"], 1);
    }

    #[test]
    fn test_write_report_into_file_path_fails() {
        let photos = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let result = scan_fixture(photos.path());

        let blocker = out.path().join("not_a_dir");
        fs::write(&blocker, b"x").unwrap();
        let err = write_report(&result, &blocker.join("r.csv"), ReportFormat::Csv).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }

    #[test]
    fn test_to_mib() {
        assert_eq!(to_mib(1_048_576), 1.0);
        assert_eq!(to_mib(0), 0.0);
    }
}
