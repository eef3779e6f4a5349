//! CSV report.
//!
//! One row per duplicate group, largest groups first:
//!
//! | Column | Content |
//! |--------|---------|
//! | `Hash` | First 16 hex characters of the fingerprint |
//! | `File_Count` | Files in the group |
//! | `Total_Size_MB` | Combined size of the group in MiB, two decimals |
//! | `File_Paths` | Paths joined by `" \| "` |

use std::io;

use serde::Serialize;

use super::to_mib;
use crate::duplicates::DuplicateGroup;

/// Length of the hash prefix written to the report.
pub const HASH_PREFIX_LEN: usize = 16;

/// Separator between paths in the `File_Paths` column.
pub const PATH_SEPARATOR: &str = " | ";

#[derive(Debug, Serialize)]
struct CsvRow {
    #[serde(rename = "Hash")]
    hash: String,
    #[serde(rename = "File_Count")]
    file_count: usize,
    #[serde(rename = "Total_Size_MB")]
    total_size_mb: String,
    #[serde(rename = "File_Paths")]
    file_paths: String,
}

impl CsvRow {
    fn from_group(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.fingerprint.short_hex(HASH_PREFIX_LEN),
            file_count: group.len(),
            total_size_mb: format!("{:.2}", to_mib(group.total_size())),
            file_paths: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy())
                .collect::<Vec<_>>()
                .join(PATH_SEPARATOR),
        }
    }
}

/// CSV report writer.
pub struct CsvReport<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> CsvReport<'a> {
    /// Wrap groups in report order.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the header and one row per group.
    ///
    /// The header is written even when there are no groups.
    ///
    /// # Errors
    ///
    /// Returns a [`csv::Error`] if writing fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(["Hash", "File_Count", "Total_Size_MB", "File_Paths"])?;
        for group in self.groups {
            csv_writer.serialize(CsvRow::from_group(group))?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns a [`csv::Error`] if serialization fails.
    pub fn to_string(&self) -> Result<String, csv::Error> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{FileDescriptor, Fingerprint};
    use std::path::PathBuf;

    fn group(byte: u8, paths: &[&str], size: u64) -> DuplicateGroup {
        DuplicateGroup::new(
            Fingerprint::from_bytes([byte; 32]),
            paths
                .iter()
                .map(|p| FileDescriptor::new(PathBuf::from(p), size))
                .collect(),
        )
    }

    #[test]
    fn test_csv_row_layout() {
        let groups = vec![group(0xab, &["/p/a.dng", "/p/b.dng"], 1_572_864)];
        let text = CsvReport::new(&groups).to_string().unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Hash,File_Count,Total_Size_MB,File_Paths")
        );
        assert_eq!(
            lines.next(),
            Some("abababababababab,2,3.00,/p/a.dng | /p/b.dng")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        let text = CsvReport::new(&[]).to_string().unwrap();
        assert_eq!(text, "Hash,File_Count,Total_Size_MB,File_Paths\n");
    }

    #[test]
    fn test_csv_quotes_paths_with_commas() {
        let groups = vec![group(1, &["/p/a,b.arw", "/p/c.arw"], 10)];
        let text = CsvReport::new(&groups).to_string().unwrap();
        assert!(text.contains("\"/p/a,b.arw | /p/c.arw\""));
    }

    #[test]
    fn test_csv_size_rounding() {
        let groups = vec![group(2, &["/a.nef", "/b.nef", "/c.nef"], 1000)];
        let text = CsvReport::new(&groups).to_string().unwrap();
        // 3000 bytes is 0.00286 MiB
        assert!(text.contains(",3,0.00,"));
    }
}
