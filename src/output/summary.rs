//! Console summary printed after a scan.

use std::io::{self, Write};
use std::time::Duration;

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::{DuplicateGroup, ScanResult};

const RULE_WIDTH: usize = 70;

/// Human-readable results block.
pub struct Summary<'a> {
    result: &'a ScanResult,
}

impl<'a> Summary<'a> {
    /// Summarize `result`.
    #[must_use]
    pub fn new(result: &'a ScanResult) -> Self {
        Self { result }
    }

    /// Write the summary block.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        let stats = self.result.stats();
        let rule = "=".repeat(RULE_WIDTH);
        let all_members: usize = self.result.groups().iter().map(DuplicateGroup::len).sum();

        writeln!(w, "{}", rule)?;
        writeln!(w, "{}", "RESULTS".bold())?;
        writeln!(w, "{}", rule)?;
        writeln!(w, "RAW files scanned:      {}", stats.files_scanned)?;
        writeln!(w, "Duplicate sets found:   {}", stats.duplicate_groups.bold())?;
        writeln!(w, "Total duplicate files:  {}", all_members)?;
        if stats.duplicate_groups > 0 {
            writeln!(
                w,
                "Wasted storage:         {}",
                ByteSize::b(stats.wasted_bytes).to_string().yellow().bold()
            )?;
        }
        if stats.files_failed > 0 {
            writeln!(w, "Unreadable files:       {}", stats.files_failed.red())?;
        }
        if stats.entries_skipped > 0 {
            writeln!(w, "Skipped entries:        {}", stats.entries_skipped.red())?;
        }
        writeln!(
            w,
            "Scan time:              {} ({})",
            format_duration(stats.scan_duration),
            stats.algorithm
        )?;
        writeln!(w, "{}", rule)?;

        if stats.duplicate_groups == 0 {
            writeln!(w, "{}", "No duplicates found - all files are unique.".green())?;
        } else {
            writeln!(
                w,
                "{}",
                format!("Found {} sets of duplicates", stats.duplicate_groups).green()
            )?;
        }
        Ok(())
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Seconds under a minute, minutes with one decimal above.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1} seconds", secs)
    } else {
        format!("{:.1} minutes", secs / 60.0)
    }
}
