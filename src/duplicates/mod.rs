//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Running the enumerate / fingerprint / group pipeline
//! - Accumulating fingerprints and building duplicate groups

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError};
pub use groups::{DuplicateGroup, GroupingIndex, ScanResult, ScanStats};
