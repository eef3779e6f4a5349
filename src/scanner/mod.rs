//! Scanner module for candidate enumeration and content fingerprinting.
//!
//! This module provides functionality for:
//! - Walking a directory tree and selecting files by extension
//! - Streaming content hashing (SHA-256 or BLAKE3)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate discovery
//! - [`hasher`]: Chunked file fingerprinting
//!
//! # Example
//!
//! ```no_run
//! use rawdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/volume1/photos"), WalkerConfig::default()).unwrap();
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub use hasher::{Fingerprint, HashAlgorithm, Hasher, DEFAULT_CHUNK_SIZE};
pub use walker::Walker;

/// RAW formats accepted when no extension list is configured.
pub const DEFAULT_RAW_EXTENSIONS: &[&str] = &[
    ".arw", ".dng", ".raw", ".cr2", ".nef", ".orf", ".rw2", ".pef", ".srw",
];

/// One candidate file discovered during enumeration.
///
/// The size is captured from metadata at enumeration time and is what
/// wasted-space statistics are computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileDescriptor {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDescriptor {
    /// Create a new descriptor.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Set of accepted file extensions.
///
/// Entries are stored lower-cased with a leading dot, so `"ARW"`, `".arw"`
/// and `" .Arw "` all normalize to `".arw"`. Matching against a path is
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: BTreeSet<String>,
}

impl ExtensionSet {
    /// Build a set from arbitrary extension strings, normalizing each one.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(extensions);
        set
    }

    /// The RAW photo extensions scanned by default.
    #[must_use]
    pub fn raw_defaults() -> Self {
        Self::new(DEFAULT_RAW_EXTENSIONS.iter().copied())
    }

    /// Add more extensions to the set.
    pub fn extend<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            if let Some(normalized) = normalize_extension(ext.as_ref()) {
                self.extensions.insert(normalized);
            }
        }
    }

    /// Check whether the file's extension is a member of the set.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .contains(&format!(".{}", ext.to_lowercase()))
            })
    }

    /// Number of extensions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Check if the set is empty. An empty set matches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Iterate over the normalized extensions in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

/// Normalize one extension to lower-case with a leading dot.
///
/// Returns `None` for blank input.
fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!(".{}", trimmed.to_lowercase()))
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Extensions a file must carry to become a candidate.
    pub extensions: ExtensionSet,

    /// Follow symbolic links during traversal.
    /// Links that loop back to an ancestor are reported and not descended.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: ExtensionSet::raw_defaults(),
            follow_symlinks: false,
        }
    }
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(extensions: ExtensionSet, follow_symlinks: bool) -> Self {
        Self {
            extensions,
            follow_symlinks,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root path does not exist.
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// The root path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory entry could not be read and was left out of the scan.
    #[error("Skipped {path}: {source}")]
    EntrySkipped {
        /// Path of the entry that was skipped
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A followed symlink points back at one of its ancestors.
    #[error("Symlink loop at {path} (points to ancestor {ancestor})")]
    Loop {
        /// Path of the link
        path: PathBuf,
        /// The ancestor directory it resolves to
        ancestor: PathBuf,
    },
}

impl ScanError {
    /// Whether this error aborts the whole scan.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RootNotFound(_) | Self::NotADirectory(_))
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootNotFound(path) | Self::NotADirectory(path) => path,
            Self::EntrySkipped { path, .. } | Self::Loop { path, .. } => path,
        }
    }
}

/// A candidate file could not be fully hashed.
///
/// Never fatal: the file is left out of grouping and the error is reported
/// alongside the scan result.
#[derive(thiserror::Error, Debug)]
#[error("Failed to hash {path}: {source}")]
pub struct HashError {
    /// File that failed
    pub path: PathBuf,
    /// The underlying I/O error
    #[source]
    pub source: std::io::Error,
}

impl HashError {
    /// Create a new hashing error.
    #[must_use]
    pub fn new(path: PathBuf, source: std::io::Error) -> Self {
        Self { path, source }
    }

    /// The kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> std::io::ErrorKind {
        self.source.kind()
    }
}
