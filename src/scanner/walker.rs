//! Candidate enumeration over a directory tree.
//!
//! # Overview
//!
//! [`Walker`] visits every entry below a root directory and yields a
//! [`FileDescriptor`] for each regular file whose extension is in the
//! configured [`ExtensionSet`](super::ExtensionSet). Traversal is
//! single-threaded and sorted by file name, so an unchanged tree is always
//! discovered in the same order.
//!
//! # Symlinks
//!
//! By default links are never followed: symlinked directories are not
//! descended and symlinked files are not candidates. With
//! `follow_symlinks` enabled, `walkdir` tracks the ancestor chain and a link
//! that resolves to one of its ancestors is reported as
//! [`ScanError::Loop`] instead of being traversed.
//!
//! # Example
//!
//! ```no_run
//! use rawdupe::scanner::{ExtensionSet, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::new(ExtensionSet::new([".arw", ".dng"]), false);
//! let walker = Walker::new(Path::new("/volume1/photos"), config).unwrap();
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} RAW files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{FileDescriptor, ScanError, WalkerConfig};

/// Directory walker for candidate discovery.
#[derive(Debug)]
pub struct Walker {
    /// Absolute, canonical root path
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a walker rooted at `path`.
    ///
    /// The root is canonicalized so every yielded path is absolute.
    ///
    /// # Errors
    ///
    /// - [`ScanError::RootNotFound`] if `path` does not exist
    /// - [`ScanError::NotADirectory`] if `path` is not a directory
    pub fn new(path: &Path, config: WalkerConfig) -> Result<Self, ScanError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                log::debug!("Cannot stat root {}: {}", path.display(), e);
                return Err(ScanError::RootNotFound(path.to_path_buf()));
            }
        };
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(path.to_path_buf()));
        }

        let root = std::fs::canonicalize(path)
            .map_err(|_| ScanError::RootNotFound(path.to_path_buf()))?;

        Ok(Self {
            root,
            config,
            shutdown_flag: None,
        })
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Once the flag is `true`, iteration ends at the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The canonical root being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding candidates.
    ///
    /// Unreadable entries are yielded as non-fatal [`ScanError`] values and
    /// iteration continues past them. Each call starts a fresh walk.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileDescriptor, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    // With follow_links the type is already that of the target;
                    // without it a symlink is never a candidate.
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }
                    if !file_type.is_file() {
                        return None;
                    }
                    if !self.config.extensions.matches(entry.path()) {
                        log::trace!("Skipping by extension: {}", entry.path().display());
                        return None;
                    }

                    match entry.metadata() {
                        Ok(metadata) => Some(Ok(FileDescriptor::new(
                            entry.into_path(),
                            metadata.len(),
                        ))),
                        Err(e) => Some(Err(self.handle_walk_error(e))),
                    }
                }
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
    }

    /// Convert a walkdir error into a non-fatal scan error.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            log::warn!(
                "Symlink loop at {} (points to {}), not descending",
                path.display(),
                ancestor.display()
            );
            return ScanError::Loop {
                path,
                ancestor: ancestor.to_path_buf(),
            };
        }

        let source = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("walk error"));
        log::warn!("Skipping {}: {}", path.display(), source);
        ScanError::EntrySkipped { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ExtensionSet;
    use std::fs;
    use tempfile::TempDir;

    /// Create a small photo tree.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("a.arw"), b"raw one").unwrap();
        fs::write(dir.path().join("b.dng"), b"raw two").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a photo").unwrap();

        let subdir = dir.path().join("2024").join("trip");
        fs::create_dir_all(&subdir).unwrap();
        fs::write(subdir.join("c.NEF"), b"raw three").unwrap();

        dir
    }

    fn names(files: &[FileDescriptor]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_walker_finds_candidates() {
        let dir = create_test_dir();
        let walker = Walker::new(dir.path(), WalkerConfig::default()).unwrap();

        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();

        let mut found = names(&files);
        found.sort();
        assert_eq!(found, vec!["a.arw", "b.dng", "c.NEF"]);
        for file in &files {
            assert!(file.path.is_absolute());
            assert!(file.size > 0);
        }
    }

    #[test]
    fn test_walker_records_size() {
        let dir = create_test_dir();
        let walker = Walker::new(dir.path(), WalkerConfig::default()).unwrap();

        let file = walker
            .walk()
            .filter_map(Result::ok)
            .find(|f| f.path.ends_with("a.arw"))
            .unwrap();
        assert_eq!(file.size, 7);
    }

    #[test]
    fn test_walker_extension_filter() {
        let dir = create_test_dir();
        let config = WalkerConfig::new(ExtensionSet::new([".txt"]), false);
        let walker = Walker::new(dir.path(), config).unwrap();

        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert_eq!(names(&files), vec!["notes.txt"]);
    }

    #[test]
    fn test_walker_order_is_deterministic() {
        let dir = create_test_dir();
        let walker = Walker::new(dir.path(), WalkerConfig::default()).unwrap();

        let first: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        let second: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_walker_includes_empty_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.dng"), b"").unwrap();

        let walker = Walker::new(dir.path(), WalkerConfig::default()).unwrap();
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 0);
    }

    #[test]
    fn test_walker_root_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = Walker::new(&missing, WalkerConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(p) if p == missing));
    }

    #[test]
    fn test_walker_root_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.arw");
        fs::write(&file, b"x").unwrap();

        let err = Walker::new(&file, WalkerConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_walker_shutdown_flag() {
        let dir = create_test_dir();
        let shutdown = Arc::new(AtomicBool::new(true));
        let walker = Walker::new(dir.path(), WalkerConfig::default())
            .unwrap()
            .with_shutdown_flag(Arc::clone(&shutdown));

        assert_eq!(walker.walk().count(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_does_not_follow_symlinks_by_default() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("linked.arw"), b"outside").unwrap();
        symlink(outside.path(), dir.path().join("link_dir")).unwrap();
        symlink(dir.path().join("a.arw"), dir.path().join("alias.arw")).unwrap();

        let walker = Walker::new(dir.path(), WalkerConfig::default()).unwrap();
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();

        let found = names(&files);
        assert!(!found.contains(&"linked.arw".to_string()));
        assert!(!found.contains(&"alias.arw".to_string()));
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_follow_symlinks_detects_loop() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        let subdir = dir.path().join("2024");
        symlink(dir.path(), subdir.join("back_to_root")).unwrap();

        let config = WalkerConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let walker = Walker::new(dir.path(), config).unwrap();
        let results: Vec<_> = walker.walk().collect();

        let loops = results
            .iter()
            .filter(|r| matches!(r, Err(ScanError::Loop { .. })))
            .count();
        assert_eq!(loops, 1);

        let files: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(files.len(), 3);
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_skips_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_dir();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.arw"), b"secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits, nothing to observe then.
        let readable = fs::read_dir(&locked).is_ok();

        let walker = Walker::new(dir.path(), WalkerConfig::default()).unwrap();
        let results: Vec<_> = walker.walk().collect();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ScanError::EntrySkipped { .. }))));
        let files: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(files.len(), 3);
    }
}
