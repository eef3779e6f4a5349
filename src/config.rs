//! Layered application configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, else `config.toml` in the platform config
//!    directory if it exists)
//! 3. Environment variables prefixed `RAWDUPE_` (e.g. `RAWDUPE_IO_THREADS=2`,
//!    `RAWDUPE_EXTENSIONS='[".arw", ".dng"]'`)
//! 4. Command-line flags, applied with [`Config::apply_scan_args`]
//!
//! # Example file
//!
//! ```toml
//! extensions = [".arw", ".dng", ".3fr"]
//! chunk_size = 65536
//! io_threads = 1
//! progress_interval_secs = 5
//! follow_symlinks = false
//! algorithm = "sha256"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::duplicates::FinderConfig;
use crate::scanner::{
    ExtensionSet, HashAlgorithm, WalkerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_RAW_EXTENSIONS,
};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RAWDUPE_";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A setting is outside its allowed range.
    #[error("Invalid value for '{key}': {reason}")]
    Invalid {
        /// Setting name
        key: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Effective scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extensions treated as candidates.
    pub extensions: Vec<String>,
    /// Bytes read per chunk while hashing.
    pub chunk_size: usize,
    /// Seconds between progress status lines.
    pub progress_interval_secs: u64,
    /// Number of files hashed in parallel.
    pub io_threads: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Content hash algorithm.
    pub algorithm: HashAlgorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_RAW_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval_secs: 5,
            io_threads: 1,
            follow_symlinks: false,
            algorithm: HashAlgorithm::Sha256,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `explicit` does not exist, a layer fails
    /// to parse, or the merged values are invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        Self::figment(file.as_deref())
            .extract::<Self>()
            .map_err(|e| ConfigError::Load(Box::new(e)))?
            .validated()
    }

    /// Build the layered figment without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            log::debug!("Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "rawdupe", "rawdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line overrides on top of the loaded layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is out of range.
    pub fn apply_scan_args(mut self, args: &ScanArgs) -> Result<Self, ConfigError> {
        self.extensions.extend(args.extensions.iter().cloned());
        if let Some(chunk_size) = args.chunk_size {
            self.chunk_size = usize::try_from(chunk_size).map_err(|_| ConfigError::Invalid {
                key: "chunk_size",
                reason: format!("{} does not fit in memory", chunk_size),
            })?;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(secs) = args.progress_interval {
            self.progress_interval_secs = secs;
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "chunk_size",
                reason: "must be at least 1 byte".to_string(),
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                key: "io_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.extension_set().is_empty() {
            return Err(ConfigError::Invalid {
                key: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        Ok(self)
    }

    /// Normalized extension set.
    #[must_use]
    pub fn extension_set(&self) -> ExtensionSet {
        ExtensionSet::new(&self.extensions)
    }

    /// Throttle interval for the progress monitor.
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    /// Finder configuration for these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_walker_config(WalkerConfig::new(
                self.extension_set(),
                self.follow_symlinks,
            ))
            .with_algorithm(self.algorithm)
            .with_chunk_size(self.chunk_size)
            .with_io_threads(self.io_threads)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn scan_args(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["rawdupe", "scan", "/photos"];
        full.extend_from_slice(argv);
        match crate::cli::Cli::try_parse_from(full).unwrap().command {
            crate::cli::Commands::Scan(args) => args,
            crate::cli::Commands::Config => unreachable!(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.io_threads, 1);
        assert_eq!(config.progress_interval(), Duration::from_secs(5));
        assert_eq!(config.algorithm, HashAlgorithm::Sha256);
        assert!(config.extension_set().matches(Path::new("a.ARW")));
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default()
            .apply_scan_args(&scan_args(&[
                "-e",
                ".3fr",
                "--io-threads",
                "3",
                "--chunk-size",
                "1MiB",
                "--algorithm",
                "blake3",
                "--follow-symlinks",
            ]))
            .unwrap();

        assert_eq!(config.io_threads, 3);
        assert_eq!(config.chunk_size, 1_048_576);
        assert_eq!(config.algorithm, HashAlgorithm::Blake3);
        assert!(config.follow_symlinks);
        // Added to the defaults, not replacing them.
        assert!(config.extension_set().matches(Path::new("a.3FR")));
        assert!(config.extension_set().matches(Path::new("a.dng")));
    }

    #[test]
    fn test_validation_rejects_zero_threads() {
        let err = Config::default()
            .apply_scan_args(&scan_args(&["--io-threads", "0"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "io_threads", .. }));
    }

    #[test]
    fn test_validation_rejects_zero_chunk() {
        let err = Config::default()
            .apply_scan_args(&scan_args(&["--chunk-size", "0"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "chunk_size", .. }));
    }

    #[test]
    fn test_validation_rejects_no_extensions() {
        let config = Config {
            extensions: vec![" ".to_string()],
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_finder_config_mapping() {
        let config = Config {
            io_threads: 2,
            chunk_size: 4096,
            ..Default::default()
        };
        let finder = config.finder_config();
        assert_eq!(finder.io_threads, 2);
        assert_eq!(finder.chunk_size, 4096);
        assert!(!finder.walker_config.follow_symlinks);
    }

    #[test]
    fn test_toml_output_parses_back() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
