//! Configuration layering: defaults, TOML file, environment, CLI flags.

use clap::Parser;
use rawdupe::cli::{Cli, Commands, ScanArgs};
use rawdupe::config::{Config, ConfigError};
use rawdupe::scanner::HashAlgorithm;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all RAWDUPE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("RAWDUPE_") {
            std::env::remove_var(key);
        }
    }
}

fn scan_args(extra: &[&str]) -> ScanArgs {
    let mut argv = vec!["rawdupe", "scan", "/photos"];
    argv.extend_from_slice(extra);
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Scan(args) => args,
        Commands::Config => panic!("Expected Scan command"),
    }
}

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
extensions = [".arw", ".3fr"]
chunk_size = 65536
io_threads = 2
follow_symlinks = true
algorithm = "blake3"
"#,
    );

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.extensions, vec![".arw", ".3fr"]);
    assert_eq!(config.chunk_size, 65_536);
    assert_eq!(config.io_threads, 2);
    assert!(config.follow_symlinks);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    // Unset keys keep their defaults.
    assert_eq!(config.progress_interval_secs, 5);
}

#[test]
fn test_env_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "io_threads = 2\nprogress_interval_secs = 30\n");

    std::env::set_var("RAWDUPE_IO_THREADS", "6");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.io_threads, 6);
    assert_eq!(config.progress_interval_secs, 30);
}

#[test]
fn test_cli_overrides_env_and_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "io_threads = 2\nalgorithm = \"blake3\"\n");

    std::env::set_var("RAWDUPE_IO_THREADS", "6");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config
        .unwrap()
        .apply_scan_args(&scan_args(&["--io-threads", "3", "--algorithm", "sha256"]))
        .unwrap();
    assert_eq!(config.io_threads, 3);
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "io_threads = \"many\"\n");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_zero_chunk_size_in_file_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "chunk_size = 0\n");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "chunk_size", .. }));
}

#[test]
fn test_empty_extension_list_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "extensions = []\n");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "extensions", .. }));
}

#[test]
fn test_printed_config_reloads() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let original = Config::default()
        .apply_scan_args(&scan_args(&["-e", ".x3f", "--io-threads", "2"]))
        .unwrap();
    let path = write_config(dir.path(), &original.to_toml().unwrap());

    assert_eq!(Config::load(Some(&path)).unwrap(), original);
}
