//! CLI integration tests for diskmemo

use diskmemo::{CacheKey, DiskCache};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_diskmemo"))
}

fn run_cli(cache_dir: &Path, args: &[&str]) -> Output {
    Command::new(binary_path())
        .arg("--cache-dir")
        .arg(cache_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run binary")
}

/// Populate a cache with two `add` results and one `greet` result
fn seed_cache(dir: &Path) -> DiskCache {
    let cache = DiskCache::at(dir);
    let add = cache.memoize("add", |(a, b): (i64, i64)| a + b).unwrap();
    add.call((1, 2)).unwrap();
    add.call((5, 5)).unwrap();
    let greet = cache
        .memoize("greet", |name: String| format!("hi {name}"))
        .unwrap();
    greet.call("bob".to_string()).unwrap();
    cache
}

mod cli_behavior {
    use super::*;

    #[test]
    fn test_help_flag() {
        let output = Command::new(binary_path())
            .arg("--help")
            .output()
            .expect("Failed to run binary");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("memoized function caches"));
        assert!(stdout.contains("--cache-dir"));
        assert!(stdout.contains("clear"));
    }

    #[test]
    fn test_path_prints_configured_dir() {
        let temp = TempDir::new().unwrap();
        let output = run_cli(temp.path(), &["path"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), temp.path().display().to_string());
    }

    #[test]
    fn test_key_matches_library() {
        let temp = TempDir::new().unwrap();
        let output = run_cli(temp.path(), &["key", "[1,2]"]);

        assert!(output.status.success());
        let expected = CacheKey::derive(&(1, 2), &()).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected.as_str());
    }

    #[test]
    fn test_invalid_json_exits_with_error() {
        let temp = TempDir::new().unwrap();
        let output = run_cli(temp.path(), &["key", "not-json"]);

        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Invalid input"));
    }
}

mod maintenance {
    use super::*;

    #[test]
    fn test_list_shows_entries() {
        let temp = TempDir::new().unwrap();
        seed_cache(temp.path());

        let output = run_cli(temp.path(), &["list"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.lines().filter(|l| l.starts_with("add ")).count(), 2);
        assert_eq!(stdout.lines().filter(|l| l.starts_with("greet ")).count(), 1);
        assert!(stdout.contains("3 cached result(s)"));
    }

    #[test]
    fn test_stats_json() {
        let temp = TempDir::new().unwrap();
        seed_cache(temp.path());

        let output = run_cli(temp.path(), &["stats", "--json"]);
        assert!(output.status.success());
        let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(stats["entries"], 3);
        assert_eq!(stats["by_function"]["add"][0], 2);
    }

    #[test]
    fn test_show_stored_value() {
        let temp = TempDir::new().unwrap();
        seed_cache(temp.path());
        let key = CacheKey::for_args(&(5, 5)).unwrap();

        let output = run_cli(temp.path(), &["show", "add", key.as_str()]);
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "10");

        let missing = CacheKey::for_args(&(6, 6)).unwrap();
        let output = run_cli(temp.path(), &["show", "add", missing.as_str()]);
        assert_eq!(output.status.code(), Some(1));
    }

    #[test]
    fn test_clear_one_function_then_all() {
        let temp = TempDir::new().unwrap();
        let cache = seed_cache(temp.path());

        let output = run_cli(temp.path(), &["clear", "--function", "add"]);
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("Removed 2"));
        assert_eq!(cache.entries().unwrap().len(), 1);

        let output = run_cli(temp.path(), &["clear"]);
        assert!(output.status.success());
        assert!(cache.entries().unwrap().is_empty());
    }

    #[test]
    fn test_list_on_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let output = run_cli(&temp.path().join("never-created"), &["list"]);

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("0 cached result(s)"));
    }
}
