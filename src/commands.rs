//! Subcommand execution

use crate::cli::Command;
use diskmemo::{CacheKey, DiskCache, MemoError, Result};
use serde_json::Value;
use std::io::Write;

/// Exit code for a successful command
pub const EXIT_OK: u8 = 0;

/// Exit code when `show` finds no artifact (not an error)
pub const EXIT_NOT_CACHED: u8 = 1;

/// Run `command` against `cache`, writing human output to `writer`
pub fn run(command: &Command, cache: &DiskCache, writer: &mut dyn Write) -> Result<u8> {
    match command {
        Command::Path => {
            writeln!(writer, "{}", cache.dir().display())?;
        }

        Command::List { function, json } => {
            let entries: Vec<_> = cache
                .entries()?
                .into_iter()
                .filter(|e| function.as_deref().map_or(true, |f| f == e.function))
                .collect();

            if *json {
                serde_json::to_writer_pretty(&mut *writer, &entries)
                    .map_err(|e| MemoError::serialization("entry list", e))?;
                writeln!(writer)?;
            } else {
                for entry in &entries {
                    writeln!(
                        writer,
                        "{}  {}  {} bytes",
                        entry.function, entry.key, entry.size_bytes
                    )?;
                }
                writeln!(writer, "{} cached result(s)", entries.len())?;
            }
        }

        Command::Stats { json } => {
            let stats = cache.stats()?;
            if *json {
                serde_json::to_writer_pretty(&mut *writer, &stats)
                    .map_err(|e| MemoError::serialization("cache stats", e))?;
                writeln!(writer)?;
            } else {
                writeln!(writer, "Cache directory: {}", cache.dir().display())?;
                for (function, (count, bytes)) in &stats.by_function {
                    writeln!(writer, "  {}: {} result(s), {} bytes", function, count, bytes)?;
                }
                writeln!(
                    writer,
                    "Total: {} result(s), {} bytes",
                    stats.entries, stats.total_bytes
                )?;
            }
        }

        Command::Clear { function } => {
            let removed = cache.clear(function.as_deref())?;
            writeln!(writer, "Removed {} cached result(s)", removed)?;
        }

        Command::Key { args, kwargs } => {
            let args = parse_json("ARGS_JSON", args)?;
            let kwargs = match kwargs {
                Some(raw) => parse_json("--kwargs", raw)?,
                None => Value::Null,
            };
            let key = CacheKey::derive(&args, &kwargs)?;
            writeln!(writer, "{}", key)?;
        }

        Command::Show { function, key } => {
            let key = CacheKey::parse(key).ok_or_else(|| {
                MemoError::InvalidInput(format!("'{}' is not a 64-character hex key", key))
            })?;
            match cache.load_raw(function, &key)? {
                Some(value) => {
                    serde_json::to_writer_pretty(&mut *writer, &value)
                        .map_err(|e| MemoError::serialization("artifact", e))?;
                    writeln!(writer)?;
                }
                None => {
                    writeln!(writer, "No cached result for {}_{}", function, key)?;
                    return Ok(EXIT_NOT_CACHED);
                }
            }
        }
    }

    Ok(EXIT_OK)
}

fn parse_json(what: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw)
        .map_err(|e| MemoError::InvalidInput(format!("{} is not valid JSON: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn run_to_string(command: Command, cache: &DiskCache) -> (u8, String) {
        let mut out = Vec::new();
        let code = run(&command, cache, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn populated_cache(temp: &TempDir) -> DiskCache {
        let cache = DiskCache::at(temp.path().join("cache"));
        let add = cache.memoize("add", |(a, b): (i64, i64)| a + b).unwrap();
        add.call((1, 2)).unwrap();
        add.call((2, 1)).unwrap();
        let greet = cache
            .memoize("greet", |name: String| format!("hello {name}"))
            .unwrap();
        greet.call("ada".to_string()).unwrap();
        cache
    }

    #[test]
    fn test_key_matches_library_derivation() {
        let temp = TempDir::new().unwrap();
        let cache = DiskCache::at(temp.path());
        let (code, out) = run_to_string(
            Command::Key {
                args: "[1, 2]".to_string(),
                kwargs: None,
            },
            &cache,
        );
        assert_eq!(code, EXIT_OK);
        assert_eq!(out.trim(), CacheKey::for_args(&(1, 2)).unwrap().as_str());
    }

    #[test]
    fn test_key_rejects_bad_json() {
        let temp = TempDir::new().unwrap();
        let cache = DiskCache::at(temp.path());
        let mut out = Vec::new();
        let err = run(
            &Command::Key {
                args: "[1,".to_string(),
                kwargs: None,
            },
            &cache,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, MemoError::InvalidInput(_)));
    }

    #[test]
    fn test_list_filters_by_function() {
        let temp = TempDir::new().unwrap();
        let cache = populated_cache(&temp);
        let (_, out) = run_to_string(
            Command::List {
                function: Some("add".to_string()),
                json: false,
            },
            &cache,
        );
        assert_eq!(out.lines().filter(|l| l.starts_with("add  ")).count(), 2);
        assert!(!out.contains("greet"));
        assert!(out.ends_with("2 cached result(s)\n"));
    }

    #[test]
    fn test_list_json() {
        let temp = TempDir::new().unwrap();
        let cache = populated_cache(&temp);
        let (_, out) = run_to_string(
            Command::List {
                function: None,
                json: true,
            },
            &cache,
        );
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_stats_summary() {
        let temp = TempDir::new().unwrap();
        let cache = populated_cache(&temp);
        let (_, out) = run_to_string(Command::Stats { json: false }, &cache);
        assert!(out.contains("  add: 2 result(s)"));
        assert!(out.contains("  greet: 1 result(s)"));
        assert!(out.contains("Total: 3 result(s)"));
    }

    #[test]
    fn test_show_and_clear() {
        let temp = TempDir::new().unwrap();
        let cache = populated_cache(&temp);
        let key = CacheKey::for_args(&("ada",)).unwrap();
        // greet takes a bare String, not a tuple
        let key_bare = CacheKey::for_args(&"ada").unwrap();
        assert_ne!(key, key_bare);

        let (code, out) = run_to_string(
            Command::Show {
                function: "greet".to_string(),
                key: key_bare.to_string(),
            },
            &cache,
        );
        assert_eq!(code, EXIT_OK);
        assert_eq!(out, "\"hello ada\"\n");

        let (code, _) = run_to_string(
            Command::Show {
                function: "greet".to_string(),
                key: key.to_string(),
            },
            &cache,
        );
        assert_eq!(code, EXIT_NOT_CACHED);

        let (_, out) = run_to_string(
            Command::Clear {
                function: Some("greet".to_string()),
            },
            &cache,
        );
        assert_eq!(out, "Removed 1 cached result(s)\n");
        assert_eq!(cache.entries().unwrap().len(), 2);
    }
}
