//! Cache storage implementation

use crate::config::CacheConfig;
use crate::error::{MemoError, Result};
use crate::key::CacheKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Artifact file extension
pub const ARTIFACT_EXT: &str = "msgpack";

/// A stored artifact found in the cache directory
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CacheEntryInfo {
    /// Declared name of the function that produced it
    pub function: String,
    /// Argument fingerprint
    pub key: String,
    /// Full path of the artifact file
    pub path: PathBuf,
    /// File size on disk
    pub size_bytes: u64,
}

/// Aggregate numbers for a cache directory
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    /// Per function name: (entries, bytes)
    pub by_function: BTreeMap<String, (usize, u64)>,
}

/// Handle on one resolved cache directory
///
/// The directory is not created until the first artifact is stored.
#[derive(Debug, Clone)]
pub struct DiskCache {
    /// Directory where artifacts are stored
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Create a DiskCache for the given configuration
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache_dir: config.resolve_dir(),
        }
    }

    /// Shorthand for a cache rooted at exactly `dir`
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self::new(&CacheConfig::with_dir(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `<dir>/<function>_<key>.msgpack`
    pub fn artifact_path(&self, function: &str, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{}_{}.{}", function, key, ARTIFACT_EXT))
    }

    /// Load the artifact for `(function, key)`
    ///
    /// Returns `Ok(None)` when no artifact exists. A present but unreadable
    /// artifact is an error, never a miss.
    pub fn load<R: DeserializeOwned>(&self, function: &str, key: &CacheKey) -> Result<Option<R>> {
        let path = self.artifact_path(function, key);

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MemoError::filesystem(path, e)),
        };

        let reader = BufReader::new(file);
        let value = rmp_serde::from_read(reader).map_err(|source| {
            MemoError::Deserialization {
                path: path.clone(),
                source,
            }
        })?;

        debug!(function = %function, %key, path = %path.display(), "Loaded cached result");
        Ok(Some(value))
    }

    /// Store `value` as the artifact for `(function, key)`
    ///
    /// The value is encoded as MessagePack (structs as maps), written to a
    /// temporary file in the cache directory, synced and renamed into place,
    /// so a reader sees either no artifact or a whole one.
    pub fn store<R: Serialize + ?Sized>(
        &self,
        function: &str,
        key: &CacheKey,
        value: &R,
    ) -> Result<PathBuf> {
        // Serialize first: a failure here must leave nothing on disk
        let bytes = rmp_serde::to_vec_named(value)
            .map_err(|e| MemoError::serialization("return value", e))?;

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| MemoError::filesystem(&self.cache_dir, e))?;

        let path = self.artifact_path(function, key);
        let tmp = NamedTempFile::new_in(&self.cache_dir)
            .map_err(|e| MemoError::filesystem(&self.cache_dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            writer
                .write_all(&bytes)
                .and_then(|_| writer.flush())
                .map_err(|e| MemoError::filesystem(tmp.path(), e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| MemoError::filesystem(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| MemoError::filesystem(&path, e.error))?;

        debug!(function = %function, %key, path = %path.display(), "Stored result");
        Ok(path)
    }

    /// Whether an artifact for `(function, key)` exists
    pub fn contains(&self, function: &str, key: &CacheKey) -> bool {
        self.artifact_path(function, key).is_file()
    }

    /// Remove the artifact for `(function, key)`; returns whether one existed
    pub fn remove(&self, function: &str, key: &CacheKey) -> Result<bool> {
        let path = self.artifact_path(function, key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(function = %function, %key, "Removed cached result");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MemoError::filesystem(path, e)),
        }
    }

    /// List all artifacts, sorted by function name then key
    ///
    /// Files that do not look like artifacts are skipped. A cache directory
    /// that does not exist yet lists as empty.
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        let read_dir = match fs::read_dir(&self.cache_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MemoError::filesystem(&self.cache_dir, e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| MemoError::filesystem(&self.cache_dir, e))?;
            let path = entry.path();
            let Some((function, key)) = parse_artifact_name(&path) else {
                continue;
            };
            let metadata = entry
                .metadata()
                .map_err(|e| MemoError::filesystem(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(CacheEntryInfo {
                function,
                key,
                path,
                size_bytes: metadata.len(),
            });
        }

        entries.sort_by(|a, b| (&a.function, &a.key).cmp(&(&b.function, &b.key)));
        Ok(entries)
    }

    /// Remove all artifacts, or only those of `function`
    ///
    /// Returns the number of artifacts removed. Other files in the
    /// directory are left alone.
    pub fn clear(&self, function: Option<&str>) -> Result<usize> {
        let mut removed = 0;
        for entry in self.entries()? {
            if function.is_some_and(|f| f != entry.function) {
                continue;
            }
            match fs::remove_file(&entry.path) {
                Ok(()) => removed += 1,
                // Someone else got there first
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %entry.path.display(), "Artifact vanished during clear");
                }
                Err(e) => return Err(MemoError::filesystem(&entry.path, e)),
            }
        }
        debug!(removed = removed, dir = %self.cache_dir.display(), "Cleared cache");
        Ok(removed)
    }

    /// Count artifacts and bytes, overall and per function
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        for entry in self.entries()? {
            stats.entries += 1;
            stats.total_bytes += entry.size_bytes;
            let slot = stats.by_function.entry(entry.function).or_default();
            slot.0 += 1;
            slot.1 += entry.size_bytes;
        }
        Ok(stats)
    }

    /// Read a stored artifact as an untyped JSON value
    ///
    /// Non-finite floats have no JSON form and come back as `null`.
    pub fn load_raw(&self, function: &str, key: &CacheKey) -> Result<Option<serde_json::Value>> {
        self.load(function, key)
    }
}

/// Split `<function>_<key>.msgpack` into its parts
///
/// The key is the fixed-length suffix, so function names may themselves
/// contain underscores.
fn parse_artifact_name(path: &Path) -> Option<(String, String)> {
    if path.extension()? != ARTIFACT_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (function, key) = stem.rsplit_once('_')?;
    if function.is_empty() {
        return None;
    }
    let key = CacheKey::parse(key)?;
    Some((function.to_string(), key.as_str().to_string()))
}
