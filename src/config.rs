//! Configuration types for diskmemo

use std::path::{Path, PathBuf};

/// Subdirectory of the system temp dir used when no cache dir is configured
pub const DEFAULT_SUBDIR: &str = "rs_fn_cache";

/// Cache configuration, resolved once when a [`DiskCache`](crate::DiskCache) is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache directory (default: `<temp>/rs_fn_cache`)
    /// An empty path is treated the same as `None`
    pub cache_dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Configuration that uses exactly `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(dir.into()),
        }
    }

    /// Configuration under the default location, in a subfolder named `namespace`
    ///
    /// Keeps unrelated callers from sharing one flat default directory.
    pub fn namespaced(namespace: &str) -> Self {
        Self::with_dir(default_dir().join(namespace))
    }

    /// Returns the directory this configuration points at
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => default_dir(),
        }
    }
}

impl From<PathBuf> for CacheConfig {
    fn from(dir: PathBuf) -> Self {
        Self::with_dir(dir)
    }
}

impl From<&Path> for CacheConfig {
    fn from(dir: &Path) -> Self {
        Self::with_dir(dir)
    }
}

impl From<&str> for CacheConfig {
    fn from(dir: &str) -> Self {
        Self::with_dir(dir)
    }
}

impl From<String> for CacheConfig {
    fn from(dir: String) -> Self {
        Self::with_dir(dir)
    }
}

impl From<Option<PathBuf>> for CacheConfig {
    fn from(cache_dir: Option<PathBuf>) -> Self {
        Self { cache_dir }
    }
}

/// `<system temp dir>/rs_fn_cache`
pub fn default_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_SUBDIR)
}
