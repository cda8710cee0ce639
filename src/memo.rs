//! The memoizing wrapper
//!
//! [`Memoized`] pairs a function with a declared name and a [`DiskCache`].
//! Each call derives a [`CacheKey`] from its arguments; if an artifact for
//! `(name, key)` exists its value is returned without running the function,
//! otherwise the function runs and its result is stored.
//!
//! The wrapped function is assumed to be pure and deterministic. Nothing
//! guards against two callers racing on the same uncached arguments: both
//! run the function and the last write wins.

use crate::cache::DiskCache;
use crate::error::{MemoError, Result};
use crate::key::CacheKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::convert::Infallible;
use std::error::Error;
use std::path::PathBuf;
use tracing::debug;

/// A function whose results are cached on disk
#[derive(Debug, Clone)]
pub struct Memoized<F> {
    name: String,
    cache: DiskCache,
    func: F,
}

impl<F> Memoized<F> {
    /// Wrap `func` under `name`
    ///
    /// The name becomes the artifact filename prefix, so it must be
    /// non-empty and free of path separators.
    pub fn new(name: impl Into<String>, cache: DiskCache, func: F) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains(['/', '\\', '\0']) {
            return Err(MemoError::InvalidFunctionName(name));
        }
        Ok(Self { name, cache, func })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Key a call with these arguments would use
    pub fn key_for<A, K>(&self, args: &A, kwargs: &K) -> Result<CacheKey>
    where
        A: Serialize + ?Sized,
        K: Serialize + ?Sized,
    {
        CacheKey::derive(args, kwargs)
    }

    /// Artifact location for `key`
    pub fn artifact_path(&self, key: &CacheKey) -> PathBuf {
        self.cache.artifact_path(&self.name, key)
    }

    /// Whether a call with these arguments would be served from disk
    pub fn is_cached<A, K>(&self, args: &A, kwargs: &K) -> Result<bool>
    where
        A: Serialize + ?Sized,
        K: Serialize + ?Sized,
    {
        let key = self.key_for(args, kwargs)?;
        Ok(self.cache.contains(&self.name, &key))
    }

    /// Drop the cached result for these arguments, if any
    pub fn forget<A, K>(&self, args: &A, kwargs: &K) -> Result<bool>
    where
        A: Serialize + ?Sized,
        K: Serialize + ?Sized,
    {
        let key = self.key_for(args, kwargs)?;
        self.cache.remove(&self.name, &key)
    }

    /// Call with positional arguments only
    pub fn call<A, R>(&self, args: A) -> Result<R>
    where
        F: Fn(A) -> R,
        A: Serialize,
        R: Serialize + DeserializeOwned,
    {
        let key = CacheKey::for_args(&args)?;
        self.get_or_compute(&key, || Ok::<_, Infallible>((self.func)(args)))
    }

    /// Call with positional and named arguments
    pub fn call_with<A, K, R>(&self, args: A, kwargs: K) -> Result<R>
    where
        F: Fn(A, K) -> R,
        A: Serialize,
        K: Serialize,
        R: Serialize + DeserializeOwned,
    {
        let key = CacheKey::derive(&args, &kwargs)?;
        self.get_or_compute(&key, || Ok::<_, Infallible>((self.func)(args, kwargs)))
    }

    /// Call a fallible function with positional arguments
    ///
    /// An `Err` from the function is returned as [`MemoError::Function`]
    /// and nothing is cached.
    pub fn try_call<A, R, E>(&self, args: A) -> Result<R>
    where
        F: Fn(A) -> std::result::Result<R, E>,
        A: Serialize,
        R: Serialize + DeserializeOwned,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let key = CacheKey::for_args(&args)?;
        self.get_or_compute(&key, || (self.func)(args))
    }

    /// Call a fallible function with positional and named arguments
    pub fn try_call_with<A, K, R, E>(&self, args: A, kwargs: K) -> Result<R>
    where
        F: Fn(A, K) -> std::result::Result<R, E>,
        A: Serialize,
        K: Serialize,
        R: Serialize + DeserializeOwned,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let key = CacheKey::derive(&args, &kwargs)?;
        self.get_or_compute(&key, || (self.func)(args, kwargs))
    }

    fn get_or_compute<R, E>(
        &self,
        key: &CacheKey,
        compute: impl FnOnce() -> std::result::Result<R, E>,
    ) -> Result<R>
    where
        R: Serialize + DeserializeOwned,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        debug!(function = %self.name, %key, "Cache key");

        if let Some(hit) = self.cache.load(&self.name, key)? {
            debug!(function = %self.name, %key, "Cache hit");
            return Ok(hit);
        }

        debug!(function = %self.name, %key, "Cache miss, computing");
        let value = compute().map_err(|e| MemoError::Function(e.into()))?;
        self.cache.store(&self.name, key, &value)?;
        Ok(value)
    }
}

impl DiskCache {
    /// Wrap `func` under `name`, storing results in this cache
    pub fn memoize<F>(&self, name: impl Into<String>, func: F) -> Result<Memoized<F>> {
        Memoized::new(name, self.clone(), func)
    }
}

/// Wrap a named function, using its identifier as the artifact prefix
///
/// With only the function name, the function must take its positional
/// arguments as a single value (usually a tuple). Listing typed
/// parameters adapts an ordinary multi-argument function:
///
/// ```ignore
/// fn add(a: i64, b: i64) -> i64 { a + b }
///
/// let add = memoize!(cache, add(a: i64, b: i64))?;
/// assert_eq!(add.call((1, 2))?, 3);
/// ```
#[macro_export]
macro_rules! memoize {
    ($cache:expr, $func:ident) => {
        $crate::Memoized::new(stringify!($func), $cache, $func)
    };
    ($cache:expr, $func:ident ( $($arg:ident : $ty:ty),* $(,)? )) => {
        $crate::Memoized::new(
            stringify!($func),
            $cache,
            |($($arg,)*): ($($ty,)*)| $func($($arg),*),
        )
    };
}
