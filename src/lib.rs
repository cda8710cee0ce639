//! diskmemo - Disk-backed memoization for pure functions
//!
//! Wrap a deterministic function once, and every later call with the same
//! arguments is answered from a file instead of being recomputed:
//!
//! ```no_run
//! use diskmemo::{CacheConfig, DiskCache};
//!
//! # fn main() -> diskmemo::Result<()> {
//! let cache = DiskCache::new(&CacheConfig::with_dir("/tmp/fn_cache"));
//! let add = cache.memoize("add", |(a, b): (i64, i64)| a + b)?;
//!
//! assert_eq!(add.call((1, 2))?, 3); // computed, stored as add_<key>.msgpack
//! assert_eq!(add.call((1, 2))?, 3); // read back from disk
//! # Ok(())
//! # }
//! ```
//!
//! There is no expiry, no size bound and no locking. Artifacts stay until
//! something removes them.

pub mod cache;
mod canon;
pub mod config;
pub mod error;
pub mod key;
pub mod memo;

pub use cache::{CacheEntryInfo, CacheStats, DiskCache};
pub use config::CacheConfig;
pub use error::{MemoError, Result};
pub use key::{CacheKey, Kwargs};
pub use memo::Memoized;
