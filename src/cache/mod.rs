//! On-disk artifact storage
//!
//! Every memoized result lives in its own file, `<function>_<key>.msgpack`,
//! directly inside the configured cache directory. Artifacts are never
//! rewritten or expired; removal is always an explicit action.

mod storage;

pub use storage::{CacheEntryInfo, CacheStats, DiskCache, ARTIFACT_EXT};
