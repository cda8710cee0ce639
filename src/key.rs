//! Cache key derivation
//!
//! A key is the hex-encoded SHA-256 digest of the call's positional and
//! named arguments. Arguments are first captured as a canonical tree (map
//! entries sorted at every depth, floats bit-exact) and encoded as
//! MessagePack, so map iteration order never leaks into the digest and
//! NaN, infinities and `None` never collide.

use crate::canon::Canon;
use crate::error::{MemoError, Result};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Length of a hex-encoded SHA-256 digest
pub const KEY_LEN: usize = 64;

/// Fingerprint of a call's arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for positional `args` and named `kwargs`
    ///
    /// `kwargs` must serialize to a map (a struct, a map type, [`Kwargs`])
    /// or to unit, which stands for "no named arguments".
    pub fn derive<A, K>(args: &A, kwargs: &K) -> Result<Self>
    where
        A: Serialize + ?Sized,
        K: Serialize + ?Sized,
    {
        let positional = Canon::capture(args, "positional arguments")?;
        let named = match Canon::capture(kwargs, "named arguments")? {
            Canon::Nil => Canon::Map(Vec::new()),
            map @ Canon::Map(_) => map,
            other => return Err(MemoError::InvalidKwargs { found: other.kind() }),
        };

        let bytes = Canon::Seq(vec![positional, named]).to_bytes()?;
        Ok(Self::from_digest(&bytes))
    }

    /// Key for a call that has no named arguments
    pub fn for_args<A: Serialize + ?Sized>(args: &A) -> Result<Self> {
        Self::derive(args, &())
    }

    /// Accept an existing hex key, e.g. one parsed out of an artifact filename
    pub fn parse(hex_key: &str) -> Option<Self> {
        let valid = hex_key.len() == KEY_LEN
            && hex_key
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex_key.to_string()))
    }

    /// The hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dynamically built named arguments
///
/// Useful when the call site has heterogeneous named values and no struct
/// to describe them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kwargs(BTreeMap<String, Canon>);

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named argument, failing if the value cannot be serialized
    pub fn arg(mut self, name: impl Into<String>, value: impl Serialize) -> Result<Self> {
        let value = Canon::capture(&value, "named arguments")?;
        self.0.insert(name.into(), value);
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Kwargs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
