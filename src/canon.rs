//! Canonical value trees
//!
//! Any `Serialize` value can be captured as a [`Canon`] by encoding it to
//! MessagePack (structs as maps) and decoding the bytes back into this
//! tree. Map entries are then sorted by their encoded key, so two maps
//! with the same entries produce the same bytes whatever their iteration
//! order. Floats are kept bit-exact: NaN, infinities and nil stay distinct.

use crate::error::{MemoError, Result};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Canon {
    Nil,
    Bool(bool),
    /// Non-negative integers, whatever their source width or signedness
    UInt(u64),
    /// Negative integers only
    Int(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
    Seq(Vec<Canon>),
    Map(Vec<(Canon, Canon)>),
}

impl Canon {
    /// Capture `value` in canonical form
    pub(crate) fn capture<T: Serialize + ?Sized>(value: &T, context: &'static str) -> Result<Self> {
        let bytes =
            rmp_serde::to_vec_named(&value).map_err(|e| MemoError::serialization(context, e))?;
        let tree: Canon =
            rmp_serde::from_slice(&bytes).map_err(|e| MemoError::serialization(context, e))?;
        Ok(tree.sorted())
    }

    /// MessagePack encoding of the tree
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec(self).map_err(|e| MemoError::serialization("canonical value", e))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Canon::Nil => "nil",
            Canon::Bool(_) => "a boolean",
            Canon::UInt(_) | Canon::Int(_) => "an integer",
            Canon::F32(_) | Canon::F64(_) => "a float",
            Canon::Str(_) => "a string",
            Canon::Bin(_) => "bytes",
            Canon::Seq(_) => "a sequence",
            Canon::Map(_) => "a map",
        }
    }

    fn sorted(self) -> Self {
        match self {
            Canon::Seq(items) => Canon::Seq(items.into_iter().map(Canon::sorted).collect()),
            Canon::Map(entries) => {
                let mut entries: Vec<(Canon, Canon)> = entries
                    .into_iter()
                    .map(|(k, v)| (k.sorted(), v.sorted()))
                    .collect();
                // Encoding a Canon cannot fail; an empty sort key only affects order
                entries.sort_by_cached_key(|(k, _)| k.to_bytes().unwrap_or_default());
                Canon::Map(entries)
            }
            other => other,
        }
    }
}

impl Serialize for Canon {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Canon::Nil => serializer.serialize_unit(),
            Canon::Bool(b) => serializer.serialize_bool(*b),
            Canon::UInt(n) => serializer.serialize_u64(*n),
            Canon::Int(n) => serializer.serialize_i64(*n),
            Canon::F32(f) => serializer.serialize_f32(*f),
            Canon::F64(f) => serializer.serialize_f64(*f),
            Canon::Str(s) => serializer.serialize_str(s),
            Canon::Bin(b) => serializer.serialize_bytes(b),
            Canon::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Canon::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Canon {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(CanonVisitor)
    }
}

struct CanonVisitor;

impl<'de> Visitor<'de> for CanonVisitor {
    type Value = Canon;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any MessagePack value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Canon, E> {
        Ok(Canon::Nil)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Canon, E> {
        Ok(Canon::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Canon, D::Error> {
        Canon::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Canon, E> {
        Ok(Canon::Bool(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Canon, E> {
        Ok(Canon::UInt(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Canon, E> {
        Ok(match u64::try_from(v) {
            Ok(n) => Canon::UInt(n),
            Err(_) => Canon::Int(v),
        })
    }

    fn visit_f32<E: de::Error>(self, v: f32) -> std::result::Result<Canon, E> {
        Ok(Canon::F32(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Canon, E> {
        Ok(Canon::F64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Canon, E> {
        Ok(Canon::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Canon, E> {
        Ok(Canon::Str(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Canon, E> {
        Ok(Canon::Bin(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Canon, E> {
        Ok(Canon::Bin(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Canon, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Canon::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Canon, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(Canon::Map(entries))
    }
}
