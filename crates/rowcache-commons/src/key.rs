//! Canonical cache key for a primary-key value tuple.
//!
//! A `RowKey` is the type-tagged, length-prefixed byte encoding of the
//! primary-key values of one row. Table identity is deliberately NOT part of
//! the encoding: the row store scopes keys by table shard, so a rename moves
//! keys wholesale without re-deriving them.

use std::fmt;

/// Canonical, hashable encoding of a primary-key value tuple.
///
/// Construction goes through the key codec, which enforces type agreement
/// between declared column types and supplied values; `RowKey` itself is an
/// opaque byte container.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RowKey(Vec<u8>);

impl RowKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}
