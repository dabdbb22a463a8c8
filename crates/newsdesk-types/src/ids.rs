//! Identifier and version-token newtypes.
//!
//! Record identifiers are assigned by the persistence session at persist
//! time (sequence-style allocation), so an unsaved record has no identifier
//! yet -- entities carry `Option<RecordId>`. Version tokens are managed
//! entirely by the session: `1` on first flush, bumped on every successful
//! merge. Callers treat both as opaque.

use serde::{Deserialize, Serialize};

/// Unique identifier of a persisted record within its collection.
///
/// Wraps the store-assigned sequence value. An identifier is only
/// meaningful together with the collection it was assigned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Return the inner sequence value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for RecordId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RecordId> for i64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Opaque optimistic-concurrency token carried by every persisted record.
///
/// A merge whose token does not match the stored token fails with a
/// concurrent-modification error instead of silently overwriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionToken(pub u64);

impl VersionToken {
    /// The token assigned to a record on its first flush.
    pub const INITIAL: Self = Self(1);

    /// Return the token a successful merge advances to.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Return the inner counter value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VersionToken {
    fn from(version: u64) -> Self {
        Self(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_roundtrip_serde() {
        let original = RecordId(42);
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("42"));
        let restored: Result<RecordId, _> = serde_json::from_str("42");
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn record_id_display_matches_inner() {
        let id = RecordId(7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn version_token_advances() {
        let first = VersionToken::INITIAL;
        assert_eq!(first.into_inner(), 1);
        assert_eq!(first.next(), VersionToken(2));
    }
}
