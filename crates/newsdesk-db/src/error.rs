//! Error types for the data layer.
//!
//! All failures surface as [`DataError`]. The gateway performs no retries
//! and no local recovery: `NotFound` and `ConcurrentModification` are the
//! typed conditions callers are expected to match on, everything else is a
//! persistence-layer failure propagated unchanged.

use newsdesk_types::RecordId;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A lookup, delete, or first-of-query found no matching record.
    ///
    /// Also raised before any store access when a lookup or delete is
    /// given no identifier at all (`id` is `None` in that case).
    #[error("{collection} with id {} not found", .id.map_or_else(|| "<none>".to_owned(), |i| i.to_string()))]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Identifier that was looked up, if one was supplied.
        id: Option<RecordId>,
    },

    /// An update carried a stale version token.
    ///
    /// The record was modified by someone else since it was read. This is
    /// surfaced to the caller and never silently retried.
    #[error("concurrent modification of {collection} with id {id}")]
    ConcurrentModification {
        /// Collection of the contested record.
        collection: String,
        /// Identifier of the contested record.
        id: RecordId,
    },

    /// A named query was referenced that is not registered.
    #[error("unknown named query: {0}")]
    UnknownQuery(String),

    /// A named query was registered for a different kind of execution.
    #[error("named query {name} is not a {expected} query")]
    QueryKindMismatch {
        /// Name of the misused query.
        name: String,
        /// The kind of query the call site required.
        expected: &'static str,
    },

    /// A query predicate referenced a parameter that was not bound.
    #[error("query {query} is missing parameter :{name}")]
    MissingParameter {
        /// Name of the query being executed.
        query: String,
        /// Name of the unbound parameter.
        name: String,
    },

    /// A write would duplicate a value in a unique field.
    #[error("duplicate value for unique field {collection}.{field}")]
    UniqueViolation {
        /// Collection the constraint belongs to.
        collection: String,
        /// The unique field that was violated.
        field: String,
    },

    /// A record was persisted into a collection the session does not know.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// A record serialized to something other than a JSON object.
    #[error("record for {collection} did not serialize to an object")]
    NotAnObject {
        /// Collection the malformed record was destined for.
        collection: String,
    },

    /// A record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DataError {
    /// Build a [`DataError::NotFound`] for the given collection and id.
    pub(crate) fn not_found(collection: &str, id: Option<RecordId>) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_with_and_without_id() {
        let with_id = DataError::not_found("Language", Some(RecordId(3)));
        assert_eq!(with_id.to_string(), "Language with id 3 not found");

        let without_id = DataError::not_found("Language", None);
        assert_eq!(without_id.to_string(), "Language with id <none> not found");
    }

    #[test]
    fn unique_violation_names_the_field() {
        let err = DataError::UniqueViolation {
            collection: "Language".to_owned(),
            field: "code".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate value for unique field Language.code"
        );
    }
}
