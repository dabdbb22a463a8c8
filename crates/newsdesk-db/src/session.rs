//! The persistence session trait.
//!
//! A [`Session`] is the external collaborator that owns storage, identity,
//! and flush semantics. The gateway is generic over it and delegates every
//! round trip to it; the data layer itself keeps no cross-call mutable
//! state. Thread safety is likewise the session's concern -- in typical
//! deployments the hosting runtime scopes one session per request.
//!
//! Records cross this boundary as JSON documents ([`serde_json::Value`]
//! objects) keyed by collection name, so the session stays untyped while
//! the gateway above it stays generic.

use newsdesk_types::RecordId;
use serde_json::Value;

use crate::error::DataError;
use crate::query::{Ordering, Page, QueryParams, Statement};

/// A persistence session: storage, identity, and flush semantics.
///
/// Writes go through a pending buffer: [`persist`] pre-assigns an
/// identifier and buffers the insert, [`flush`] applies everything buffered
/// (this is where constraint checks happen), and [`refresh`] re-reads
/// committed state to pick up generated fields.
///
/// [`persist`]: Session::persist
/// [`flush`]: Session::flush
/// [`refresh`]: Session::refresh
pub trait Session {
    /// Buffer a new document for insertion and pre-assign its identifier.
    ///
    /// The document is not visible to reads until [`Session::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownCollection`] if the collection was never
    /// registered, or [`DataError::NotAnObject`] if the document is not a
    /// JSON object.
    fn persist(&self, collection: &str, doc: Value) -> Result<RecordId, DataError>;

    /// Apply all buffered inserts to the committed store.
    ///
    /// All-or-nothing: if any buffered insert violates a constraint, none
    /// of them are applied and the buffer is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UniqueViolation`] if a buffered insert
    /// duplicates a unique field value.
    fn flush(&self) -> Result<(), DataError>;

    /// Re-read the committed document with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if no committed row has this id.
    fn refresh(&self, collection: &str, id: RecordId) -> Result<Value, DataError>;

    /// Read the committed document with the given identifier, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only for underlying store failures; a missing row
    /// is `Ok(None)`.
    fn find(&self, collection: &str, id: RecordId) -> Result<Option<Value>, DataError>;

    /// Merge a document over the committed row with the same identifier.
    ///
    /// The merge is conditional on the document's version token matching
    /// the stored one; on success the stored row is overwritten and the
    /// token advanced. Returns the post-merge document.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if no committed row has the
    /// document's id, [`DataError::ConcurrentModification`] if the version
    /// token is stale, or [`DataError::UniqueViolation`] if the merged
    /// state duplicates a unique field value.
    fn merge(&self, collection: &str, doc: Value) -> Result<Value, DataError>;

    /// Remove the committed row with the given identifier.
    ///
    /// Returns whether a row was actually removed.
    ///
    /// # Errors
    ///
    /// Returns an error only for underlying store failures.
    fn remove(&self, collection: &str, id: RecordId) -> Result<bool, DataError>;

    /// Return the rows of a collection, optionally ordered, windowed by
    /// `page`, materialized into one in-memory sequence.
    ///
    /// An unknown collection yields an empty sequence, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for underlying store failures.
    fn select(
        &self,
        collection: &str,
        ordering: Option<&Ordering>,
        page: Page,
    ) -> Result<Vec<Value>, DataError>;

    /// Execute a registered select query, binding each parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`] if no query is registered under
    /// `name`, [`DataError::QueryKindMismatch`] if the registered query is
    /// an update or delete, or [`DataError::MissingParameter`] if a
    /// predicate references an unbound parameter.
    fn select_named(
        &self,
        name: &str,
        params: &QueryParams,
        page: Page,
    ) -> Result<Vec<Value>, DataError>;

    /// Execute a registered update or delete query and return the number
    /// of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`], [`DataError::QueryKindMismatch`]
    /// (for select queries), [`DataError::MissingParameter`], or
    /// [`DataError::UniqueViolation`] if an update duplicates a unique
    /// field value.
    fn execute_named(&self, name: &str, params: &QueryParams) -> Result<usize, DataError>;

    /// Execute an ad-hoc statement and return the number of affected rows.
    ///
    /// No name validation is performed: an unknown collection or field
    /// simply matches nothing and affects zero rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingParameter`] if the statement references
    /// a parameter (statements carry no bindings), or
    /// [`DataError::UniqueViolation`] for constraint-violating updates.
    fn execute(&self, statement: &Statement) -> Result<usize, DataError>;

    /// Count the rows of `collection` whose `field` is present and
    /// non-null.
    ///
    /// # Errors
    ///
    /// Returns an error only for underlying store failures.
    fn count_non_null(&self, collection: &str, field: &str) -> Result<u64, DataError>;
}
