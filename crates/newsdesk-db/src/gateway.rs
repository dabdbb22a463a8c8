//! The generic record access gateway.
//!
//! [`DataGateway`] gives business-logic components one uniform, typed
//! surface for persisting, retrieving, updating, deleting, and querying
//! any [`Record`] type, without writing engine-specific query code for the
//! common cases. It is a thin pass-through: every operation is a single
//! synchronous round trip against the injected [`Session`], which owns all
//! the valuable behavior (storage, identity, flush semantics, constraint
//! enforcement). The gateway holds no mutable state of its own and the
//! session handle is deliberately not re-exposed.
//!
//! Failure policy: no retries, no local recovery. `NotFound` and
//! `ConcurrentModification` surface as typed conditions; everything else
//! propagates from the session unchanged.

use newsdesk_types::{Record, RecordId};

use crate::error::DataError;
use crate::query::{Ordering, Page, QueryParams, SortDirection, Statement};
use crate::session::Session;

/// Uniform record access over an injected persistence [`Session`].
///
/// Plural queries that match nothing return an empty sequence; singular
/// lookups (`find_by_id`, `find_object_with_named_query`) treat the same
/// condition as [`DataError::NotFound`]. The asymmetry is deliberate.
#[derive(Debug)]
pub struct DataGateway<S: Session> {
    session: S,
}

impl<S: Session> DataGateway<S> {
    /// Wrap a persistence session.
    pub const fn new(session: S) -> Self {
        Self { session }
    }

    // -----------------------------------------------------------------------
    // Single-record operations
    // -----------------------------------------------------------------------

    /// Store a new record and return it with its generated state.
    ///
    /// Persists the record, forces an immediate flush, then refreshes from
    /// the store so the returned value carries the assigned identifier and
    /// version token.
    ///
    /// # Errors
    ///
    /// Constraint violations (e.g. [`DataError::UniqueViolation`]) are not
    /// caught or translated; they propagate to the caller.
    pub fn create<R: Record>(&self, record: &R) -> Result<R, DataError> {
        let doc = serde_json::to_value(record)?;
        let id = self.session.persist(R::COLLECTION, doc)?;
        self.session.flush()?;
        let refreshed = self.session.refresh(R::COLLECTION, id)?;
        tracing::debug!(collection = R::COLLECTION, %id, "Created record");
        Ok(serde_json::from_value(refreshed)?)
    }

    /// Find a record by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if `id` is `None` (checked before
    /// any store access) or if no matching row exists.
    pub fn find_by_id<R: Record>(&self, id: Option<RecordId>) -> Result<R, DataError> {
        let id = id.ok_or_else(|| DataError::not_found(R::COLLECTION, None))?;
        let doc = self
            .session
            .find(R::COLLECTION, id)?
            .ok_or_else(|| DataError::not_found(R::COLLECTION, Some(id)))?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Merge caller-supplied state over the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if the record has no identifier or
    /// no matching row exists, and [`DataError::ConcurrentModification`]
    /// if the record's version token is stale -- the conflict is surfaced,
    /// never silently retried.
    pub fn update<R: Record>(&self, record: &R) -> Result<R, DataError> {
        let id = record
            .id()
            .ok_or_else(|| DataError::not_found(R::COLLECTION, None))?;
        let doc = serde_json::to_value(record)?;
        let merged = self.session.merge(R::COLLECTION, doc)?;
        tracing::debug!(collection = R::COLLECTION, %id, "Updated record");
        Ok(serde_json::from_value(merged)?)
    }

    /// Remove a record by its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] if `id` is `None` or no matching
    /// row exists.
    pub fn delete<R: Record>(&self, id: Option<RecordId>) -> Result<(), DataError> {
        let id = id.ok_or_else(|| DataError::not_found(R::COLLECTION, None))?;
        if self.session.remove(R::COLLECTION, id)? {
            tracing::debug!(collection = R::COLLECTION, %id, "Deleted record");
            Ok(())
        } else {
            Err(DataError::not_found(R::COLLECTION, Some(id)))
        }
    }

    // -----------------------------------------------------------------------
    // Named queries
    // -----------------------------------------------------------------------

    /// Run a registered select query with no parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`] for an unregistered name; an
    /// empty result is an empty sequence, not an error.
    pub fn find_with_named_query<R: Record>(&self, name: &str) -> Result<Vec<R>, DataError> {
        self.find_with_named_query_paged(name, &QueryParams::new(), Page::ALL)
    }

    /// Run a registered select query, binding each parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`] or
    /// [`DataError::MissingParameter`]; an empty result is an empty
    /// sequence, not an error.
    pub fn find_with_named_query_params<R: Record>(
        &self,
        name: &str,
        params: &QueryParams,
    ) -> Result<Vec<R>, DataError> {
        self.find_with_named_query_paged(name, params, Page::ALL)
    }

    /// Run a registered select query windowed by `page`.
    ///
    /// The result is materialized into one in-memory ordered sequence,
    /// never a lazy cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`] or
    /// [`DataError::MissingParameter`]; an empty result is an empty
    /// sequence, not an error.
    pub fn find_with_named_query_paged<R: Record>(
        &self,
        name: &str,
        params: &QueryParams,
        page: Page,
    ) -> Result<Vec<R>, DataError> {
        let docs = self.session.select_named(name, params, page)?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(DataError::from))
            .collect()
    }

    /// Run a registered select query and return its first row.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] when the result set is empty --
    /// unlike the plural variants, which return an empty sequence.
    pub fn find_object_with_named_query<R: Record>(
        &self,
        name: &str,
        params: &QueryParams,
    ) -> Result<R, DataError> {
        let rows: Vec<R> = self.find_with_named_query_paged(name, params, Page::ALL)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DataError::not_found(R::COLLECTION, None))
    }

    // -----------------------------------------------------------------------
    // Whole-collection queries
    // -----------------------------------------------------------------------

    /// Return every record of a type.
    ///
    /// # Errors
    ///
    /// Propagates session failures; an empty collection is an empty
    /// sequence.
    pub fn find_all<R: Record>(&self) -> Result<Vec<R>, DataError> {
        self.find_all_inner(None, Page::ALL)
    }

    /// Return every record of a type, sorted by one field.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn find_all_sorted<R: Record>(
        &self,
        field: &str,
        direction: SortDirection,
    ) -> Result<Vec<R>, DataError> {
        self.find_all_inner(Some(Ordering::new(field, direction)), Page::ALL)
    }

    /// Return a window of the records of a type.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn find_all_paged<R: Record>(&self, page: Page) -> Result<Vec<R>, DataError> {
        self.find_all_inner(None, page)
    }

    /// Return a window of the records of a type, sorted by one field.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn find_all_sorted_paged<R: Record>(
        &self,
        field: &str,
        direction: SortDirection,
        page: Page,
    ) -> Result<Vec<R>, DataError> {
        self.find_all_inner(Some(Ordering::new(field, direction)), page)
    }

    fn find_all_inner<R: Record>(
        &self,
        ordering: Option<Ordering>,
        page: Page,
    ) -> Result<Vec<R>, DataError> {
        let docs = self.session.select(R::COLLECTION, ordering.as_ref(), page)?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(DataError::from))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutating queries and counts
    // -----------------------------------------------------------------------

    /// Run a registered update/delete query with no parameters and return
    /// the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`] or
    /// [`DataError::QueryKindMismatch`].
    pub fn execute_named_query(&self, name: &str) -> Result<usize, DataError> {
        self.session.execute_named(name, &QueryParams::new())
    }

    /// Run a registered update/delete query, binding each parameter by
    /// name, and return the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownQuery`],
    /// [`DataError::QueryKindMismatch`], or
    /// [`DataError::MissingParameter`].
    pub fn execute_named_query_params(
        &self,
        name: &str,
        params: &QueryParams,
    ) -> Result<usize, DataError> {
        self.session.execute_named(name, params)
    }

    /// Run an ad-hoc update/delete statement and return the number of
    /// affected rows.
    ///
    /// The caller is fully responsible for the statement's correctness:
    /// collection and field names are not validated, and names that exist
    /// nowhere simply affect zero rows.
    ///
    /// # Errors
    ///
    /// Propagates session failures (e.g. constraint violations).
    pub fn execute(&self, statement: &Statement) -> Result<usize, DataError> {
        self.session.execute(statement)
    }

    /// Count the records of a type whose `field` is non-null.
    ///
    /// # Errors
    ///
    /// Propagates session failures.
    pub fn count<R: Record>(&self, field: &str) -> Result<u64, DataError> {
        self.session.count_non_null(R::COLLECTION, field)
    }
}
