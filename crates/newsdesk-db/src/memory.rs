//! In-process persistence engine backing the [`Session`] trait.
//!
//! [`MemorySession`] keeps every collection as an id-ordered map of JSON
//! documents behind a [`parking_lot::RwLock`], so the thread-safety the
//! gateway delegates downward is handled here. Writes go through a pending
//! buffer the way a real persistence context would: `persist` pre-assigns
//! an identifier and buffers the row, `flush` applies the buffer (running
//! unique-constraint checks all-or-nothing), and `refresh` re-reads the
//! committed row to pick up generated state.
//!
//! Collections and named queries are registered up front through
//! [`MemorySessionBuilder`]; the row store itself is schemaless beyond
//! that.

use std::collections::{BTreeMap, BTreeSet};

use newsdesk_types::{RecordId, VersionToken};
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::DataError;
use crate::query::{
    Assignment, Filter, NamedQuery, Operand, Ordering, Page, Predicate, QueryParams,
    SortDirection, Statement, Test,
};
use crate::session::Session;

/// Query-name label used for ad-hoc statements in error messages.
const AD_HOC: &str = "(ad-hoc)";

// ---------------------------------------------------------------------------
// Collection registration
// ---------------------------------------------------------------------------

/// Registration of one collection: its name, which document fields hold the
/// session-managed identifier and version token, and any unique fields.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    name: String,
    id_field: String,
    version_field: String,
    unique_fields: Vec<String>,
}

impl CollectionSpec {
    /// Register a collection with the default `id`/`version` field names.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_field: "id".to_owned(),
            version_field: "version".to_owned(),
            unique_fields: Vec::new(),
        }
    }

    /// Override the document field holding the identifier.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Override the document field holding the version token.
    #[must_use]
    pub fn with_version_field(mut self, field: impl Into<String>) -> Self {
        self.version_field = field.into();
        self
    }

    /// Declare a field whose non-null values must be unique.
    #[must_use]
    pub fn with_unique_field(mut self, field: impl Into<String>) -> Self {
        self.unique_fields.push(field.into());
        self
    }

    /// The collection's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder assembling a [`MemorySession`]'s collections and named queries.
#[derive(Debug, Default)]
pub struct MemorySessionBuilder {
    specs: BTreeMap<String, CollectionSpec>,
    queries: BTreeMap<String, NamedQuery>,
}

impl MemorySessionBuilder {
    /// Register a collection.
    #[must_use]
    pub fn collection(mut self, spec: CollectionSpec) -> Self {
        self.specs.insert(spec.name.clone(), spec);
        self
    }

    /// Register a named query.
    #[must_use]
    pub fn named_query(mut self, name: impl Into<String>, query: NamedQuery) -> Self {
        self.queries.insert(name.into(), query);
        self
    }

    /// Finish building the session.
    pub fn build(self) -> MemorySession {
        tracing::info!(
            collections = self.specs.len(),
            named_queries = self.queries.len(),
            "Memory session ready"
        );
        MemorySession {
            specs: self.specs,
            queries: self.queries,
            state: RwLock::new(StoreState::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A buffered insert awaiting flush.
#[derive(Debug)]
struct PendingInsert {
    collection: String,
    id: i64,
    doc: Value,
}

/// Mutable store state: committed rows, the pending-insert buffer, and the
/// identifier sequence.
#[derive(Debug)]
struct StoreState {
    rows: BTreeMap<String, BTreeMap<i64, Value>>,
    pending: Vec<PendingInsert>,
    next_id: i64,
}

impl StoreState {
    const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }
}

/// An in-process [`Session`] implementation.
///
/// Collection and query registrations are immutable after build; row state
/// sits behind an [`RwLock`], making the session shareable across threads
/// by reference.
#[derive(Debug)]
pub struct MemorySession {
    specs: BTreeMap<String, CollectionSpec>,
    queries: BTreeMap<String, NamedQuery>,
    state: RwLock<StoreState>,
}

impl MemorySession {
    /// Start building a session.
    pub fn builder() -> MemorySessionBuilder {
        MemorySessionBuilder::default()
    }

    /// Resolve the id/version field names for a collection, falling back
    /// to the defaults for collections that were never registered.
    fn field_names(&self, collection: &str) -> (&str, &str) {
        self.specs.get(collection).map_or(("id", "version"), |spec| {
            (spec.id_field.as_str(), spec.version_field.as_str())
        })
    }

    /// Run a select over committed rows, returning matching clones.
    fn run_select(
        &self,
        collection: &str,
        filter: &Filter,
        ordering: Option<&Ordering>,
        params: &QueryParams,
        query_name: &str,
        page: Page,
    ) -> Result<Vec<Value>, DataError> {
        let mut out = Vec::new();
        {
            let state = self.state.read();
            if let Some(rows) = state.rows.get(collection) {
                for doc in rows.values() {
                    if filter_matches(doc, filter, params, query_name)? {
                        out.push(doc.clone());
                    }
                }
            }
        }
        if let Some(ordering) = ordering {
            sort_rows(&mut out, ordering);
        }
        Ok(page.apply(out))
    }

    /// Apply an update to all matching rows, all-or-nothing.
    fn run_update(
        &self,
        collection: &str,
        assignments: &[Assignment],
        filter: &Filter,
        params: &QueryParams,
        query_name: &str,
    ) -> Result<usize, DataError> {
        let mut state = self.state.write();
        let Some(existing) = state.rows.get(collection).cloned() else {
            return Ok(0);
        };

        let mut candidate = existing.clone();
        let mut affected = 0usize;
        for (id, doc) in &existing {
            if !filter_matches(doc, filter, params, query_name)? {
                continue;
            }
            let mut updated = doc.clone();
            if let Value::Object(fields) = &mut updated {
                for assignment in assignments {
                    let value = resolve(&assignment.operand, params, query_name)?.clone();
                    fields.insert(assignment.field.clone(), value);
                }
            }
            candidate.insert(*id, updated);
            affected = affected.saturating_add(1);
        }

        if affected > 0 {
            if let Some(spec) = self.specs.get(collection) {
                check_unique(spec, &candidate)?;
            }
            state.rows.insert(collection.to_owned(), candidate);
            tracing::debug!(collection, affected, query = query_name, "Executed update");
        }
        Ok(affected)
    }

    /// Remove all matching rows.
    fn run_delete(
        &self,
        collection: &str,
        filter: &Filter,
        params: &QueryParams,
        query_name: &str,
    ) -> Result<usize, DataError> {
        let mut state = self.state.write();
        let Some(rows) = state.rows.get_mut(collection) else {
            return Ok(0);
        };

        let mut doomed = Vec::new();
        for (id, doc) in rows.iter() {
            if filter_matches(doc, filter, params, query_name)? {
                doomed.push(*id);
            }
        }
        for id in &doomed {
            rows.remove(id);
        }
        if !doomed.is_empty() {
            tracing::debug!(
                collection,
                affected = doomed.len(),
                query = query_name,
                "Executed delete"
            );
        }
        Ok(doomed.len())
    }
}

impl Session for MemorySession {
    fn persist(&self, collection: &str, doc: Value) -> Result<RecordId, DataError> {
        let spec = self
            .specs
            .get(collection)
            .ok_or_else(|| DataError::UnknownCollection(collection.to_owned()))?;
        let Value::Object(mut fields) = doc else {
            return Err(DataError::NotAnObject {
                collection: collection.to_owned(),
            });
        };

        let mut state = self.state.write();
        let id = state.next_id;
        state.next_id = id.wrapping_add(1);
        fields.insert(spec.id_field.clone(), Value::from(id));
        state.pending.push(PendingInsert {
            collection: collection.to_owned(),
            id,
            doc: Value::Object(fields),
        });
        tracing::debug!(collection, id, "Buffered insert");
        Ok(RecordId(id))
    }

    fn flush(&self) -> Result<(), DataError> {
        let mut state = self.state.write();
        if state.pending.is_empty() {
            return Ok(());
        }
        // The buffer is consumed either way: a failed flush discards it,
        // the way a rolled-back persistence context would.
        let pending = core::mem::take(&mut state.pending);
        let count = pending.len();

        let mut candidates: BTreeMap<String, BTreeMap<i64, Value>> = BTreeMap::new();
        for insert in pending {
            let candidate = candidates
                .entry(insert.collection.clone())
                .or_insert_with(|| state.rows.get(&insert.collection).cloned().unwrap_or_default());
            let mut doc = insert.doc;
            if let (Value::Object(fields), Some(spec)) =
                (&mut doc, self.specs.get(&insert.collection))
            {
                fields.insert(
                    spec.version_field.clone(),
                    Value::from(VersionToken::INITIAL.into_inner()),
                );
            }
            candidate.insert(insert.id, doc);
        }

        for (collection, candidate) in &candidates {
            if let Some(spec) = self.specs.get(collection) {
                check_unique(spec, candidate)?;
            }
        }
        for (collection, candidate) in candidates {
            state.rows.insert(collection, candidate);
        }
        tracing::debug!(count, "Flushed pending inserts");
        Ok(())
    }

    fn refresh(&self, collection: &str, id: RecordId) -> Result<Value, DataError> {
        let state = self.state.read();
        state
            .rows
            .get(collection)
            .and_then(|rows| rows.get(&id.into_inner()))
            .cloned()
            .ok_or_else(|| DataError::not_found(collection, Some(id)))
    }

    fn find(&self, collection: &str, id: RecordId) -> Result<Option<Value>, DataError> {
        let state = self.state.read();
        Ok(state
            .rows
            .get(collection)
            .and_then(|rows| rows.get(&id.into_inner()))
            .cloned())
    }

    fn merge(&self, collection: &str, doc: Value) -> Result<Value, DataError> {
        let (id_field, version_field) = self.field_names(collection);
        let Value::Object(mut fields) = doc else {
            return Err(DataError::NotAnObject {
                collection: collection.to_owned(),
            });
        };
        let id = fields
            .get(id_field)
            .and_then(Value::as_i64)
            .ok_or_else(|| DataError::not_found(collection, None))?;

        let mut state = self.state.write();
        let stored_version = {
            let stored = state
                .rows
                .get(collection)
                .and_then(|rows| rows.get(&id))
                .ok_or_else(|| DataError::not_found(collection, Some(RecordId(id))))?;
            stored.get(version_field).and_then(Value::as_u64)
        };
        let incoming_version = fields.get(version_field).and_then(Value::as_u64);
        let current = match (stored_version, incoming_version) {
            (Some(stored), Some(incoming)) if stored == incoming => VersionToken(stored),
            _ => {
                return Err(DataError::ConcurrentModification {
                    collection: collection.to_owned(),
                    id: RecordId(id),
                });
            }
        };

        fields.insert(
            version_field.to_owned(),
            Value::from(current.next().into_inner()),
        );
        let merged = Value::Object(fields);

        let mut candidate = state.rows.get(collection).cloned().unwrap_or_default();
        candidate.insert(id, merged.clone());
        if let Some(spec) = self.specs.get(collection) {
            check_unique(spec, &candidate)?;
        }
        state.rows.insert(collection.to_owned(), candidate);
        tracing::debug!(collection, id, version = %current.next(), "Merged row");
        Ok(merged)
    }

    fn remove(&self, collection: &str, id: RecordId) -> Result<bool, DataError> {
        let mut state = self.state.write();
        let removed = state
            .rows
            .get_mut(collection)
            .is_some_and(|rows| rows.remove(&id.into_inner()).is_some());
        if removed {
            tracing::debug!(collection, id = id.into_inner(), "Removed row");
        }
        Ok(removed)
    }

    fn select(
        &self,
        collection: &str,
        ordering: Option<&Ordering>,
        page: Page,
    ) -> Result<Vec<Value>, DataError> {
        self.run_select(
            collection,
            &Filter::new(),
            ordering,
            &QueryParams::new(),
            collection,
            page,
        )
    }

    fn select_named(
        &self,
        name: &str,
        params: &QueryParams,
        page: Page,
    ) -> Result<Vec<Value>, DataError> {
        let query = self
            .queries
            .get(name)
            .ok_or_else(|| DataError::UnknownQuery(name.to_owned()))?;
        let NamedQuery::Select {
            collection,
            filter,
            ordering,
        } = query
        else {
            return Err(DataError::QueryKindMismatch {
                name: name.to_owned(),
                expected: "select",
            });
        };
        self.run_select(collection, filter, ordering.as_ref(), params, name, page)
    }

    fn execute_named(&self, name: &str, params: &QueryParams) -> Result<usize, DataError> {
        let query = self
            .queries
            .get(name)
            .ok_or_else(|| DataError::UnknownQuery(name.to_owned()))?;
        match query {
            NamedQuery::Select { .. } => Err(DataError::QueryKindMismatch {
                name: name.to_owned(),
                expected: "update or delete",
            }),
            NamedQuery::Update {
                collection,
                assignments,
                filter,
            } => self.run_update(collection, assignments, filter, params, name),
            NamedQuery::Delete { collection, filter } => {
                self.run_delete(collection, filter, params, name)
            }
        }
    }

    fn execute(&self, statement: &Statement) -> Result<usize, DataError> {
        let params = QueryParams::new();
        match statement {
            Statement::Update {
                collection,
                assignments,
                filter,
            } => self.run_update(collection, assignments, filter, &params, AD_HOC),
            Statement::Delete { collection, filter } => {
                self.run_delete(collection, filter, &params, AD_HOC)
            }
        }
    }

    fn count_non_null(&self, collection: &str, field: &str) -> Result<u64, DataError> {
        let state = self.state.read();
        let count = state.rows.get(collection).map_or(0, |rows| {
            rows.values()
                .filter(|doc| !field_of(doc, field).is_null())
                .count()
        });
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

// ---------------------------------------------------------------------------
// Evaluation helpers
// ---------------------------------------------------------------------------

/// Read a field of a document, treating absent fields as null.
fn field_of<'a>(doc: &'a Value, field: &str) -> &'a Value {
    const NULL: &Value = &Value::Null;
    doc.get(field).unwrap_or(NULL)
}

/// Resolve an operand against the bound parameters.
fn resolve<'a>(
    operand: &'a Operand,
    params: &'a QueryParams,
    query_name: &str,
) -> Result<&'a Value, DataError> {
    match operand {
        Operand::Value(value) => Ok(value),
        Operand::Param(name) => params.get(name).ok_or_else(|| DataError::MissingParameter {
            query: query_name.to_owned(),
            name: name.clone(),
        }),
    }
}

/// Evaluate a single predicate against a document.
fn predicate_matches(
    doc: &Value,
    predicate: &Predicate,
    params: &QueryParams,
    query_name: &str,
) -> Result<bool, DataError> {
    let actual = field_of(doc, &predicate.field);
    Ok(match &predicate.test {
        Test::Eq(operand) => actual == resolve(operand, params, query_name)?,
        Test::Ne(operand) => actual != resolve(operand, params, query_name)?,
        Test::Lt(operand) => compare_values(actual, resolve(operand, params, query_name)?).is_lt(),
        Test::Le(operand) => compare_values(actual, resolve(operand, params, query_name)?).is_le(),
        Test::Gt(operand) => compare_values(actual, resolve(operand, params, query_name)?).is_gt(),
        Test::Ge(operand) => compare_values(actual, resolve(operand, params, query_name)?).is_ge(),
        Test::Contains(operand) => {
            let needle = resolve(operand, params, query_name)?;
            match (actual.as_str(), needle.as_str()) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                _ => false,
            }
        }
        Test::IsNull => actual.is_null(),
        Test::IsNotNull => !actual.is_null(),
    })
}

/// Evaluate a filter (conjunction of predicates) against a document.
fn filter_matches(
    doc: &Value,
    filter: &Filter,
    params: &QueryParams,
    query_name: &str,
) -> Result<bool, DataError> {
    for predicate in filter.predicates() {
        if !predicate_matches(doc, predicate, params, query_name)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Total order over JSON values for sorting and range predicates.
///
/// Values of different types order by type rank (null, bool, number,
/// string, array, object); within a type, numbers compare numerically and
/// strings lexicographically. Arrays and objects are not ordered among
/// themselves.
fn compare_values(a: &Value, b: &Value) -> core::cmp::Ordering {
    const fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Number(left), Value::Number(right)) => {
            if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
                l.cmp(&r)
            } else {
                let l = left.as_f64().unwrap_or(f64::NAN);
                let r = right.as_f64().unwrap_or(f64::NAN);
                l.partial_cmp(&r).unwrap_or(core::cmp::Ordering::Equal)
            }
        }
        (Value::String(left), Value::String(right)) => left.cmp(right),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Verify the unique-field constraints of a collection against a candidate
/// row set. Null and absent values are exempt, matching the usual database
/// treatment of nullable unique columns.
fn check_unique(
    spec: &CollectionSpec,
    rows: &BTreeMap<i64, Value>,
) -> Result<(), DataError> {
    for field in &spec.unique_fields {
        let mut seen = BTreeSet::new();
        for doc in rows.values() {
            let value = field_of(doc, field);
            if value.is_null() {
                continue;
            }
            if !seen.insert(value.to_string()) {
                return Err(DataError::UniqueViolation {
                    collection: spec.name.clone(),
                    field: field.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Sort rows by a single field, stable within equal keys.
fn sort_rows(rows: &mut [Value], ordering: &Ordering) {
    rows.sort_by(|a, b| {
        let cmp = compare_values(field_of(a, &ordering.field), field_of(b, &ordering.field));
        match ordering.direction {
            SortDirection::Ascending => cmp,
            SortDirection::Descending => cmp.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn language_session() -> MemorySession {
        MemorySession::builder()
            .collection(CollectionSpec::new("Language").with_unique_field("code"))
            .build()
    }

    #[test]
    fn persist_is_invisible_until_flush() {
        let session = language_session();
        let id = session
            .persist("Language", json!({"name": "English", "code": "en"}))
            .ok();
        let Some(id) = id else {
            assert!(id.is_some());
            return;
        };
        assert_eq!(session.find("Language", id).ok(), Some(None));

        assert!(session.flush().is_ok());
        let found = session.find("Language", id).ok().flatten();
        assert_eq!(
            found.as_ref().and_then(|doc| doc.get("code")).cloned(),
            Some(json!("en"))
        );
    }

    #[test]
    fn flush_assigns_initial_version() {
        let session = language_session();
        let id = session
            .persist("Language", json!({"name": "English", "code": "en"}))
            .ok();
        assert!(session.flush().is_ok());
        let doc = id.and_then(|id| session.refresh("Language", id).ok());
        assert_eq!(
            doc.as_ref().and_then(|d| d.get("version")).cloned(),
            Some(json!(1))
        );
    }

    #[test]
    fn failed_flush_discards_the_buffer() {
        let session = language_session();
        let first = session.persist("Language", json!({"name": "English", "code": "en"}));
        let second = session.persist("Language", json!({"name": "Engelsk", "code": "en"}));
        assert!(first.is_ok());
        assert!(second.is_ok());

        let flushed = session.flush();
        assert!(matches!(flushed, Err(DataError::UniqueViolation { .. })));

        // Nothing was committed and nothing is left pending.
        assert!(session.flush().is_ok());
        let rows = session.select("Language", None, Page::ALL).ok();
        assert_eq!(rows.map(|r| r.len()), Some(0));
    }

    #[test]
    fn persist_rejects_unknown_collection() {
        let session = language_session();
        let result = session.persist("Outlet", json!({"name": "Wire"}));
        assert!(matches!(result, Err(DataError::UnknownCollection(_))));
    }

    #[test]
    fn merge_bumps_version_and_detects_staleness() {
        let session = language_session();
        let id = session
            .persist("Language", json!({"name": "English", "code": "en"}))
            .ok();
        assert!(session.flush().is_ok());
        let Some(id) = id else {
            assert!(id.is_some());
            return;
        };

        let merged = session.merge(
            "Language",
            json!({"id": id.into_inner(), "version": 1, "name": "English (UK)", "code": "en"}),
        );
        let version = merged
            .ok()
            .as_ref()
            .and_then(|doc| doc.get("version"))
            .cloned();
        assert_eq!(version, Some(json!(2)));

        // Replaying the original token is now stale.
        let stale = session.merge(
            "Language",
            json!({"id": id.into_inner(), "version": 1, "name": "English", "code": "en"}),
        );
        assert!(matches!(
            stale,
            Err(DataError::ConcurrentModification { .. })
        ));
    }

    #[test]
    fn delete_on_unknown_collection_affects_nothing() {
        let session = language_session();
        let affected = session.execute(&Statement::delete_from("Nowhere")).ok();
        assert_eq!(affected, Some(0));
    }

    #[test]
    fn compare_values_orders_within_and_across_types() {
        use core::cmp::Ordering as Cmp;
        assert_eq!(compare_values(&json!(1), &json!(2)), Cmp::Less);
        assert_eq!(compare_values(&json!("a"), &json!("b")), Cmp::Less);
        assert_eq!(compare_values(&json!(1.5), &json!(1)), Cmp::Greater);
        assert_eq!(compare_values(&Value::Null, &json!(0)), Cmp::Less);
        assert_eq!(compare_values(&json!(true), &json!(false)), Cmp::Greater);
    }
}
