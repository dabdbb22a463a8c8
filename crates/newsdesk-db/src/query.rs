//! The structured query model.
//!
//! Queries are plain values, not strings: a [`NamedQuery`] is registered on
//! the session under a string key and later executed with a set of
//! [`QueryParams`], and a [`Statement`] is an ad-hoc update or delete built
//! inline at the call site. Both are made of the same parts -- a target
//! collection, a [`Filter`] of field predicates, and (for updates) a list
//! of assignments. Building queries as values instead of formatting query
//! text keeps field and collection names in one place and removes runtime
//! string parsing from the engine.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Parameters and paging
// ---------------------------------------------------------------------------

/// Named parameter bindings for a query, in binding order.
///
/// # Example
///
/// ```
/// use newsdesk_db::QueryParams;
///
/// let params = QueryParams::new().with("code", "en");
/// assert_eq!(params.get("code").and_then(|v| v.as_str()), Some("en"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    bindings: Vec<(String, Value)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind a parameter by name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.push((name.into(), value.into()));
        self
    }

    /// Look up a binding by name. Later bindings shadow earlier ones.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Return the number of bindings.
    pub const fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Return whether no parameters are bound.
    pub const fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// An offset/limit window over a result sequence.
///
/// `start == 0` means "from the beginning" and `limit == 0` means
/// "unbounded" -- the zero values are the identity window, [`Page::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Index of the first row to return.
    pub start: usize,
    /// Maximum number of rows to return; `0` for no bound.
    pub limit: usize,
}

impl Page {
    /// The identity window: every row, from the start.
    pub const ALL: Self = Self { start: 0, limit: 0 };

    /// Create a window starting at `start` returning at most `limit` rows.
    pub const fn new(start: usize, limit: usize) -> Self {
        Self { start, limit }
    }

    /// Apply the window to an already-ordered row sequence.
    pub fn apply<T>(self, rows: Vec<T>) -> Vec<T> {
        let take = if self.limit == 0 {
            usize::MAX
        } else {
            self.limit
        };
        rows.into_iter().skip(self.start).take(take).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::ALL
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Sort direction for an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Non-decreasing order of the sort field.
    Ascending,
    /// Non-increasing order of the sort field.
    Descending,
}

impl SortDirection {
    /// The direction token as it would appear in query text.
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A single-field ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    /// Name of the field to sort by.
    pub field: String,
    /// Direction to sort in.
    pub direction: SortDirection,
}

impl Ordering {
    /// Create an ordering clause.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// The right-hand side of a predicate: a named parameter or an inline value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Resolved against the [`QueryParams`] at execution time.
    Param(String),
    /// A value fixed when the query was built.
    Value(Value),
}

impl Operand {
    /// Reference a named parameter.
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Embed an inline value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }
}

/// The comparison a predicate applies to its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    /// Field equals the operand.
    Eq(Operand),
    /// Field differs from the operand.
    Ne(Operand),
    /// Field orders strictly before the operand.
    Lt(Operand),
    /// Field orders before or equal to the operand.
    Le(Operand),
    /// Field orders strictly after the operand.
    Gt(Operand),
    /// Field orders after or equal to the operand.
    Ge(Operand),
    /// Field is a string containing the operand as a substring.
    Contains(Operand),
    /// Field is null or absent.
    IsNull,
    /// Field is present and non-null.
    IsNotNull,
}

/// A single field predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    /// Name of the field under test.
    pub field: String,
    /// The comparison to apply.
    pub test: Test,
}

impl Predicate {
    /// Create a predicate on `field`.
    pub fn new(field: impl Into<String>, test: Test) -> Self {
        Self {
            field: field.into(),
            test,
        }
    }
}

/// A conjunction of predicates; the empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Add a predicate to the conjunction.
    #[must_use]
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// The predicates of the conjunction, in insertion order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

// ---------------------------------------------------------------------------
// Named queries
// ---------------------------------------------------------------------------

/// A field assignment applied by an update query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Name of the field to overwrite.
    pub field: String,
    /// The value (or parameter) to write.
    pub operand: Operand,
}

/// A precompiled query registered on the session under a string key.
///
/// Select queries are executed with `select_named` and return rows; update
/// and delete queries are executed with `execute_named` and return an
/// affected-row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedQuery {
    /// Returns the rows of `collection` matching `filter`.
    Select {
        /// Collection to read.
        collection: String,
        /// Row filter; empty matches everything.
        filter: Filter,
        /// Optional ordering of the result sequence.
        ordering: Option<Ordering>,
    },
    /// Overwrites fields of the rows of `collection` matching `filter`.
    Update {
        /// Collection to mutate.
        collection: String,
        /// Assignments applied to every matching row.
        assignments: Vec<Assignment>,
        /// Row filter; empty matches everything.
        filter: Filter,
    },
    /// Removes the rows of `collection` matching `filter`.
    Delete {
        /// Collection to mutate.
        collection: String,
        /// Row filter; empty matches everything.
        filter: Filter,
    },
}

impl NamedQuery {
    /// Start a select query over `collection`.
    pub fn select(collection: impl Into<String>) -> Self {
        Self::Select {
            collection: collection.into(),
            filter: Filter::new(),
            ordering: None,
        }
    }

    /// Start an update query over `collection`.
    pub fn update(collection: impl Into<String>) -> Self {
        Self::Update {
            collection: collection.into(),
            assignments: Vec::new(),
            filter: Filter::new(),
        }
    }

    /// Start a delete query over `collection`.
    pub fn delete(collection: impl Into<String>) -> Self {
        Self::Delete {
            collection: collection.into(),
            filter: Filter::new(),
        }
    }

    /// Add a predicate to the query's filter.
    #[must_use]
    pub fn filtered(mut self, predicate: Predicate) -> Self {
        match &mut self {
            Self::Select { filter, .. } | Self::Update { filter, .. } | Self::Delete { filter, .. } => {
                *filter = core::mem::take(filter).with(predicate);
            }
        }
        self
    }

    /// Set the result ordering. Has no effect on update/delete queries.
    #[must_use]
    pub fn ordered_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        if let Self::Select { ordering, .. } = &mut self {
            *ordering = Some(Ordering::new(field, direction));
        }
        self
    }

    /// Add a field assignment. Has no effect on select/delete queries.
    #[must_use]
    pub fn assigning(mut self, field: impl Into<String>, operand: Operand) -> Self {
        if let Self::Update { assignments, .. } = &mut self {
            assignments.push(Assignment {
                field: field.into(),
                operand,
            });
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Ad-hoc statements
// ---------------------------------------------------------------------------

/// An ad-hoc update or delete built at the call site.
///
/// The engine performs no validation of collection or field names: names
/// that exist nowhere simply match nothing, and the statement affects zero
/// rows. The caller is fully responsible for the statement's correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Overwrite fields of matching rows.
    Update {
        /// Collection to mutate.
        collection: String,
        /// Assignments applied to every matching row.
        assignments: Vec<Assignment>,
        /// Row filter; empty matches everything.
        filter: Filter,
    },
    /// Remove matching rows.
    Delete {
        /// Collection to mutate.
        collection: String,
        /// Row filter; empty matches everything.
        filter: Filter,
    },
}

impl Statement {
    /// Start an update statement over `collection`.
    pub fn update(collection: impl Into<String>) -> Self {
        Self::Update {
            collection: collection.into(),
            assignments: Vec::new(),
            filter: Filter::new(),
        }
    }

    /// Start a delete statement over `collection`.
    pub fn delete_from(collection: impl Into<String>) -> Self {
        Self::Delete {
            collection: collection.into(),
            filter: Filter::new(),
        }
    }

    /// Assign an inline value to a field. Has no effect on deletes.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Update { assignments, .. } = &mut self {
            assignments.push(Assignment {
                field: field.into(),
                operand: Operand::value(value),
            });
        }
        self
    }

    /// Add a predicate to the statement's filter.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        match &mut self {
            Self::Update { filter, .. } | Self::Delete { filter, .. } => {
                *filter = core::mem::take(filter).with(predicate);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_all_is_identity() {
        let rows = vec![1, 2, 3, 4, 5];
        assert_eq!(Page::ALL.apply(rows.clone()), rows);
    }

    #[test]
    fn page_applies_offset_then_limit() {
        let rows = vec![1, 2, 3, 4, 5];
        assert_eq!(Page::new(0, 2).apply(rows.clone()), vec![1, 2]);
        assert_eq!(Page::new(4, 2).apply(rows.clone()), vec![5]);
        assert_eq!(Page::new(2, 0).apply(rows), vec![3, 4, 5]);
    }

    #[test]
    fn sort_direction_tokens() {
        assert_eq!(SortDirection::Ascending.as_token(), "ASC");
        assert_eq!(SortDirection::Descending.as_token(), "DESC");
    }

    #[test]
    fn later_bindings_shadow_earlier_ones() {
        let params = QueryParams::new().with("code", "en").with("code", "da");
        assert_eq!(params.get("code").and_then(|v| v.as_str()), Some("da"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn named_query_builder_accumulates_parts() {
        let query = NamedQuery::select("Language")
            .filtered(Predicate::new("code", Test::Eq(Operand::param("code"))))
            .ordered_by("name", SortDirection::Ascending);
        assert!(matches!(query, NamedQuery::Select { .. }));
        if let NamedQuery::Select {
            collection,
            filter,
            ordering,
        } = query
        {
            assert_eq!(collection, "Language");
            assert_eq!(filter.predicates().len(), 1);
            assert_eq!(
                ordering,
                Some(Ordering::new("name", SortDirection::Ascending))
            );
        }
    }

    #[test]
    fn ordering_is_ignored_on_mutations() {
        let query = NamedQuery::delete("Language").ordered_by("name", SortDirection::Ascending);
        assert_eq!(query, NamedQuery::delete("Language"));
    }
}
