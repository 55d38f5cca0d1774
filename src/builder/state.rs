//! Accumulated query intent and the fluent methods that append to it.

use serde_json::Value as JsonValue;

use crate::builder::clause::{Boolean, Clause, Direction, Operator, OrderBy, Predicate};

/// Filter, sort and pagination intent, independent of any executor.
///
/// Append-only: clauses are never removed, and their order is the order they
/// are emitted in. `limit` and `skip` are last-write-wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub(crate) wheres: Vec<Clause>,
    pub(crate) orders: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) skip: Option<u64>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wheres(&self) -> &[Clause] {
        &self.wheres
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn skip_value(&self) -> Option<u64> {
        self.skip
    }
}

/// Fluent clause methods shared by [`QueryState`] and
/// [`QueryBuilder`](crate::builder::QueryBuilder).
///
/// Every method consumes the receiver and returns it with one more clause, so
/// named scopes (pure `QueryState -> QueryState` functions) and builders chain
/// the same way.
pub trait Clauses: Sized {
    fn state_mut(&mut self) -> &mut QueryState;

    /// Appends a raw clause.
    fn push_clause(mut self, boolean: Boolean, predicate: Predicate) -> Self {
        self.state_mut().wheres.push(Clause { boolean, predicate });
        self
    }

    fn condition(
        self,
        boolean: Boolean,
        field: &str,
        operator: Operator,
        value: JsonValue,
    ) -> Self {
        self.push_clause(
            boolean,
            Predicate::Condition {
                field: field.to_string(),
                operator,
                value,
            },
        )
    }

    /// `field = value`.
    fn where_eq(self, field: &str, value: impl Into<JsonValue>) -> Self {
        self.condition(Boolean::And, field, Operator::Eq, value.into())
    }

    fn where_op(self, field: &str, operator: Operator, value: impl Into<JsonValue>) -> Self {
        self.condition(Boolean::And, field, operator, value.into())
    }

    /// `OR field = value`, binding only to the preceding clause.
    fn or_where_eq(self, field: &str, value: impl Into<JsonValue>) -> Self {
        self.condition(Boolean::Or, field, Operator::Eq, value.into())
    }

    fn or_where_op(self, field: &str, operator: Operator, value: impl Into<JsonValue>) -> Self {
        self.condition(Boolean::Or, field, operator, value.into())
    }

    /// Membership in a literal list, bound as a single list parameter.
    fn where_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        let list = JsonValue::Array(values.into_iter().map(Into::into).collect());
        self.condition(Boolean::And, field, Operator::In, list)
    }

    fn where_not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        let list = JsonValue::Array(values.into_iter().map(Into::into).collect());
        self.condition(Boolean::And, field, Operator::NotIn, list)
    }

    fn where_null(self, field: &str) -> Self {
        self.condition(Boolean::And, field, Operator::IsNull, JsonValue::Null)
    }

    fn where_not_null(self, field: &str) -> Self {
        self.condition(Boolean::And, field, Operator::IsNotNull, JsonValue::Null)
    }

    fn or_where_null(self, field: &str) -> Self {
        self.condition(Boolean::Or, field, Operator::IsNull, JsonValue::Null)
    }

    /// `AND ( ... )`: the closure's clauses are emitted in parentheses.
    ///
    /// Only the closure's WHERE clauses are kept; ordering and bounds set
    /// inside it are ignored.
    fn where_group<F>(self, group: F) -> Self
    where
        F: FnOnce(QueryState) -> QueryState,
    {
        let inner = group(QueryState::default()).wheres;
        self.push_clause(Boolean::And, Predicate::Group(inner))
    }

    fn or_where_group<F>(self, group: F) -> Self
    where
        F: FnOnce(QueryState) -> QueryState,
    {
        let inner = group(QueryState::default()).wheres;
        self.push_clause(Boolean::Or, Predicate::Group(inner))
    }

    /// One case-insensitive containment clause per field, AND-combined.
    ///
    /// A blank term or an empty field list adds nothing; callers that need a
    /// field set checked use [`QueryBuilder::search`](crate::builder::QueryBuilder::search).
    fn search_in<I, S>(self, term: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let term = term.trim();
        if term.is_empty() {
            return self;
        }
        fields.into_iter().fold(self, |q, field| {
            q.where_op(field.as_ref(), Operator::SearchCi, term)
        })
    }

    fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.state_mut().orders.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    fn order_by_desc(self, field: &str) -> Self {
        self.order_by(field, Direction::Desc)
    }

    fn limit(mut self, n: u64) -> Self {
        self.state_mut().limit = Some(n);
        self
    }

    /// Alias for [`limit`](Clauses::limit).
    fn take(self, n: u64) -> Self {
        self.limit(n)
    }

    fn skip(mut self, n: u64) -> Self {
        self.state_mut().skip = Some(n);
        self
    }
}

impl Clauses for QueryState {
    fn state_mut(&mut self) -> &mut QueryState {
        self
    }
}
