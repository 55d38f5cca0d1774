//! Fluent query builder compiling to a single parameterized Cypher statement.
//!
//! # Usage
//!
//! ```ignore
//! use neoquent::builder::{Clauses, Operator};
//!
//! let engineers = people
//!     .query()
//!     .where_eq("occupation", "Engineer")
//!     .where_op("age", Operator::Gte, 18)
//!     .order_by_desc("age")
//!     .limit(10)
//!     .get()
//!     .await?;
//!
//! let page = people.query().search("ali")?.paginate(15, 1).await?;
//! ```

mod clause;
mod compile;
mod page;
mod state;

use std::sync::Arc;

pub use clause::{Boolean, Clause, Direction, Operator, OrderBy, Predicate};
pub use compile::CompiledQuery;
pub use page::Page;
pub(crate) use page::page_window;
pub use state::{Clauses, QueryState};

use crate::error::AppError;
use crate::graph::{CypherExecutor, Query};
use crate::models::{Entity, Model};

/// A [`QueryState`] bound to a model and an executor.
///
/// Chain [`Clauses`] methods, then call a terminal operation. Each terminal
/// operation performs one round trip (`paginate` performs two).
pub struct QueryBuilder<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    model: Arc<Model>,
    state: QueryState,
}

impl<E: CypherExecutor + ?Sized> Clone for QueryBuilder<'_, E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor,
            model: self.model.clone(),
            state: self.state.clone(),
        }
    }
}

impl<E: CypherExecutor + ?Sized> Clauses for QueryBuilder<'_, E> {
    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }
}

impl<'a, E: CypherExecutor + ?Sized> QueryBuilder<'a, E> {
    pub fn new(executor: &'a E, model: Arc<Model>) -> Self {
        Self {
            executor,
            model,
            state: QueryState::default(),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Applies a state transformation inline.
    pub fn apply<F>(mut self, f: F) -> Self
    where
        F: FnOnce(QueryState) -> QueryState,
    {
        self.state = f(std::mem::take(&mut self.state));
        self
    }

    /// Applies the model's scope registered under `name`.
    pub fn scope(self, name: &str) -> Result<Self, AppError> {
        let scope = self
            .model
            .scope(name)
            .cloned()
            .ok_or_else(|| AppError::UnknownScope(format!("{}.{}", self.model.label(), name)))?;
        Ok(self.apply(|state| scope(state)))
    }

    /// Case-insensitive search over the model's default search fields.
    ///
    /// A blank term adds nothing. A non-blank term on a model without search
    /// fields is an [`AppError::InvalidArgument`] rather than a match-all.
    pub fn search(self, term: &str) -> Result<Self, AppError> {
        if self.model.search_fields().is_empty() && !term.trim().is_empty() {
            return Err(AppError::InvalidArgument(format!(
                "{} has no search fields",
                self.model.label()
            )));
        }
        let fields = self.model.search_fields().to_vec();
        Ok(self.search_in(term, fields))
    }

    pub fn to_select(&self) -> Result<CompiledQuery, AppError> {
        self.state.compile_select(self.model.label())
    }

    pub fn to_count(&self) -> Result<CompiledQuery, AppError> {
        self.state.compile_count(self.model.label())
    }

    /// Runs the query and maps every row to an entity.
    pub async fn get(self) -> Result<Vec<Entity>, AppError> {
        let compiled = self.to_select()?;
        let rows = Query::new(self.executor, compiled.cypher)
            .params(compiled.params)
            .fetch_all()
            .await?;

        rows.iter()
            .map(|row| Entity::from_row(self.model.clone(), row))
            .collect()
    }

    /// Runs the query with `LIMIT 1`.
    pub async fn first(self) -> Result<Option<Entity>, AppError> {
        Ok(self.limit(1).get().await?.into_iter().next())
    }

    pub async fn first_or_fail(self) -> Result<Entity, AppError> {
        let label = self.model.label().to_string();
        self.first().await?.ok_or(AppError::NotFound(label))
    }

    /// Counts matches, ignoring ordering and bounds.
    pub async fn count(self) -> Result<u64, AppError> {
        let compiled = self.to_count()?;
        let row = Query::new(self.executor, compiled.cypher)
            .params(compiled.params)
            .fetch_one()
            .await?;

        match row {
            Some(row) => row.get("count"),
            None => Ok(0),
        }
    }

    pub async fn exists(self) -> Result<bool, AppError> {
        Ok(self.count().await? > 0)
    }

    /// Fetches page `page` (1-based; `0` is treated as `1`) of `per_page` items.
    pub async fn paginate(self, per_page: u64, page: u64) -> Result<Page<Entity>, AppError> {
        let (skip, limit) = page_window(per_page, page)?;

        let total = self.clone().count().await?;
        let data = self.skip(skip).limit(limit).get().await?;

        Ok(Page::new(data, total, per_page, page.max(1)))
    }
}
