//! The execution port through which compiled statements reach the database.

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher statements against a graph database.
///
/// This is the only capability the mapper and query builder consume. It is
/// injected by the caller; nothing in this crate resolves an executor from
/// global state. Implementations own connection handling, retries and
/// timeouts.
///
/// Statements only ever interpolate labels, field names and relationship
/// types (all validated identifiers). Values always travel in `params`.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a statement and returns a stream of result rows.
    ///
    /// A statement that matches nothing yields an empty stream, not an error.
    ///
    /// # Arguments
    ///
    /// * `cypher` - The Cypher statement
    /// * `params` - Parameters to bind to the statement
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a statement without returning results.
    ///
    /// Use this for mutations whose rows nobody reads (DELETE, SET).
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

#[async_trait]
impl<E: CypherExecutor + ?Sized> CypherExecutor for std::sync::Arc<E> {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        (**self).execute_cypher(cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        (**self).run_cypher(cypher, params).await
    }
}
