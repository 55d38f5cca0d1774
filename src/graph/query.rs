//! Raw statement builder for hand-written Cypher.

use futures::{StreamExt, TryStreamExt};
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A builder for binding parameters to a Cypher statement and executing it.
///
/// The mapper uses this for its fixed statements (create, find by id, update,
/// delete, relationships); the query builder uses it to dispatch compiled
/// statements.
///
/// # Example
///
/// ```ignore
/// let rows = Query::new(&client, "MATCH (n:Person) WHERE id(n) = $id RETURN n")
///     .param("id", 42)
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    cypher: String,
    params: Params,
}

impl<'a, E: CypherExecutor + ?Sized> Query<'a, E> {
    /// Creates a new statement builder.
    pub fn new(executor: &'a E, cypher: impl Into<String>) -> Self {
        Self {
            executor,
            cypher: cypher.into(),
            params: Params::new(),
        }
    }

    /// Binds a single parameter, referenced in Cypher as `$name`.
    pub fn param(mut self, name: &str, value: impl Into<JsonValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Binds every parameter in `params`, replacing same-named ones.
    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// The statement text.
    pub fn cypher(&self) -> &str {
        &self.cypher
    }

    /// Executes the statement and returns a stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        tracing::debug!(cypher = %self.cypher, params = self.params.len(), "executing cypher");
        self.executor
            .execute_cypher(&self.cypher, self.params)
            .await
    }

    /// Executes the statement and collects all rows into a vector.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the statement and returns the first row, if any.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let mut stream = self.execute().await?;
        stream.next().await.transpose()
    }

    /// Executes the statement without reading results.
    pub async fn run(self) -> Result<(), AppError> {
        tracing::debug!(cypher = %self.cypher, params = self.params.len(), "running cypher");
        self.executor.run_cypher(&self.cypher, self.params).await
    }
}

/// Extension trait providing `executor.query("...")`.
pub trait QueryExt: CypherExecutor {
    /// Creates a new statement builder for this executor.
    fn query(&self, cypher: &str) -> Query<'_, Self> {
        Query::new(self, cypher)
    }
}

impl<E: CypherExecutor + ?Sized> QueryExt for E {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    // Records every call and replays a fixed row set
    struct MockExecutor {
        calls: Mutex<Vec<(String, Params)>>,
        rows: Vec<Row>,
    }

    impl MockExecutor {
        fn new(rows: Vec<Row>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                rows,
            }
        }
    }

    #[async_trait::async_trait]
    impl CypherExecutor for MockExecutor {
        async fn execute_cypher(
            &self,
            cypher: &str,
            params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            self.calls.lock().unwrap().push((cypher.to_string(), params));
            let rows: Vec<Result<Row, AppError>> = self.rows.iter().cloned().map(Ok).collect();
            Ok(Box::pin(futures::stream::iter(rows)))
        }

        async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
            self.calls.lock().unwrap().push((cypher.to_string(), params));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_query_binds_params() {
        let executor = MockExecutor::new(vec![]);

        let rows = executor
            .query("MATCH (n) WHERE id(n) = $id RETURN n")
            .param("id", 42)
            .param("name", "Alice")
            .fetch_all()
            .await
            .unwrap();

        assert!(rows.is_empty());
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls[0].0, "MATCH (n) WHERE id(n) = $id RETURN n");
        assert_eq!(calls[0].1["id"], json!(42));
        assert_eq!(calls[0].1["name"], json!("Alice"));
    }

    #[tokio::test]
    async fn test_params_merge_overrides() {
        let executor = MockExecutor::new(vec![]);
        let mut extra = Params::new();
        extra.insert("id".to_string(), json!(2));

        executor
            .query("MATCH (n) DETACH DELETE n")
            .param("id", 1)
            .params(extra)
            .run()
            .await
            .unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls[0].1["id"], json!(2));
    }

    #[tokio::test]
    async fn test_fetch_one_returns_first_row() {
        let executor = MockExecutor::new(vec![
            Row::from([("x", json!(1))]),
            Row::from([("x", json!(2))]),
        ]);

        let row = executor.query("RETURN 1 AS x").fetch_one().await.unwrap();
        let x: i64 = row.unwrap().get("x").unwrap();
        assert_eq!(x, 1);
    }
}
