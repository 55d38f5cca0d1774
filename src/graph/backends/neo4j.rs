//! Neo4j backend over the Bolt protocol via `neo4rs`.
//!
//! # Example
//!
//! ```ignore
//! use neoquent::graph::backends::neo4j::Neo4jClient;
//! use neoquent::graph::QueryExt;
//!
//! let client = Neo4jClient::connect("127.0.0.1:7687", "neo4j", "secret").await?;
//!
//! let rows = client.query("MATCH (n:Person) RETURN n, id(n) AS id")
//!     .fetch_all()
//!     .await?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use neo4rs::{
    BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
};
use serde_json::{json, Map, Value as JsonValue};

use crate::config::Neo4jConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// Neo4j graph client.
///
/// Wraps a `neo4rs::Graph`, which owns the connection pool. Cheap to clone.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: Arc<neo4rs::Graph>,
}

impl Neo4jClient {
    /// Connects to a Neo4j server.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to Neo4j at {}", uri);
        let graph = neo4rs::Graph::new(uri, user, password).await?;
        tracing::info!("Connected to Neo4j");

        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    /// Connects using the `[neo4j]` section of the configuration.
    pub async fn from_config(config: &Neo4jConfig) -> Result<Self, AppError> {
        Self::connect(
            &config.uri,
            &config.user,
            config.password.as_deref().unwrap_or(""),
        )
        .await
    }

    fn build_query(cypher: &str, params: Params) -> neo4rs::Query {
        params
            .into_iter()
            .fold(neo4rs::query(cypher), |q, (name, value)| {
                q.param(&name, json_to_bolt(value))
            })
    }
}

#[async_trait]
impl CypherExecutor for Neo4jClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let query = Self::build_query(cypher, params);
        let mut stream = self
            .graph
            .execute(query)
            .await
            .map_err(|e| AppError::query(e, cypher))?;
        let cypher = cypher.to_string();

        Ok(Box::pin(try_stream! {
            while let Some(row) = stream.next().await.map_err(|e| AppError::query(e, &cypher))? {
                yield parse_row(&row)?;
            }
        }))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        let query = Self::build_query(cypher, params);
        self.graph
            .run(query)
            .await
            .map_err(|e| AppError::query(e, cypher))
    }
}

/// Converts a Bolt row into a JSON row keyed by column name.
fn parse_row(row: &neo4rs::Row) -> Result<Row, AppError> {
    let columns: HashMap<String, BoltType> = row
        .to()
        .map_err(|e| AppError::Internal(format!("failed to read row: {}", e)))?;
    Ok(Row::new(
        columns
            .into_iter()
            .map(|(column, value)| (column, bolt_to_json(value)))
            .collect(),
    ))
}

/// Converts a JSON parameter into a Bolt value.
pub(crate) fn json_to_bolt(value: JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => BoltType::Boolean(BoltBoolean::new(b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(f64::NAN))),
        },
        JsonValue::String(s) => BoltType::String(BoltString::from(s)),
        JsonValue::Array(items) => BoltType::List(BoltList::from(
            items.into_iter().map(json_to_bolt).collect::<Vec<_>>(),
        )),
        JsonValue::Object(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(BoltString::from(key), json_to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}

/// Converts a Bolt value into JSON.
///
/// Nodes become `{id, labels, properties}` and relationships
/// `{id, type, start, end, properties}`. Temporal and spatial values are
/// rendered through their debug representation.
pub(crate) fn bolt_to_json(value: BoltType) -> JsonValue {
    match value {
        BoltType::Null(_) => JsonValue::Null,
        BoltType::Boolean(b) => JsonValue::Bool(b.value),
        BoltType::Integer(i) => JsonValue::from(i.value),
        BoltType::Float(f) => serde_json::Number::from_f64(f.value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        BoltType::String(s) => JsonValue::String(s.value),
        BoltType::List(list) => {
            JsonValue::Array(list.value.into_iter().map(bolt_to_json).collect())
        }
        BoltType::Map(map) => JsonValue::Object(map_to_json(map)),
        BoltType::Node(node) => json!({
            "id": node.id.value,
            "labels": bolt_to_json(BoltType::List(node.labels)),
            "properties": map_to_json(node.properties),
        }),
        BoltType::Relation(rel) => json!({
            "id": rel.id.value,
            "type": rel.typ.value,
            "start": rel.start_node_id.value,
            "end": rel.end_node_id.value,
            "properties": map_to_json(rel.properties),
        }),
        other => JsonValue::String(format!("{:?}", other)),
    }
}

fn map_to_json(map: BoltMap) -> Map<String, JsonValue> {
    // Bolt maps are unordered; sort keys for stable output.
    map.value
        .into_iter()
        .map(|(k, v)| (k.value, bolt_to_json(v)))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .collect()
}
