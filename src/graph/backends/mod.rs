//! Backend implementations of the execution port.
//!
//! Each backend implements [`CypherExecutor`](crate::graph::CypherExecutor).
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | Neo4j (Bolt, `neo4rs`) | [`neo4j`] | Available |
//!
//! A backend must render node columns as `{"id", "labels", "properties"}`
//! JSON objects so the mapper can hydrate entities from them.

pub mod neo4j;
