//! Neoquent - entity mapper and fluent query builder for Neo4j
//!
//! Models describe a label and its typed schema, an [`mapper::EntityMapper`]
//! persists entities of one model, and [`builder::QueryBuilder`] compiles
//! chained clauses into a single parameterized Cypher statement.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod mapper;
pub mod models;
