//! Application error types.

use thiserror::Error;

use crate::models::Violation;

/// Application-level errors for neoquent.
#[derive(Error, Debug)]
pub enum AppError {
    // Driver errors
    #[error("Neo4j connection error: {0}")]
    Connection(#[from] neo4rs::Error),

    #[error("Neo4j query error: {message}")]
    Query { message: String, query: String },

    // Mapper errors
    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("No {0} matched the query")]
    NotFound(String),

    #[error("Validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    #[error("No registered model for labels {0:?}")]
    UnknownLabel(Vec<String>),

    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    // Boundary errors
    #[error("Invalid identifier '{0}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    #[error("Unsupported operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    /// Builds a [`AppError::Query`] from a driver failure and the statement that caused it.
    pub fn query(err: impl std::fmt::Display, query: &str) -> Self {
        AppError::Query {
            message: err.to_string(),
            query: query.to_string(),
        }
    }
}
