//! Compilation of [`QueryState`] into one parameterized statement.
//!
//! WHERE fragments are joined left-to-right, each clause after the first
//! prefixed by its own `AND`/`OR`. No parentheses are added except around
//! explicit groups, so Cypher precedence applies: `a AND b OR c` reads as
//! `(a AND b) OR c`.
//!
//! Parameters are named `param{i}`, where `i` is the clause's depth-first
//! position. Null checks consume a position but bind nothing.

use std::fmt::Write;

use crate::builder::clause::{Clause, Predicate};
use crate::builder::page::check_bound;
use crate::builder::state::QueryState;
use crate::error::AppError;
use crate::graph::{identifier, Params};

/// A compiled statement and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub cypher: String,
    pub params: Params,
}

impl QueryState {
    /// Compiles the WHERE expression (without the keyword), if any.
    pub fn compile_where(&self) -> Result<(Option<String>, Params), AppError> {
        let mut params = Params::new();
        let mut position = 0;
        let expression = compile_clauses(&self.wheres, &mut position, &mut params)?;
        Ok((expression, params))
    }

    /// `MATCH (n:Label) [WHERE ..] RETURN n, id(n) AS id [ORDER BY ..] [SKIP k] [LIMIT k]`
    pub fn compile_select(&self, label: &str) -> Result<CompiledQuery, AppError> {
        let (mut cypher, params) = self.compile_match(label)?;
        cypher.push_str(" RETURN n, id(n) AS id");

        if !self.orders.is_empty() {
            let terms = self
                .orders
                .iter()
                .map(|o| Ok(format!("n.{} {}", identifier(&o.field)?, o.direction)))
                .collect::<Result<Vec<_>, AppError>>()?;
            write!(cypher, " ORDER BY {}", terms.join(", ")).ok();
        }
        if let Some(skip) = self.skip {
            write!(cypher, " SKIP {}", check_bound("skip", skip)?).ok();
        }
        if let Some(limit) = self.limit {
            write!(cypher, " LIMIT {}", check_bound("limit", limit)?).ok();
        }

        Ok(CompiledQuery { cypher, params })
    }

    /// Same match and WHERE as [`compile_select`](Self::compile_select), returning
    /// `count(n) AS count`; ordering and bounds are ignored.
    pub fn compile_count(&self, label: &str) -> Result<CompiledQuery, AppError> {
        let (mut cypher, params) = self.compile_match(label)?;
        cypher.push_str(" RETURN count(n) AS count");
        Ok(CompiledQuery { cypher, params })
    }

    fn compile_match(&self, label: &str) -> Result<(String, Params), AppError> {
        let mut cypher = format!("MATCH (n:{})", identifier(label)?);
        let (expression, params) = self.compile_where()?;
        if let Some(expression) = expression {
            write!(cypher, " WHERE {}", expression).ok();
        }
        Ok((cypher, params))
    }
}

fn compile_clauses(
    clauses: &[Clause],
    position: &mut usize,
    params: &mut Params,
) -> Result<Option<String>, AppError> {
    let mut out = String::new();

    for clause in clauses {
        let fragment = match &clause.predicate {
            Predicate::Condition {
                field,
                operator,
                value,
            } => {
                operator.check_value(field, value)?;
                let param = format!("param{}", *position);
                *position += 1;
                if operator.takes_value() {
                    params.insert(param.clone(), value.clone());
                }
                Some(operator.render(&format!("n.{}", identifier(field)?), &param))
            }
            // Empty groups emit nothing.
            Predicate::Group(inner) => {
                compile_clauses(inner, position, params)?.map(|expr| format!("({})", expr))
            }
        };

        if let Some(fragment) = fragment {
            if out.is_empty() {
                out.push_str(&fragment);
            } else {
                write!(out, " {} {}", clause.boolean, fragment).ok();
            }
        }
    }

    Ok((!out.is_empty()).then_some(out))
}
