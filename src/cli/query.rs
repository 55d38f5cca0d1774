//! Query command: builds a query from flags and prints the matches.

use std::sync::Arc;

use clap::Args;
use color_eyre::Result;
use serde_json::Value as JsonValue;

use crate::builder::{page_window, Clauses, CompiledQuery, Direction, Operator, QueryState};
use crate::config::{Config, QueryConfig};
use crate::error::AppError;
use crate::graph::backends::neo4j::Neo4jClient;
use crate::mapper::EntityMapper;
use crate::models::Model;

/// Query nodes of one label.
///
/// All `--where` conditions are chained first, then each `--or-where`.
#[derive(Args, Debug, Clone)]
pub struct QueryCommand {
    /// Label to match
    pub label: String,

    /// Condition as "field op value", e.g. "age >= 18" or "name IN [\"a\",\"b\"]"
    #[arg(long = "where", value_name = "CONDITION")]
    pub wheres: Vec<String>,

    /// Condition joined with OR to the preceding clause
    #[arg(long = "or-where", value_name = "CONDITION")]
    pub or_wheres: Vec<String>,

    /// Case-insensitive search term
    #[arg(long)]
    pub search: Option<String>,

    /// Field searched by --search (repeatable)
    #[arg(long = "search-field", value_name = "FIELD")]
    pub search_fields: Vec<String>,

    /// Sort field
    #[arg(long)]
    pub order_by: Option<String>,

    /// Sort descending
    #[arg(long, requires = "order_by")]
    pub desc: bool,

    #[arg(long)]
    pub limit: Option<u64>,

    #[arg(long)]
    pub skip: Option<u64>,

    /// Print the number of matches instead of the matches
    #[arg(long, conflicts_with_all = ["page", "limit", "skip"])]
    pub count: bool,

    /// Return one page (1-based) as a pagination object
    #[arg(long, conflicts_with_all = ["limit", "skip"])]
    pub page: Option<u64>,

    /// Page size for --page (defaults to `query.per_page`)
    #[arg(long, requires = "page")]
    pub per_page: Option<u64>,

    /// Print the compiled statement and parameters without connecting
    #[arg(long)]
    pub dry_run: bool,
}

impl QueryCommand {
    pub async fn run(&self) -> Result<()> {
        if self.dry_run {
            let compiled = self.compile(&QueryConfig::default())?;
            println!("{}", compiled.cypher);
            println!("{}", serde_json::to_string_pretty(&compiled.params)?);
            return Ok(());
        }

        let config = Config::load()?;
        let client = Neo4jClient::from_config(&config.neo4j)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;
        let mapper = EntityMapper::new(Arc::new(client), self.model()?).with_config(&config.query);
        let query = self.apply(mapper.query())?;

        if self.count {
            println!("{}", query.count().await?);
        } else if let Some(page) = self.page {
            let per_page = self.per_page.unwrap_or(config.query.per_page);
            let page = query.paginate(per_page, page).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        } else {
            for entity in query.get().await? {
                println!("{}", serde_json::to_string(&entity)?);
            }
        }
        Ok(())
    }

    fn model(&self) -> Result<Arc<Model>, AppError> {
        let model = Model::builder(self.label.as_str())
            .search_fields(self.search_fields.iter().cloned())
            .build()?;
        Ok(Arc::new(model))
    }

    /// Applies every flag except the terminal ones to `query`.
    fn apply<Q: Clauses>(&self, mut query: Q) -> Result<Q, AppError> {
        for condition in &self.wheres {
            let (field, operator, value) = parse_condition(condition)?;
            query = query.where_op(&field, operator, value);
        }
        for condition in &self.or_wheres {
            let (field, operator, value) = parse_condition(condition)?;
            query = query.or_where_op(&field, operator, value);
        }

        if let Some(term) = &self.search {
            if self.search_fields.is_empty() {
                return Err(AppError::InvalidArgument(
                    "--search needs at least one --search-field".to_string(),
                ));
            }
            query = query.search_in(term, &self.search_fields);
        }

        if let Some(field) = &self.order_by {
            query = if self.desc {
                query.order_by_desc(field)
            } else {
                query.order_by(field, Direction::Asc)
            };
        }
        if let Some(n) = self.limit {
            query = query.limit(n);
        }
        if let Some(n) = self.skip {
            query = query.skip(n);
        }
        Ok(query)
    }

    /// The statement the command would send, with the page window applied.
    fn compile(&self, defaults: &QueryConfig) -> Result<CompiledQuery, AppError> {
        let model = self.model()?;
        let mut state = self.apply(QueryState::new())?;

        if self.count {
            return state.compile_count(model.label());
        }
        if let Some(page) = self.page {
            let per_page = self.per_page.unwrap_or(defaults.per_page);
            let (skip, limit) = page_window(per_page, page)?;
            state = state.skip(skip).limit(limit);
        }
        state.compile_select(model.label())
    }
}

/// Splits `"field op value"` into its parts.
///
/// The operator is matched case-insensitively, longest spelling first, so
/// `NOT IN` wins over `IN` and `>=` over `>`. The value is read as JSON when it
/// parses, otherwise as a plain string. Null checks take no value.
pub fn parse_condition(input: &str) -> Result<(String, Operator, JsonValue), AppError> {
    let input = input.trim();
    let invalid = || AppError::InvalidArgument(format!("expected \"field op value\", got '{}'", input));

    let (field, rest) = input.split_once(char::is_whitespace).ok_or_else(invalid)?;
    let rest = rest.trim_start();
    let upper = rest.to_ascii_uppercase();

    let mut spellings: Vec<(&str, Operator)> = Operator::ALL
        .into_iter()
        .map(|op| (op.as_str(), op))
        .chain([("!=", Operator::Ne)])
        .collect();
    spellings.sort_by_key(|(spelling, _)| std::cmp::Reverse(spelling.len()));

    let (operator, remainder) = spellings
        .into_iter()
        .find_map(|(spelling, op)| {
            let tail = upper.strip_prefix(spelling)?;
            let is_word = spelling.ends_with(|c: char| c.is_ascii_alphabetic());
            if is_word && !(tail.is_empty() || tail.starts_with(char::is_whitespace)) {
                return None;
            }
            Some((op, rest[spelling.len()..].trim()))
        })
        .ok_or_else(|| AppError::InvalidOperator(rest.to_string()))?;

    let value = if !operator.takes_value() {
        if !remainder.is_empty() {
            return Err(invalid());
        }
        JsonValue::Null
    } else if remainder.is_empty() {
        return Err(invalid());
    } else {
        serde_json::from_str(remainder).unwrap_or_else(|_| JsonValue::String(remainder.to_string()))
    };

    Ok((field.to_string(), operator, value))
}
