//! Clause vocabulary: operators, boolean connectives, sort directions.

use std::fmt;
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::error::AppError;

/// Comparison operators accepted in a WHERE clause.
///
/// This is a closed set; each variant renders through a fixed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    Contains,
    StartsWith,
    EndsWith,
    /// Case-insensitive containment: `toLower(field) CONTAINS toLower($p)`.
    SearchCi,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::IsNotNull,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::SearchCi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Contains => "CONTAINS",
            Operator::StartsWith => "STARTS WITH",
            Operator::EndsWith => "ENDS WITH",
            Operator::SearchCi => "SEARCH_CI",
        }
    }

    /// Null checks bind no parameter.
    pub fn takes_value(self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    /// Checks that `value` has the shape this operator binds.
    ///
    /// Membership needs a list, string matching needs a string, and
    /// comparisons take a non-null scalar or list. Null checks ignore the value.
    pub fn check_value(self, field: &str, value: &JsonValue) -> Result<(), AppError> {
        let expected = match self {
            Operator::IsNull | Operator::IsNotNull => return Ok(()),
            Operator::In | Operator::NotIn if !value.is_array() => "a list",
            Operator::Contains | Operator::StartsWith | Operator::EndsWith | Operator::SearchCi
                if !value.is_string() =>
            {
                "a string"
            }
            Operator::Eq
            | Operator::Ne
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte
                if value.is_null() || value.is_object() =>
            {
                "a non-null scalar or list"
            }
            _ => return Ok(()),
        };
        Err(AppError::InvalidArgument(format!(
            "{} {} expects {}, got {}",
            field, self, expected, value
        )))
    }

    /// Renders the condition for `field` (already qualified, e.g. `n.age`).
    pub(crate) fn render(self, field: &str, param: &str) -> String {
        match self {
            Operator::IsNull | Operator::IsNotNull => format!("{} {}", field, self.as_str()),
            Operator::NotIn => format!("NOT {} IN ${}", field, param),
            Operator::SearchCi => format!("toLower({}) CONTAINS toLower(${})", field, param),
            _ => format!("{} {} ${}", field, self.as_str(), param),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = AppError;

    /// Parses operator text case-insensitively; `!=` is accepted for `<>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        if normalized == "!=" {
            return Ok(Operator::Ne);
        }
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| AppError::InvalidOperator(s.to_string()))
    }
}

/// How a clause joins its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Boolean::And => "AND",
            Boolean::Or => "OR",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        })
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(AppError::InvalidArgument(format!(
                "sort direction must be asc or desc, got '{}'",
                s
            ))),
        }
    }
}

/// The body of a WHERE clause entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Condition {
        field: String,
        operator: Operator,
        value: JsonValue,
    },
    /// A bracketed sub-expression.
    Group(Vec<Clause>),
}

/// One entry of the WHERE list, joined to its predecessor by `boolean`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub boolean: Boolean,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}
