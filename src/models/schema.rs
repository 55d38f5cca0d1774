//! Typed field schema with casting and validation rules.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::identifier;
use crate::models::entity::Attributes;

/// The value kind a declared field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Text,
    List,
}

impl FieldKind {
    /// Casts `value` to this kind, or returns `None` when it cannot be represented.
    ///
    /// Null is accepted by every kind; `Rule::Required` rejects it separately.
    pub fn cast(self, value: &JsonValue) -> Option<JsonValue> {
        if value.is_null() {
            return Some(JsonValue::Null);
        }
        match (self, value) {
            (FieldKind::Integer, JsonValue::Number(n)) => match n.as_i64() {
                Some(i) => Some(JsonValue::from(i)),
                None => n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| JsonValue::from(f as i64)),
            },
            (FieldKind::Integer, JsonValue::String(s)) => {
                s.trim().parse::<i64>().ok().map(JsonValue::from)
            }
            (FieldKind::Integer, JsonValue::Bool(b)) => Some(JsonValue::from(i64::from(*b))),
            (FieldKind::Float, JsonValue::Number(n)) => n.as_f64().map(JsonValue::from),
            (FieldKind::Float, JsonValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(JsonValue::from),
            (FieldKind::Boolean, JsonValue::Bool(b)) => Some(JsonValue::Bool(*b)),
            (FieldKind::Boolean, JsonValue::Number(n)) => match n.as_i64() {
                Some(0) => Some(JsonValue::Bool(false)),
                Some(1) => Some(JsonValue::Bool(true)),
                _ => None,
            },
            (FieldKind::Boolean, JsonValue::String(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" => Some(JsonValue::Bool(true)),
                    "false" | "0" | "no" => Some(JsonValue::Bool(false)),
                    _ => None,
                }
            }
            (FieldKind::Text, JsonValue::String(s)) => Some(JsonValue::String(s.clone())),
            (FieldKind::Text, JsonValue::Number(n)) => Some(JsonValue::String(n.to_string())),
            (FieldKind::Text, JsonValue::Bool(b)) => Some(JsonValue::String(b.to_string())),
            (FieldKind::List, JsonValue::Array(items)) => Some(JsonValue::Array(items.clone())),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "text",
            FieldKind::List => "list",
        }
    }
}

/// A validation rule attached to a declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Present and neither null nor an empty string.
    Required,
    /// A plausible `local@domain.tld` address.
    Email,
    /// Numeric value at least this large.
    Min(i64),
    /// Numeric value at most this large.
    Max(i64),
    /// Text of at most this many characters.
    MaxLength(usize),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => write!(f, "required"),
            Rule::Email => write!(f, "email"),
            Rule::Min(n) => write!(f, "min:{}", n),
            Rule::Max(n) => write!(f, "max:{}", n),
            Rule::MaxLength(n) => write!(f, "max_length:{}", n),
        }
    }
}

impl Rule {
    /// Checks a non-null value. `Required` is handled by the caller.
    fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            Rule::Required => !matches!(value, JsonValue::String(s) if s.is_empty()),
            Rule::Email => value.as_str().is_some_and(is_email),
            Rule::Min(min) => value.as_f64().is_some_and(|v| v >= *min as f64),
            Rule::Max(max) => value.as_f64().is_some_and(|v| v <= *max as f64),
            Rule::MaxLength(max) => value.as_str().map_or(true, |s| s.chars().count() <= *max),
        }
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// One failed rule on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub field: String,
    pub rule: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed {}", self.field, self.rule)
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
}

/// Declared fields of a model.
///
/// Undeclared attributes are allowed (the graph is schemaless) but their keys
/// must still be valid identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub(crate) fn push(&mut self, field: FieldDef) -> Result<(), AppError> {
        identifier(&field.name)?;
        if self.field(&field.name).is_some() {
            return Err(AppError::InvalidArgument(format!(
                "field '{}' declared twice",
                field.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Casts declared fields in place and checks every rule.
    ///
    /// With `partial` set (updates), `Required` only applies to keys present in
    /// `attributes`. All violations are collected before returning.
    pub fn prepare(&self, attributes: &mut Attributes, partial: bool) -> Result<(), AppError> {
        for key in attributes.keys() {
            identifier(key)?;
        }

        let mut violations = Vec::new();
        for field in &self.fields {
            let Some(value) = attributes.get_mut(&field.name) else {
                if !partial && field.rules.contains(&Rule::Required) {
                    violations.push(Violation {
                        field: field.name.clone(),
                        rule: Rule::Required.to_string(),
                    });
                }
                continue;
            };

            match field.kind.cast(value) {
                Some(cast) => *value = cast,
                None => {
                    violations.push(Violation {
                        field: field.name.clone(),
                        rule: format!("type:{}", field.kind.as_str()),
                    });
                    continue;
                }
            }

            for rule in &field.rules {
                let ok = if value.is_null() {
                    *rule != Rule::Required
                } else {
                    rule.accepts(value)
                };
                if !ok {
                    violations.push(Violation {
                        field: field.name.clone(),
                        rule: rule.to_string(),
                    });
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations))
        }
    }
}
