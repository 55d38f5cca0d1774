//! Model definitions: a node label, its schema, search fields and scopes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;

use crate::builder::QueryState;
use crate::error::AppError;
use crate::graph::identifier;
use crate::models::entity::Attributes;
use crate::models::schema::{FieldDef, FieldKind, Rule, Schema};

/// A named scope: a pure function from builder state to builder state.
pub type ScopeFn = Arc<dyn Fn(QueryState) -> QueryState + Send + Sync>;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// An entity kind mapped to a node label.
///
/// Built once through [`Model::builder`], validated at construction, then
/// shared behind an `Arc` by every entity and query of that kind.
#[derive(Clone)]
pub struct Model {
    label: String,
    schema: Schema,
    search_fields: Vec<String>,
    scopes: HashMap<String, ScopeFn>,
    timestamps: bool,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scopes: Vec<_> = self.scopes.keys().collect();
        scopes.sort();
        f.debug_struct("Model")
            .field("label", &self.label)
            .field("schema", &self.schema)
            .field("search_fields", &self.search_fields)
            .field("scopes", &scopes)
            .field("timestamps", &self.timestamps)
            .finish()
    }
}

impl Model {
    /// Starts a model definition for `label`.
    ///
    /// ```ignore
    /// let person = Model::builder("Person")
    ///     .field_with("name", FieldKind::Text, [Rule::Required])
    ///     .field("age", FieldKind::Integer)
    ///     .scope("adults", |q| q.where_op("age", Operator::Gte, 18))
    ///     .timestamps()
    ///     .build()?;
    /// ```
    pub fn builder(label: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            label: label.into(),
            fields: Vec::new(),
            search_fields: None,
            scopes: HashMap::new(),
            timestamps: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Fields searched by `search(term)` when none are given.
    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn scope(&self, name: &str) -> Option<&ScopeFn> {
        self.scopes.get(name)
    }

    pub fn has_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Validates and stamps a full attribute set before insert.
    pub(crate) fn prepare_insert(&self, attributes: &mut Attributes) -> Result<(), AppError> {
        self.schema.prepare(attributes, false)?;
        if self.timestamps {
            let now = JsonValue::String(Utc::now().to_rfc3339());
            attributes
                .entry(CREATED_AT)
                .or_insert_with(|| now.clone());
            attributes.insert(UPDATED_AT.to_string(), now);
        }
        Ok(())
    }

    /// Validates and stamps a dirty subset before update.
    pub(crate) fn prepare_update(&self, changes: &mut Attributes) -> Result<(), AppError> {
        self.schema.prepare(changes, true)?;
        if self.timestamps {
            changes.insert(
                UPDATED_AT.to_string(),
                JsonValue::String(Utc::now().to_rfc3339()),
            );
        }
        Ok(())
    }
}

/// Builder for [`Model`].
pub struct ModelBuilder {
    label: String,
    fields: Vec<FieldDef>,
    search_fields: Option<Vec<String>>,
    scopes: HashMap<String, ScopeFn>,
    timestamps: bool,
}

impl ModelBuilder {
    /// Declares a field without rules.
    pub fn field(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.field_with(name, kind, [])
    }

    /// Declares a field with validation rules.
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            kind,
            rules: rules.into_iter().collect(),
        });
        self
    }

    /// Overrides the default search fields (all text fields).
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Registers a named scope.
    pub fn scope<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(QueryState) -> QueryState + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Arc::new(scope));
        self
    }

    /// Maintains `created_at` / `updated_at` on save.
    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub fn build(self) -> Result<Model, AppError> {
        identifier(&self.label)?;

        let mut schema = Schema::default();
        for field in self.fields {
            schema.push(field)?;
        }

        let search_fields = match self.search_fields {
            Some(fields) => {
                for field in &fields {
                    identifier(field)?;
                }
                fields
            }
            None => schema
                .fields()
                .filter(|f| f.kind == FieldKind::Text)
                .map(|f| f.name.clone())
                .collect(),
        };

        Ok(Model {
            label: self.label,
            schema,
            search_fields,
            scopes: self.scopes,
            timestamps: self.timestamps,
        })
    }
}
