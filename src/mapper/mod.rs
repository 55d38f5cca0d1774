//! Entity mapper: CRUD between entities and labelled nodes.
//!
//! The mapper takes its executor as a constructor argument; it never looks one
//! up from ambient state.
//!
//! ```ignore
//! let people = EntityMapper::new(Arc::new(client), person_model);
//!
//! let mut alice = people.create(attributes).await?;
//! alice.set("age", 18);
//! people.save(&mut alice).await?;
//!
//! let adults = people.query().scope("adults")?.get().await?;
//! ```

mod relations;

use std::sync::Arc;

use serde_json::Value as JsonValue;

pub use relations::RelDirection;

use crate::builder::{Clauses, QueryBuilder};
use crate::config::QueryConfig;
use crate::cypher;
use crate::error::AppError;
use crate::graph::{CypherExecutor, Params, Query};
use crate::models::{Attributes, Entity, EntityId, Model, ModelRegistry};

/// Maps one model to its label and persists its entities.
pub struct EntityMapper<E: CypherExecutor + ?Sized> {
    executor: Arc<E>,
    model: Arc<Model>,
    registry: Arc<ModelRegistry>,
    batch_size: usize,
}

impl<E: CypherExecutor + ?Sized> Clone for EntityMapper<E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            model: self.model.clone(),
            registry: self.registry.clone(),
            batch_size: self.batch_size,
        }
    }
}

impl<E: CypherExecutor + ?Sized> EntityMapper<E> {
    /// Creates a mapper whose registry knows only `model`.
    pub fn new(executor: Arc<E>, model: Arc<Model>) -> Self {
        let registry: ModelRegistry = [model.clone()].into_iter().collect();
        Self {
            executor,
            model,
            registry: Arc::new(registry),
            batch_size: QueryConfig::default().batch_size,
        }
    }

    /// Uses `registry` to resolve the labels of related nodes.
    pub fn with_registry(mut self, registry: Arc<ModelRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Applies tuning from the `[query]` config section.
    pub fn with_config(mut self, config: &QueryConfig) -> Self {
        self.batch_size = config.batch_size.max(1);
        self
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Starts a query over this mapper's label.
    pub fn query(&self) -> QueryBuilder<'_, E> {
        QueryBuilder::new(&*self.executor, self.model.clone())
    }

    /// Inserts a node with `attributes` and returns the persisted entity.
    pub async fn create(&self, attributes: Attributes) -> Result<Entity, AppError> {
        insert(&*self.executor, &self.model, attributes).await
    }

    /// Inserts many nodes, one `UNWIND` round trip per batch.
    ///
    /// Every row is validated before the first batch is sent.
    pub async fn create_many(&self, rows: Vec<Attributes>) -> Result<Vec<Entity>, AppError> {
        let mut prepared = Vec::with_capacity(rows.len());
        for mut attributes in rows {
            self.model.prepare_insert(&mut attributes)?;
            prepared.push(JsonValue::Object(attributes));
        }

        let cypher = format!(
            "UNWIND $rows AS row CREATE (n:{}) SET n = row RETURN n, id(n) AS id",
            self.model.label()
        );

        let mut created = Vec::with_capacity(prepared.len());
        for batch in prepared.chunks(self.batch_size) {
            tracing::debug!(label = self.model.label(), rows = batch.len(), "inserting batch");
            let rows = Query::new(&*self.executor, cypher.as_str())
                .param("rows", batch.to_vec())
                .fetch_all()
                .await
                .map_err(|e| AppError::Persistence(e.to_string()))?;

            for row in &rows {
                created.push(Entity::from_row(self.model.clone(), row)?);
            }
        }

        Ok(created)
    }

    /// Finds a node of this label by engine identity.
    pub async fn find(&self, id: EntityId) -> Result<Option<Entity>, AppError> {
        let cypher = format!(
            "MATCH (n:{}) WHERE id(n) = $id RETURN n, id(n) AS id",
            self.model.label()
        );
        let row = cypher!(&*self.executor, cypher, id = id).fetch_one().await?;

        row.map(|row| Entity::from_row(self.model.clone(), &row))
            .transpose()
    }

    /// `where(field, =, value).first()`.
    pub async fn find_by(
        &self,
        field: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Option<Entity>, AppError> {
        self.query().where_eq(field, value).first().await
    }

    /// Inserts an unpersisted entity or writes the dirty fields of a persisted one.
    ///
    /// Issues no statement when a persisted entity has nothing dirty. A deleted
    /// entity keeps its identity and cannot be saved again.
    pub async fn save(&self, entity: &mut Entity) -> Result<(), AppError> {
        if !entity.exists() {
            if let Some(id) = entity.id() {
                return Err(AppError::Persistence(format!(
                    "{} {} was deleted and cannot be saved",
                    entity.label(),
                    id
                )));
            }
            let created = insert(&*self.executor, entity.model(), entity.attributes().clone()).await?;
            *entity = created;
            return Ok(());
        }

        let mut changes = entity.dirty();
        if changes.is_empty() {
            tracing::debug!(label = entity.label(), id = ?entity.id(), "nothing dirty, skipping update");
            return Ok(());
        }
        entity.model().prepare_update(&mut changes)?;

        let id = entity
            .id()
            .ok_or_else(|| AppError::Internal("persisted entity without id".to_string()))?;
        let cypher = format!(
            "MATCH (n:{}) WHERE id(n) = $id SET n += $changes RETURN n, id(n) AS id",
            entity.label()
        );
        let row = cypher!(&*self.executor, cypher, id = id, changes = changes)
            .fetch_one()
            .await?
            .ok_or_else(|| {
                AppError::Persistence(format!("{} {} no longer exists", entity.label(), id))
            })?;

        let updated = Entity::from_row(entity.model().clone(), &row)?;
        *entity = updated;
        Ok(())
    }

    /// Detach-deletes a persisted entity. Returns `false` without a statement
    /// when it was never persisted.
    pub async fn delete(&self, entity: &mut Entity) -> Result<bool, AppError> {
        let Some(id) = entity.id().filter(|_| entity.exists()) else {
            return Ok(false);
        };

        let cypher = format!("MATCH (n:{}) WHERE id(n) = $id DETACH DELETE n", entity.label());
        cypher!(&*self.executor, cypher, id = id).run().await?;

        entity.mark_deleted();
        Ok(true)
    }
}

/// `CREATE (n:Label {k: $k, ..}) RETURN n, id(n) AS id`, after validation.
async fn insert<E: CypherExecutor + ?Sized>(
    executor: &E,
    model: &Arc<Model>,
    mut attributes: Attributes,
) -> Result<Entity, AppError> {
    model.prepare_insert(&mut attributes)?;

    let properties = attributes
        .keys()
        .map(|k| format!("{0}: ${0}", k))
        .collect::<Vec<_>>()
        .join(", ");
    let cypher = if properties.is_empty() {
        format!("CREATE (n:{}) RETURN n, id(n) AS id", model.label())
    } else {
        format!(
            "CREATE (n:{} {{{}}}) RETURN n, id(n) AS id",
            model.label(),
            properties
        )
    };
    let params: Params = attributes.into_iter().collect();

    let row = Query::new(executor, cypher)
        .params(params)
        .fetch_one()
        .await
        .map_err(|e| AppError::Persistence(e.to_string()))?
        .ok_or_else(|| AppError::Persistence(format!("insert into {} returned no rows", model.label())))?;

    Entity::from_row(model.clone(), &row)
}
