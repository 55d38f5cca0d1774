//! Entity instances: attribute state plus persisted identity.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::graph::{Node, Row};
use crate::models::model::Model;

/// Ordered attribute map.
pub type Attributes = Map<String, JsonValue>;

/// Engine-assigned node identity. `0` is a valid identity.
pub type EntityId = i64;

/// One node of a model, in memory.
///
/// Tracks the current `attributes` and the `original` snapshot from the last
/// successful save; the difference is the dirty set written by the next save.
#[derive(Debug, Clone)]
pub struct Entity {
    model: Arc<Model>,
    id: Option<EntityId>,
    attributes: Attributes,
    original: Attributes,
    exists: bool,
}

impl Entity {
    /// Creates an unpersisted entity with no attributes.
    pub fn new(model: Arc<Model>) -> Self {
        Self::with_attributes(model, Attributes::new())
    }

    /// Creates an unpersisted entity with the given attributes.
    pub fn with_attributes(model: Arc<Model>, attributes: Attributes) -> Self {
        Self {
            model,
            id: None,
            attributes,
            original: Attributes::new(),
            exists: false,
        }
    }

    /// Creates an unpersisted entity from any struct that serializes to a map.
    pub fn from_record<T: Serialize>(model: Arc<Model>, record: &T) -> Result<Self, AppError> {
        match serde_json::to_value(record) {
            Ok(JsonValue::Object(attributes)) => Ok(Self::with_attributes(model, attributes)),
            Ok(other) => Err(AppError::InvalidArgument(format!(
                "record must serialize to a map, got {}",
                other
            ))),
            Err(e) => Err(AppError::InvalidArgument(format!(
                "failed to serialize record: {}",
                e
            ))),
        }
    }

    /// Deserializes the current attributes into a typed record.
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(JsonValue::Object(self.attributes.clone())).map_err(|e| {
            AppError::Internal(format!(
                "failed to deserialize {} {:?}: {}",
                self.model.label(),
                self.id,
                e
            ))
        })
    }

    /// Builds a persisted entity from a node returned by the database.
    pub(crate) fn hydrate(model: Arc<Model>, node: Node) -> Self {
        Self {
            model,
            id: Some(node.id),
            original: node.properties.clone(),
            attributes: node.properties,
            exists: true,
        }
    }

    /// Builds a persisted entity from a `RETURN n, id(n) AS id` row.
    pub(crate) fn from_row(model: Arc<Model>, row: &Row) -> Result<Self, AppError> {
        let mut node: Node = row.get("n")?;
        if let Some(id) = row.get_opt::<EntityId>("id")? {
            node.id = id;
        }
        Ok(Self::hydrate(model, node))
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn label(&self) -> &str {
        self.model.label()
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// True once persisted and not deleted.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    /// Reads an attribute as a typed value; `None` when absent or null.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.attributes.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| AppError::Internal(format!("failed to deserialize '{}': {}", key, e))),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Merges `attributes` into the current state.
    pub fn fill(&mut self, attributes: Attributes) -> &mut Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn original(&self) -> &Attributes {
        &self.original
    }

    /// Attributes whose value differs from the last persisted snapshot,
    /// including keys added since.
    pub fn dirty(&self) -> Attributes {
        self.attributes
            .iter()
            .filter(|(k, v)| self.original.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.attributes
            .iter()
            .any(|(k, v)| self.original.get(k) != Some(v))
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.exists = false;
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Entity", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("label", self.model.label())?;
        state.serialize_field("attributes", &self.attributes)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn model() -> Arc<Model> {
        Arc::new(Model::builder("Person").build().unwrap())
    }

    fn persisted(props: JsonValue) -> Entity {
        Entity::hydrate(
            model(),
            Node {
                id: 0,
                labels: vec!["Person".into()],
                properties: props.as_object().cloned().unwrap(),
            },
        )
    }

    #[test]
    fn test_hydrated_entity_is_clean() {
        let entity = persisted(json!({"name": "Alice", "age": 30}));
        assert!(entity.exists());
        assert_eq!(entity.id(), Some(0));
        assert!(!entity.is_dirty());
        assert!(entity.dirty().is_empty());
    }

    #[test]
    fn test_dirty_tracks_changes_and_new_keys() {
        let mut entity = persisted(json!({"name": "Alice", "age": 30}));
        entity.set("age", 31).set("city", "Paris").set("name", "Alice");

        let dirty = entity.dirty();
        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty["age"], json!(31));
        assert_eq!(dirty["city"], json!("Paris"));
    }

    #[test]
    fn test_new_entity_is_entirely_dirty() {
        let mut entity = Entity::new(model());
        entity.set("name", "Bob");
        assert!(!entity.exists());
        assert_eq!(entity.id(), None);
        assert_eq!(entity.dirty()["name"], json!("Bob"));
    }

    #[test]
    fn test_from_row_prefers_id_column() {
        let row = Row::from([
            ("n", json!({"id": 1, "labels": ["Person"], "properties": {"name": "A"}})),
            ("id", json!(9)),
        ]);
        let entity = Entity::from_row(model(), &row).unwrap();
        assert_eq!(entity.id(), Some(9));
        assert_eq!(entity.get("name"), Some(&json!("A")));
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: i64,
    }

    #[test]
    fn test_record_conversion() {
        let alice = Person {
            name: "Alice".into(),
            age: 30,
        };
        let entity = Entity::from_record(model(), &alice).unwrap();
        assert_eq!(entity.get_as::<i64>("age").unwrap(), Some(30));
        assert_eq!(entity.to_record::<Person>().unwrap(), alice);
    }

    #[test]
    fn test_from_record_rejects_scalars() {
        let err = Entity::from_record(model(), &42).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn test_serialize_shape() {
        let entity = persisted(json!({"name": "Alice"}));
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"id": 0, "label": "Person", "attributes": {"name": "Alice"}})
        );
    }
}
