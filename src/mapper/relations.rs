//! Relationship creation and traversal.

use std::str::FromStr;

use crate::cypher;
use crate::error::AppError;
use crate::graph::{identifier, CypherExecutor, Node};
use crate::models::{Attributes, Entity};

use super::EntityMapper;

/// Which way to traverse a relationship type from an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelDirection {
    /// `(n)-[:T]->(m)`
    Out,
    /// `(n)<-[:T]-(m)`
    In,
    /// `(n)-[:T]-(m)`
    Both,
}

impl RelDirection {
    fn pattern(self, rel_type: &str) -> String {
        match self {
            RelDirection::Out => format!("-[:{}]->", rel_type),
            RelDirection::In => format!("<-[:{}]-", rel_type),
            RelDirection::Both => format!("-[:{}]-", rel_type),
        }
    }
}

impl FromStr for RelDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "out" => Ok(RelDirection::Out),
            "in" => Ok(RelDirection::In),
            "both" => Ok(RelDirection::Both),
            _ => Err(AppError::InvalidArgument(format!(
                "direction must be out, in or both, got '{}'",
                s
            ))),
        }
    }
}

impl<E: CypherExecutor + ?Sized> EntityMapper<E> {
    /// Creates `(source)-[:rel_type]->(target)` carrying `properties`.
    ///
    /// Returns `false` rather than failing when either entity has no identity
    /// or when the match finds no rows (an endpoint no longer exists), so bulk
    /// loops can skip and continue. Duplicate edges are not prevented.
    pub async fn create_relationship(
        &self,
        source: &Entity,
        target: &Entity,
        rel_type: &str,
        properties: Attributes,
    ) -> Result<bool, AppError> {
        let rel_type = identifier(rel_type)?;
        let (Some(source_id), Some(target_id)) = (source.id(), target.id()) else {
            tracing::warn!(
                rel_type,
                source = ?source.id(),
                target = ?target.id(),
                "relationship endpoint has no identity"
            );
            return Ok(false);
        };

        let cypher = format!(
            "MATCH (a), (b) WHERE id(a) = $source AND id(b) = $target \
             CREATE (a)-[r:{}]->(b) SET r = $properties RETURN id(r) AS id",
            rel_type
        );
        let row = cypher!(
            &*self.executor,
            cypher,
            source = source_id,
            target = target_id,
            properties = properties,
        )
        .fetch_one()
        .await?;

        if row.is_none() {
            tracing::warn!(rel_type, source_id, target_id, "relationship endpoint missing");
        }
        Ok(row.is_some())
    }

    /// Nodes connected to `entity` by `rel_type` in `direction`.
    ///
    /// Each node is hydrated as the model registered for its first known label;
    /// a node with no registered label is an [`AppError::UnknownLabel`].
    pub async fn related(
        &self,
        entity: &Entity,
        rel_type: &str,
        direction: RelDirection,
    ) -> Result<Vec<Entity>, AppError> {
        let rel_type = identifier(rel_type)?;
        let Some(id) = entity.id().filter(|_| entity.exists()) else {
            return Ok(Vec::new());
        };

        let cypher = format!(
            "MATCH (s:{}){}(n) WHERE id(s) = $id RETURN n, id(n) AS id",
            entity.label(),
            direction.pattern(rel_type)
        );
        let rows = cypher!(&*self.executor, cypher, id = id).fetch_all().await?;

        rows.iter()
            .map(|row| {
                let node: Node = row.get("n")?;
                let model = self.registry.resolve(&node.labels)?;
                Ok(Entity::hydrate(model, node))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::tests::{node_row, person_model, ScriptedExecutor};
    use super::*;
    use crate::graph::Row;
    use crate::models::{Model, ModelRegistry};
    use serde_json::json;

    fn persisted(id: i64) -> Entity {
        Entity::hydrate(
            person_model(),
            Node {
                id,
                labels: vec!["Person".into()],
                properties: Attributes::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_relationship_zero_id_is_valid() {
        let executor = ScriptedExecutor::with(vec![vec![Row::from([("id", json!(11))])]]);
        let people = EntityMapper::new(Arc::new(executor), person_model());

        let mut props = Attributes::new();
        props.insert("strength".into(), json!(0.8));
        let created = people
            .create_relationship(&persisted(0), &persisted(1), "KNOWS", props)
            .await
            .unwrap();

        assert!(created);
        let calls = people.executor().calls.lock().unwrap();
        assert_eq!(
            calls[0].0,
            "MATCH (a), (b) WHERE id(a) = $source AND id(b) = $target \
             CREATE (a)-[r:KNOWS]->(b) SET r = $properties RETURN id(r) AS id"
        );
        assert_eq!(calls[0].1["source"], json!(0));
        assert_eq!(calls[0].1["properties"], json!({"strength": 0.8}));
    }

    #[tokio::test]
    async fn test_create_relationship_missing_endpoint_is_false() {
        let people = EntityMapper::new(Arc::new(ScriptedExecutor::default()), person_model());

        let created = people
            .create_relationship(&persisted(0), &persisted(1), "KNOWS", Attributes::new())
            .await
            .unwrap();
        assert!(!created);

        let unsaved = Entity::new(person_model());
        let created = people
            .create_relationship(&persisted(0), &unsaved, "KNOWS", Attributes::new())
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(people.executor().statements().len(), 1);
    }

    #[tokio::test]
    async fn test_create_relationship_rejects_unsafe_type() {
        let people = EntityMapper::new(Arc::new(ScriptedExecutor::default()), person_model());
        let err = people
            .create_relationship(&persisted(0), &persisted(1), "KNOWS]->(x) DELETE x//", Attributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_related_patterns_per_direction() {
        let people = EntityMapper::new(Arc::new(ScriptedExecutor::default()), person_model());

        for (direction, pattern) in [
            (RelDirection::Out, "(s:Person)-[:KNOWS]->(n)"),
            (RelDirection::In, "(s:Person)<-[:KNOWS]-(n)"),
            (RelDirection::Both, "(s:Person)-[:KNOWS]-(n)"),
        ] {
            people.related(&persisted(3), "KNOWS", direction).await.unwrap();
            let last = people.executor().statements().pop().unwrap();
            assert_eq!(
                last,
                format!("MATCH {} WHERE id(s) = $id RETURN n, id(n) AS id", pattern)
            );
        }
    }

    #[tokio::test]
    async fn test_related_resolves_labels_through_registry() {
        let company = Arc::new(Model::builder("Company").build().unwrap());
        let registry: ModelRegistry = [person_model(), company].into_iter().collect();
        let executor = ScriptedExecutor::with(vec![vec![
            node_row(7, "Company", json!({"name": "Acme"})),
            node_row(8, "Person", json!({"name": "Bob"})),
        ]]);
        let people = EntityMapper::new(Arc::new(executor), person_model())
            .with_registry(Arc::new(registry));

        let related = people
            .related(&persisted(1), "WORKS_WITH", RelDirection::Both)
            .await
            .unwrap();

        assert_eq!(related[0].label(), "Company");
        assert_eq!(related[1].label(), "Person");
    }

    #[tokio::test]
    async fn test_related_unknown_label_errors() {
        let executor = ScriptedExecutor::with(vec![vec![node_row(7, "Robot", json!({}))]]);
        let people = EntityMapper::new(Arc::new(executor), person_model());

        let err = people
            .related(&persisted(1), "OWNS", RelDirection::Out)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownLabel(_)));
    }

    #[tokio::test]
    async fn test_related_of_unpersisted_is_empty() {
        let people = EntityMapper::new(Arc::new(ScriptedExecutor::default()), person_model());
        let related = people
            .related(&Entity::new(person_model()), "KNOWS", RelDirection::Out)
            .await
            .unwrap();
        assert!(related.is_empty());
        assert!(people.executor().statements().is_empty());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("OUT".parse::<RelDirection>().unwrap(), RelDirection::Out);
        assert!("sideways".parse::<RelDirection>().is_err());
    }
}
