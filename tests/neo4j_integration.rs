//! Integration tests against a live Neo4j server.
//!
//! These tests require a running Neo4j instance.
//! Run with: `docker run -p 7687:7687 -e NEO4J_AUTH=neo4j/password neo4j:5 &&
//! cargo test --features integration --test neo4j_integration`

#![cfg(feature = "integration")]

use std::sync::Arc;

use neoquent::builder::{Clauses, Operator};
use neoquent::graph::backends::neo4j::Neo4jClient;
use neoquent::graph::{CypherExecutor, Params};
use neoquent::mapper::{EntityMapper, RelDirection};
use neoquent::models::{Attributes, FieldKind, Model, Rule};
use serde_json::{json, Value as JsonValue};
use serial_test::serial;

const TEST_URI: &str = "127.0.0.1:7687";
const TEST_USER: &str = "neo4j";
const TEST_PASSWORD: &str = "password";
const TEST_LABEL: &str = "NeoquentTest";

async fn create_client() -> Arc<Neo4jClient> {
    let client = Neo4jClient::connect(TEST_URI, TEST_USER, TEST_PASSWORD)
        .await
        .expect("Failed to connect to test database");
    Arc::new(client)
}

/// Clean up test data before/after tests
async fn cleanup(client: &Neo4jClient) {
    let _ = client
        .run_cypher(
            &format!("MATCH (n:{}) DETACH DELETE n", TEST_LABEL),
            Params::new(),
        )
        .await;
}

fn people_model() -> Arc<Model> {
    Arc::new(
        Model::builder(TEST_LABEL)
            .field_with("name", FieldKind::Text, [Rule::Required])
            .field("age", FieldKind::Integer)
            .field("occupation", FieldKind::Text)
            .search_fields(["name"])
            .scope("adults", |q| q.where_op("age", Operator::Gte, 18))
            .build()
            .expect("valid model"),
    )
}

fn attrs(value: JsonValue) -> Attributes {
    value.as_object().cloned().expect("object literal")
}

async fn people() -> EntityMapper<Neo4jClient> {
    let client = create_client().await;
    cleanup(&client).await;
    EntityMapper::new(client, people_model())
}

async fn seed(people: &EntityMapper<Neo4jClient>) {
    people
        .create_many(vec![
            attrs(json!({"name": "Alice", "age": 30, "occupation": "Engineer"})),
            attrs(json!({"name": "Bob", "age": 17, "occupation": "Student"})),
            attrs(json!({"name": "Charlie", "age": 45, "occupation": "Engineer"})),
            attrs(json!({"name": "Dana", "age": 22, "occupation": "Designer"})),
            attrs(json!({"name": "Eve", "age": 51, "occupation": "Engineer"})),
        ])
        .await
        .expect("Failed to seed");
}

// All tests share one label and clean it up, so they run serially
#[serial]
mod mapper_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_find_is_superset() {
        let people = people().await;
        let created = people
            .create(attrs(json!({"name": "Alice", "age": 30})))
            .await
            .unwrap();

        let found = people.find(created.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&json!("Alice")));
        assert_eq!(found.get("age"), Some(&json!(30)));
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_save_after_create_is_clean() {
        let people = people().await;
        let mut alice = people.create(attrs(json!({"name": "Alice"}))).await.unwrap();

        assert!(!alice.is_dirty());
        people.save(&mut alice).await.unwrap();
        assert!(alice.exists());
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_set_save_find() {
        let people = people().await;
        let mut bob = people
            .create(attrs(json!({"name": "Bob", "age": 17})))
            .await
            .unwrap();

        bob.set("age", 18);
        people.save(&mut bob).await.unwrap();

        let found = people.find(bob.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(found.get_as::<i64>("age").unwrap(), Some(18));
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_delete_then_find_is_none() {
        let people = people().await;
        let mut carol = people.create(attrs(json!({"name": "Carol"}))).await.unwrap();
        let id = carol.id().unwrap();

        assert!(people.delete(&mut carol).await.unwrap());
        assert!(people.find(id).await.unwrap().is_none());
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_relationships() {
        let people = people().await;
        let alice = people.create(attrs(json!({"name": "Alice"}))).await.unwrap();
        let bob = people.create(attrs(json!({"name": "Bob"}))).await.unwrap();

        let created = people
            .create_relationship(&alice, &bob, "KNOWS", attrs(json!({"since": 2020})))
            .await
            .unwrap();
        assert!(created);

        let known = people.related(&alice, "KNOWS", RelDirection::Out).await.unwrap();
        assert_eq!(known.len(), 1);
        assert_eq!(known[0].get("name"), Some(&json!("Bob")));

        let knowers = people.related(&bob, "KNOWS", RelDirection::In).await.unwrap();
        assert_eq!(knowers[0].id(), alice.id());
        cleanup(people.executor()).await;
    }
}

#[serial]
mod builder_tests {
    use super::*;

    #[tokio::test]
    async fn test_paginate_two_per_page() {
        let people = people().await;
        seed(&people).await;

        let page = people.query().order_by_desc("age").paginate(2, 1).await.unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.from, Some(1));
        assert_eq!(page.to, Some(2));
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_where_in_empty_list_matches_nothing() {
        let people = people().await;
        seed(&people).await;

        let none = people
            .query()
            .where_in("name", Vec::<String>::new())
            .get()
            .await
            .unwrap();
        assert!(none.is_empty());
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_and_chain_is_intersection() {
        let people = people().await;
        seed(&people).await;

        let chained = people
            .query()
            .where_eq("occupation", "Engineer")
            .where_op("age", Operator::Gt, 40)
            .get()
            .await
            .unwrap();

        let engineers = people.query().where_eq("occupation", "Engineer").get().await.unwrap();
        let manual: Vec<_> = engineers
            .into_iter()
            .filter(|e| e.get_as::<i64>("age").unwrap().unwrap_or(0) > 40)
            .filter_map(|e| e.id())
            .collect();

        let mut chained: Vec<_> = chained.into_iter().filter_map(|e| e.id()).collect();
        let mut manual = manual;
        chained.sort();
        manual.sort();
        assert_eq!(chained, manual);
        assert_eq!(chained.len(), 2);
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let people = people().await;
        seed(&people).await;

        let found = people.query().search("ALI").unwrap().get().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&json!("Alice")));
        cleanup(people.executor()).await;
    }

    #[tokio::test]
    async fn test_adults_scope_follows_update() {
        let people = people().await;
        seed(&people).await;

        let adults = people.query().scope("adults").unwrap().count().await.unwrap();
        assert_eq!(adults, 4);

        let mut bob = people.find_by("name", "Bob").await.unwrap().unwrap();
        bob.set("age", 18);
        people.save(&mut bob).await.unwrap();

        let adults = people.query().scope("adults").unwrap().count().await.unwrap();
        assert_eq!(adults, 5);
        cleanup(people.executor()).await;
    }
}
