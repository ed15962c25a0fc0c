//! Document store contract, run against every backend.
//!
//! The in-memory runs need nothing. The `PostgreSQL` runs require a database
//! reachable through `TRIPNEST_DATABASE_URL` (or `DATABASE_URL`):
//!
//! ```bash
//! cargo test -p tripnest-integration-tests --test store_contract -- --ignored
//! ```
//!
//! Each `PostgreSQL` run works in its own collection, so runs do not see each
//! other's documents.

#![allow(clippy::unwrap_used)]

use serde_json::{Map, Value, json};
use tripnest_api::config::database_url_from_env;
use tripnest_api::store::postgres::{PgStore, create_pool, run_migrations};
use tripnest_api::store::{Direction, Document, DocumentStore, FilterOp, Query, StoreError};
use tripnest_core::Timestamp;

fn doc(value: Value) -> Document {
    Document::from_value(value).expect("test document")
}

fn ids(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| d.id.as_str()).collect()
}

async fn seed(store: &dyn DocumentStore, collection: &str) {
    for (id, user, start) in [
        ("t1", "u1", "2025-03-01T00:00:00.000Z"),
        ("t2", "u1", "2025-01-01T00:00:00.000Z"),
        ("t3", "u2", "2025-02-01T00:00:00.000Z"),
        ("t4", "u1", "2025-02-01T00:00:00.000Z"),
    ] {
        store
            .put(collection, doc(json!({"id": id, "userId": user, "startDate": start})))
            .await
            .expect("seed trip");
    }
}

// ============================================================================
// Contract
// ============================================================================

async fn put_stamps_timestamps(store: &dyn DocumentStore, collection: &str) {
    let id = store
        .put(collection, doc(json!({"id": "t1", "title": "Rome", "createdAt": "bogus"})))
        .await
        .unwrap();
    assert_eq!(id, "t1");

    let stored = store.get(collection, &id).await.unwrap();
    let created = stored.field("createdAt").and_then(Value::as_str).unwrap();
    assert!(Timestamp::parse(created).is_ok());
    assert_eq!(stored.field("createdAt"), stored.field("updatedAt"));
    assert_eq!(stored.field("title"), Some(&json!("Rome")));
    assert_eq!(stored.field("id"), Some(&json!("t1")));
}

async fn put_replaces_existing(store: &dyn DocumentStore, collection: &str) {
    store
        .put(collection, doc(json!({"id": "t1", "title": "Rome", "location": "Italy"})))
        .await
        .unwrap();
    store
        .put(collection, doc(json!({"id": "t1", "title": "Roma"})))
        .await
        .unwrap();

    let stored = store.get(collection, "t1").await.unwrap();
    assert_eq!(stored.field("title"), Some(&json!("Roma")));
    assert_eq!(stored.field("location"), None);
}

async fn update_merges_shallowly_and_protects_identity(
    store: &dyn DocumentStore,
    collection: &str,
) {
    store
        .put(
            collection,
            doc(json!({"id": "t1", "title": "Rome", "location": "Italy", "budget": "luxury"})),
        )
        .await
        .unwrap();
    let before = store.get(collection, "t1").await.unwrap();

    let mut partial = Map::new();
    partial.insert("title".to_owned(), json!("Roma"));
    partial.insert("id".to_owned(), json!("hijacked"));
    partial.insert("createdAt".to_owned(), json!("1999-01-01T00:00:00.000Z"));
    let after = store.update(collection, "t1", partial).await.unwrap();

    assert_eq!(after.id, "t1");
    assert_eq!(after.field("title"), Some(&json!("Roma")));
    assert_eq!(after.field("location"), Some(&json!("Italy")));
    assert_eq!(after.field("budget"), Some(&json!("luxury")));
    assert_eq!(after.field("id"), Some(&json!("t1")));
    assert_eq!(after.field("createdAt"), before.field("createdAt"));
    assert_eq!(store.get(collection, "t1").await.unwrap(), after);
}

async fn missing_documents_are_not_found(store: &dyn DocumentStore, collection: &str) {
    assert!(matches!(
        store.get(collection, "nope").await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.update(collection, "nope", Map::new()).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete(collection, "nope").await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.add_to_set(collection, "nope", "likes", json!("u1")).await,
        Err(StoreError::NotFound { .. })
    ));
}

async fn delete_twice(store: &dyn DocumentStore, collection: &str) {
    seed(store, collection).await;
    assert!(store.delete(collection, "t1").await.is_ok());
    assert!(matches!(
        store.delete(collection, "t1").await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(store.get(collection, "t2").await.is_ok());
}

async fn query_filters_and_orders_with_id_tiebreak(store: &dyn DocumentStore, collection: &str) {
    seed(store, collection).await;

    let query = Query::new()
        .filter("userId", FilterOp::Eq, "u1")
        .order_by("startDate", Direction::Ascending);
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t2", "t4", "t1"]);

    let query = Query::new().order_by("startDate", Direction::Descending);
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t1", "t4", "t3", "t2"]);

    let query = Query::new();
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t1", "t2", "t3", "t4"]);
}

async fn query_range_filter(store: &dyn DocumentStore, collection: &str) {
    seed(store, collection).await;

    let query = Query::new()
        .filter("startDate", FilterOp::Gte, "2025-02-01T00:00:00.000Z")
        .order_by("startDate", Direction::Ascending);
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t3", "t4", "t1"]);

    let query = Query::new()
        .filter("startDate", FilterOp::Gt, "2025-01-01T00:00:00.000Z")
        .filter("startDate", FilterOp::Lt, "2025-03-01T00:00:00.000Z")
        .order_by("startDate", Direction::Descending);
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t4", "t3"]);
}

async fn filters_never_match_across_types(store: &dyn DocumentStore, collection: &str) {
    store
        .put(collection, doc(json!({"id": "d1", "rating": 4.5})))
        .await
        .unwrap();
    store
        .put(collection, doc(json!({"id": "d2", "rating": "4.5"})))
        .await
        .unwrap();

    let query = Query::new().filter("rating", FilterOp::Gte, 4);
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["d1"]);

    let query = Query::new().filter("rating", FilterOp::Eq, "4.5");
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["d2"]);
}

async fn ordering_skips_documents_without_the_field(store: &dyn DocumentStore, collection: &str) {
    seed(store, collection).await;
    store
        .put(collection, doc(json!({"id": "t0", "userId": "u1"})))
        .await
        .unwrap();

    let query = Query::new()
        .filter("userId", FilterOp::Eq, "u1")
        .order_by("startDate", Direction::Ascending);
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t2", "t4", "t1"]);
}

async fn query_rejects_composite_range(store: &dyn DocumentStore, collection: &str) {
    seed(store, collection).await;

    let query = Query::new()
        .filter("startDate", FilterOp::Gte, "2025-02-01T00:00:00.000Z")
        .order_by("createdAt", Direction::Ascending);
    assert!(matches!(
        store.query(collection, &query).await,
        Err(StoreError::InvalidQuery(_))
    ));

    let query = Query::new()
        .filter("startDate", FilterOp::Gte, "2025-02-01T00:00:00.000Z")
        .filter("createdAt", FilterOp::Lt, "2030-01-01T00:00:00.000Z");
    assert!(matches!(
        store.query(collection, &query).await,
        Err(StoreError::InvalidQuery(_))
    ));

    let query = Query::new().limit(0);
    assert!(matches!(
        store.query(collection, &query).await,
        Err(StoreError::InvalidQuery(_))
    ));
}

async fn cursor_pagination_visits_each_document_once(
    store: &dyn DocumentStore,
    collection: &str,
) {
    seed(store, collection).await;

    for (direction, expected) in [
        (Direction::Descending, ["t1", "t4", "t3", "t2"]),
        (Direction::Ascending, ["t2", "t3", "t4", "t1"]),
    ] {
        let mut cursor = None;
        let mut seen = Vec::new();
        loop {
            let query = Query::new()
                .order_by("startDate", direction)
                .limit(3)
                .start_after(cursor.clone());
            let docs = store.query(collection, &query).await.unwrap();
            seen.extend(docs.iter().map(|d| d.id.clone()));
            if docs.len() < 3 {
                break;
            }
            cursor = docs.last().map(|d| d.id.clone());
        }
        assert_eq!(seen, expected);
    }

    let query = Query::new().limit(2).start_after(Some("t2".to_owned()));
    let docs = store.query(collection, &query).await.unwrap();
    assert_eq!(ids(&docs), ["t3", "t4"]);
}

async fn unknown_cursor_is_invalid(store: &dyn DocumentStore, collection: &str) {
    seed(store, collection).await;

    let query = Query::new().start_after(Some("ghost".to_owned()));
    assert!(matches!(
        store.query(collection, &query).await,
        Err(StoreError::InvalidQuery(_))
    ));

    let query = Query::new()
        .order_by("startDate", Direction::Descending)
        .start_after(Some("ghost".to_owned()));
    assert!(matches!(
        store.query(collection, &query).await,
        Err(StoreError::InvalidQuery(_))
    ));
}

async fn set_operations_are_idempotent(store: &dyn DocumentStore, collection: &str) {
    store
        .put(collection, doc(json!({"id": "s1", "likes": ["u1"]})))
        .await
        .unwrap();

    store.add_to_set(collection, "s1", "likes", json!("u3")).await.unwrap();
    let after = store.add_to_set(collection, "s1", "likes", json!("u3")).await.unwrap();
    assert_eq!(after.field("likes"), Some(&json!(["u1", "u3"])));
    assert!(after.field("updatedAt").is_some());

    store
        .remove_from_set(collection, "s1", "likes", json!("u1"))
        .await
        .unwrap();
    let after = store
        .remove_from_set(collection, "s1", "likes", json!("u1"))
        .await
        .unwrap();
    assert_eq!(after.field("likes"), Some(&json!(["u3"])));

    let after = store
        .remove_from_set(collection, "s1", "likes", json!("u3"))
        .await
        .unwrap();
    assert_eq!(after.field("likes"), Some(&json!([])));

    // Missing array field is created on add.
    let after = store
        .add_to_set(collection, "s1", "comments", json!({"id": "c1", "text": "Hi"}))
        .await
        .unwrap();
    assert_eq!(after.field("comments"), Some(&json!([{"id": "c1", "text": "Hi"}])));
    assert_eq!(store.get(collection, "s1").await.unwrap(), after);
}

async fn ping(store: &dyn DocumentStore, _collection: &str) {
    assert!(store.ping().await.is_ok());
}

// ============================================================================
// Backends
// ============================================================================

async fn postgres_store() -> PgStore {
    let url = database_url_from_env().expect("TRIPNEST_DATABASE_URL or DATABASE_URL");
    let pool = create_pool(&url).await.expect("connect to PostgreSQL");
    run_migrations(&pool).await.expect("run migrations");
    PgStore::new(pool)
}

fn scratch_collection() -> String {
    format!("contract-{}", uuid::Uuid::new_v4())
}

macro_rules! store_contract {
    ($($case:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $case() {
                    super::$case(&tripnest_api::store::MemoryStore::new(), "trips").await;
                }
            )*
        }

        mod postgres {
            $(
                #[tokio::test]
                #[ignore = "Requires running PostgreSQL database"]
                async fn $case() {
                    let store = super::postgres_store().await;
                    super::$case(&store, &super::scratch_collection()).await;
                }
            )*
        }
    };
}

store_contract!(
    put_stamps_timestamps,
    put_replaces_existing,
    update_merges_shallowly_and_protects_identity,
    missing_documents_are_not_found,
    delete_twice,
    query_filters_and_orders_with_id_tiebreak,
    query_range_filter,
    filters_never_match_across_types,
    ordering_skips_documents_without_the_field,
    query_rejects_composite_range,
    cursor_pagination_visits_each_document_once,
    unknown_cursor_is_invalid,
    set_operations_are_idempotent,
    ping,
);
