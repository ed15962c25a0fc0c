//! In-process document store.
//!
//! Backed by a `tokio::sync::RwLock` over per-collection `BTreeMap`s. The lock
//! is held only for the duration of a single call, so each call is atomic and
//! nothing is held across requests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tripnest_core::Timestamp;

use super::query::{Direction, Filter, FilterOp, Query};
use super::{CREATED_AT_FIELD, Document, DocumentStore, ID_FIELD, StoreError, UPDATED_AT_FIELD};

type Collection = BTreeMap<String, Map<String, Value>>;

/// Document store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn stamp_now() -> Value {
    Value::String(Timestamp::now().to_wire())
}

fn to_document(id: &str, data: &Map<String, Value>) -> Document {
    Document {
        id: id.to_owned(),
        data: data.clone(),
    }
}

/// Rank of a JSON type in the cross-type sort order.
const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn matches(data: &Map<String, Value>, filter: &Filter) -> bool {
    let Some(value) = data.get(&filter.field) else {
        return false;
    };
    // Comparisons never match across types.
    if type_rank(value) != type_rank(&filter.value) {
        return false;
    }
    let ordering = compare_values(value, &filter.value);
    match filter.op {
        FilterOp::Eq => ordering == Ordering::Equal,
        FilterOp::Lt => ordering == Ordering::Less,
        FilterOp::Lte => ordering != Ordering::Greater,
        FilterOp::Gt => ordering == Ordering::Greater,
        FilterOp::Gte => ordering != Ordering::Less,
    }
}

/// Compare two `(order value, id)` keys in query direction.
fn compare_keys(a: (&Value, &str), b: (&Value, &str), direction: Direction) -> Ordering {
    let ordering = compare_values(a.0, b.0).then_with(|| a.1.cmp(b.1));
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

fn run_query(collection: Option<&Collection>, query: &Query) -> Result<Vec<Document>, StoreError> {
    let Some(collection) = collection else {
        if query.cursor.is_some() {
            return Err(StoreError::InvalidQuery(
                "cursor does not reference an existing document".to_owned(),
            ));
        }
        return Ok(Vec::new());
    };

    let null = Value::Null;
    let order_field = query.order_by.as_ref().map(|o| o.field.as_str());
    let direction = query.order_by.as_ref().map_or(Direction::Ascending, |o| o.direction);
    let sort_value = |data: &Map<String, Value>| -> Option<Value> {
        match order_field {
            Some(field) => data.get(field).cloned(),
            None => Some(null.clone()),
        }
    };

    let mut hits: Vec<(Value, &String, &Map<String, Value>)> = collection
        .iter()
        .filter(|(_, data)| query.filters.iter().all(|f| matches(data, f)))
        // Documents without the order field are not part of an ordered result.
        .filter_map(|(id, data)| sort_value(data).map(|v| (v, id, data)))
        .collect();

    hits.sort_by(|a, b| compare_keys((&a.0, a.1), (&b.0, b.1), direction));

    if let Some(cursor) = &query.cursor {
        let cursor_value = collection.get(cursor).and_then(sort_value).ok_or_else(|| {
            StoreError::InvalidQuery("cursor does not reference an existing document".to_owned())
        })?;
        hits.retain(|(value, id, _)| {
            compare_keys((value, id), (&cursor_value, cursor), direction) == Ordering::Greater
        });
    }

    let limit = query.limit.unwrap_or(usize::MAX);
    Ok(hits
        .into_iter()
        .take(limit)
        .map(|(_, id, data)| to_document(id, data))
        .collect())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| to_document(id, data))
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn put(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
        let Document { id, mut data } = doc;
        let now = stamp_now();
        data.insert(ID_FIELD.to_owned(), Value::String(id.clone()));
        data.insert(CREATED_AT_FIELD.to_owned(), now.clone());
        data.insert(UPDATED_AT_FIELD.to_owned(), now);

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        for (key, value) in partial {
            if key != ID_FIELD && key != CREATED_AT_FIELD {
                data.insert(key, value);
            }
        }
        data.insert(UPDATED_AT_FIELD.to_owned(), stamp_now());
        Ok(to_document(id, data))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        query.validate()?;
        let collections = self.collections.read().await;
        run_query(collections.get(collection), query)
    }

    async fn add_to_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        let entry = data
            .entry(field.to_owned())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = entry else {
            return Err(StoreError::DataCorruption(format!(
                "{collection}/{id}: field '{field}' is not an array"
            )));
        };
        if !items.contains(&value) {
            items.push(value);
        }
        data.insert(UPDATED_AT_FIELD.to_owned(), stamp_now());
        Ok(to_document(id, data))
    }

    async fn remove_from_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        match data.get_mut(field) {
            Some(Value::Array(items)) => items.retain(|item| item != &value),
            None | Some(Value::Null) => {}
            Some(_) => {
                return Err(StoreError::DataCorruption(format!(
                    "{collection}/{id}: field '{field}' is not an array"
                )));
            }
        }
        data.insert(UPDATED_AT_FIELD.to_owned(), stamp_now());
        Ok(to_document(id, data))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
