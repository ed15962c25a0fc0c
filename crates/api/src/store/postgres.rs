//! `PostgreSQL` document store.
//!
//! # Table: `documents`
//!
//! One row per document: `(collection, id)` primary key, the fields as
//! `JSONB` in `data`, plus `created_at`/`updated_at` columns mirroring the
//! stamps inside `data`. Filters and ordering translate to `data -> 'field'`
//! JSONB comparisons; timestamps compare correctly because they are stored in
//! their fixed-width wire form.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tripnest-cli -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use tripnest_core::Timestamp;

use super::query::{Direction, Query};
use super::{CREATED_AT_FIELD, Document, DocumentStore, ID_FIELD, StoreError, UPDATED_AT_FIELD};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded migrations against `pool`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Document store backed by the `documents` table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_row(Json(value): Json<Value>) -> Result<Document, StoreError> {
    Document::from_value(value)
}

const ADD_TO_SET_SQL: &str = r"
    UPDATE documents
    SET data = jsonb_set(
            jsonb_set(
                data,
                ARRAY[$3::text],
                CASE WHEN COALESCE(data -> $3::text, '[]'::jsonb) @> jsonb_build_array($4::jsonb)
                     THEN COALESCE(data -> $3::text, '[]'::jsonb)
                     ELSE COALESCE(data -> $3::text, '[]'::jsonb) || jsonb_build_array($4::jsonb)
                END,
                true),
            '{updatedAt}', to_jsonb($5::text), true),
        updated_at = $6
    WHERE collection = $1 AND id = $2
    RETURNING data
";

const REMOVE_FROM_SET_SQL: &str = r"
    UPDATE documents
    SET data = jsonb_set(
            jsonb_set(
                data,
                ARRAY[$3::text],
                COALESCE(
                    (SELECT jsonb_agg(elem ORDER BY ord)
                     FROM jsonb_array_elements(COALESCE(data -> $3::text, '[]'::jsonb))
                          WITH ORDINALITY AS t(elem, ord)
                     WHERE elem <> $4::jsonb),
                    '[]'::jsonb),
                true),
            '{updatedAt}', to_jsonb($5::text), true),
        updated_at = $6
    WHERE collection = $1 AND id = $2
    RETURNING data
";

impl PgStore {
    async fn set_operation(
        &self,
        sql: &'static str,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        let now = Timestamp::now();
        let row: Option<(Json<Value>,)> = sqlx::query_as(sql)
            .bind(collection)
            .bind(id)
            .bind(field)
            .bind(Json(value))
            .bind(now.to_wire())
            .bind(now.as_datetime())
            .fetch_optional(&self.pool)
            .await?;

        let (data,) = row.ok_or_else(|| StoreError::not_found(collection, id))?;
        decode_row(data)
    }

    /// Fetch the order value of the cursor document, if it exists.
    async fn cursor_value(
        &self,
        collection: &str,
        cursor: &str,
        field: &str,
    ) -> Result<Option<Value>, StoreError> {
        let row: Option<(Option<Json<Value>>,)> =
            sqlx::query_as("SELECT data -> $3 FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(cursor)
                .bind(field)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(value,)| value).map(|Json(v)| v))
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let row: Option<(Json<Value>,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let (data,) = row.ok_or_else(|| StoreError::not_found(collection, id))?;
        decode_row(data)
    }

    #[instrument(skip(self, doc), fields(id = %doc.id))]
    async fn put(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
        let Document { id, mut data } = doc;
        let now = Timestamp::now();
        data.insert(ID_FIELD.to_owned(), Value::String(id.clone()));
        data.insert(CREATED_AT_FIELD.to_owned(), Value::String(now.to_wire()));
        data.insert(UPDATED_AT_FIELD.to_owned(), Value::String(now.to_wire()));

        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (collection, id) DO UPDATE
            SET data = EXCLUDED.data,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(Value::Object(data)))
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self, partial))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut partial: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let now = Timestamp::now();
        partial.remove(ID_FIELD);
        partial.remove(CREATED_AT_FIELD);
        partial.insert(UPDATED_AT_FIELD.to_owned(), Value::String(now.to_wire()));

        let row: Option<(Json<Value>,)> = sqlx::query_as(
            r"
            UPDATE documents
            SET data = data || $3, updated_at = $4
            WHERE collection = $1 AND id = $2
            RETURNING data
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(partial)))
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await?;

        let (data,) = row.ok_or_else(|| StoreError::not_found(collection, id))?;
        decode_row(data)
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        query.validate()?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT data FROM documents WHERE collection = ");
        builder.push_bind(collection.to_owned());

        for filter in &query.filters {
            // Comparisons never match across JSON types.
            builder
                .push(" AND jsonb_typeof(data -> ")
                .push_bind(filter.field.clone())
                .push(") = jsonb_typeof(")
                .push_bind(Json(filter.value.clone()))
                .push(") AND data -> ")
                .push_bind(filter.field.clone())
                .push(format!(" {} ", filter.op.as_sql()))
                .push_bind(Json(filter.value.clone()));
        }

        let (direction_sql, after_sql) = match query.order_by.as_ref().map(|o| o.direction) {
            Some(Direction::Descending) => ("DESC", "<"),
            _ => ("ASC", ">"),
        };

        if let Some(order) = &query.order_by {
            builder
                .push(" AND data -> ")
                .push_bind(order.field.clone())
                .push(" IS NOT NULL");
        }

        if let Some(cursor) = &query.cursor {
            let invalid = || {
                StoreError::InvalidQuery(
                    "cursor does not reference an existing document".to_owned(),
                )
            };
            match &query.order_by {
                Some(order) => {
                    let value = self
                        .cursor_value(collection, cursor, &order.field)
                        .await?
                        .ok_or_else(invalid)?;
                    builder
                        .push(" AND (data -> ")
                        .push_bind(order.field.clone())
                        .push(format!(", id) {after_sql} ("))
                        .push_bind(Json(value))
                        .push(", ")
                        .push_bind(cursor.clone())
                        .push(")");
                }
                None => {
                    self.get(collection, cursor).await.map_err(|e| match e {
                        StoreError::NotFound { .. } => invalid(),
                        other => other,
                    })?;
                    builder.push(" AND id > ").push_bind(cursor.clone());
                }
            }
        }

        match &query.order_by {
            Some(order) => {
                builder
                    .push(" ORDER BY data -> ")
                    .push_bind(order.field.clone())
                    .push(format!(" {direction_sql}, id {direction_sql}"));
            }
            None => {
                builder.push(" ORDER BY id ASC");
            }
        }

        if let Some(limit) = query.limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<(Json<Value>,)> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(|(data,)| decode_row(data)).collect()
    }

    #[instrument(skip(self, value))]
    async fn add_to_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        self.set_operation(ADD_TO_SET_SQL, collection, id, field, value)
            .await
    }

    #[instrument(skip(self, value))]
    async fn remove_from_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Document, StoreError> {
        self.set_operation(REMOVE_FROM_SET_SQL, collection, id, field, value)
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
