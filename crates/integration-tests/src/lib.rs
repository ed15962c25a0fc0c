//! Integration tests for Tripnest.
//!
//! The tests drive the full router in-process with `tower::ServiceExt::oneshot`
//! against the in-memory document store, so they need no database or running
//! server:
//!
//! ```bash
//! cargo test -p tripnest-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `trips_api` - Trip CRUD, ownership, places and itineraries
//! - `stories_api` - Feed pagination, likes and comments
//! - `users_api` - Profiles
//! - `recommendations_api` - Destination ranking

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use tripnest_api::config::ApiConfig;
use tripnest_api::routes;
use tripnest_api::services::auth::{JwtTokenVerifier, Identity};
use tripnest_api::state::AppState;
use tripnest_api::store::{DESTINATIONS, Document, DocumentStore, MemoryStore};
use tripnest_core::Destination;

const TOKEN_SECRET: &str = "kP3v9QxW2mZ7rT5yL8nB4cF6hJ1dS0aG";

/// A status code and a decoded body. Non-JSON bodies become a JSON string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `data` field of a success envelope.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `message` field of an error envelope.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// The router wired to a fresh in-memory store.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    verifier: JwtTokenVerifier,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let secret = SecretString::from(TOKEN_SECRET);
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            ApiConfig::with_token_secret(secret.clone()),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
        );

        Self {
            router: routes::routes().with_state(state),
            store,
            verifier: JwtTokenVerifier::new(&secret),
        }
    }

    /// A one-hour token for `uid` with an email claim of `<uid>@example.com`.
    ///
    /// # Panics
    ///
    /// Panics if the token cannot be signed.
    #[must_use]
    pub fn token(&self, uid: &str) -> String {
        let identity = Identity {
            email: Some(format!("{uid}@example.com")),
            ..Identity::new(uid)
        };
        self.verifier
            .issue(&identity, chrono::Duration::hours(1))
            .expect("sign test token")
    }

    /// Write destinations straight into the store.
    ///
    /// # Panics
    ///
    /// Panics if a destination cannot be stored.
    pub async fn seed_destinations(&self, destinations: &[Destination]) {
        for destination in destinations {
            let doc = Document::from_entity(destination).expect("encode destination");
            self.store
                .put(DESTINATIONS, doc)
                .await
                .expect("store destination");
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request(Method::POST, uri, token, body).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}
