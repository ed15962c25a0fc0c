//! End-to-end tests for `/api/trips`.

use axum::http::StatusCode;
use serde_json::{Value, json};
use tripnest_integration_tests::TestApp;

async fn create_trip(app: &TestApp, token: &str, title: &str, start: &str, end: &str) -> Value {
    let resp = app
        .post(
            "/api/trips",
            Some(token),
            Some(json!({
                "title": title,
                "location": "Lisbon, Portugal",
                "startDate": start,
                "endDate": end,
                "tripType": "couple",
                "budget": "moderate",
            })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    resp.data().clone()
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v["id"].as_str())
        .collect()
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = TestApp::new();

    let resp = app.get("/api/trips", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["success"], false);

    let resp = app.get("/api/trips", Some("not-a-token")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.message(), "Invalid access token");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");

    let resp = app.get("/health/ready", None).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = TestApp::new();
    let resp = app.get("/api/nowhere", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["success"], false);
}

// ============================================================================
// CRUD & Ownership
// ============================================================================

#[tokio::test]
async fn test_trip_lifecycle() {
    let app = TestApp::new();
    let owner = app.token("u1");

    let trip = create_trip(&app, &owner, "Lisbon", "2090-05-01", "2090-05-04").await;
    let id = trip["id"].as_str().unwrap_or_default().to_owned();
    assert_eq!(trip["userId"], "u1");
    assert_eq!(trip["startDate"], "2090-05-01T00:00:00.000Z");
    assert_eq!(trip["places"], json!([]));

    let resp = app.get(&format!("/api/trips/{id}"), Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["title"], "Lisbon");

    let resp = app
        .put(
            &format!("/api/trips/{id}"),
            Some(&owner),
            json!({"title": "Lisbon & Sintra"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["title"], "Lisbon & Sintra");
    assert_eq!(resp.data()["location"], "Lisbon, Portugal");

    let resp = app.delete(&format!("/api/trips/{id}"), Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);

    let resp = app.delete(&format!("/api/trips/{id}"), Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.message(), "Trip not found");
}

#[tokio::test]
async fn test_non_owner_is_forbidden_and_trip_unchanged() {
    let app = TestApp::new();
    let owner = app.token("u1");
    let intruder = app.token("u2");

    let trip = create_trip(&app, &owner, "Kyoto", "2090-04-01", "2090-04-03").await;
    let id = trip["id"].as_str().unwrap_or_default().to_owned();

    let resp = app.get(&format!("/api/trips/{id}"), Some(&intruder)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app
        .put(&format!("/api/trips/{id}"), Some(&intruder), json!({"title": "Mine now"}))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app.delete(&format!("/api/trips/{id}"), Some(&intruder)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app.get(&format!("/api/trips/{id}"), Some(&owner)).await;
    assert_eq!(resp.data(), &trip);
}

#[tokio::test]
async fn test_validation_errors() {
    let app = TestApp::new();
    let owner = app.token("u1");

    let resp = app
        .post(
            "/api/trips",
            Some(&owner),
            Some(json!({"title": "  ", "startDate": "2090-01-01", "endDate": "2090-01-02"})),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["success"], false);

    let trip = create_trip(&app, &owner, "Oslo", "2090-01-01", "2090-01-02").await;
    let id = trip["id"].as_str().unwrap_or_default().to_owned();

    // Ownership and bookkeeping fields are not in the allow-list.
    for body in [
        json!({"userId": "u2"}),
        json!({"createdAt": "2001-01-01"}),
        json!({"places": []}),
    ] {
        let resp = app.put(&format!("/api/trips/{id}"), Some(&owner), body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }

    let resp = app.get(&format!("/api/trips/{id}"), Some(&owner)).await;
    assert_eq!(resp.data()["userId"], "u1");
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::new();
    let owner = app.token("u1");
    let other = app.token("u2");

    let past = create_trip(&app, &owner, "Past", "2001-03-01", "2001-03-05").await;
    let soon = create_trip(&app, &owner, "Soon", "2090-01-01", "2090-01-05").await;
    let later = create_trip(&app, &owner, "Later", "2091-01-01", "2091-01-05").await;
    create_trip(&app, &other, "Not mine", "2090-06-01", "2090-06-02").await;

    let resp = app.get("/api/trips?filter=upcoming", Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        ids(resp.data()),
        [
            soon["id"].as_str().unwrap_or_default(),
            later["id"].as_str().unwrap_or_default()
        ]
    );

    let resp = app.get("/api/trips?filter=past", Some(&owner)).await;
    assert_eq!(ids(resp.data()), [past["id"].as_str().unwrap_or_default()]);

    let resp = app.get("/api/trips?filter=PAST", Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ids(resp.data()), [past["id"].as_str().unwrap_or_default()]);

    let resp = app.get("/api/trips", Some(&owner)).await;
    assert_eq!(ids(resp.data()).len(), 3);

    let resp = app.get("/api/trips?filter=", Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ids(resp.data()).len(), 3);

    let resp = app.get("/api/trips?filter=someday", Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Places
// ============================================================================

#[tokio::test]
async fn test_place_management() {
    let app = TestApp::new();
    let owner = app.token("u1");
    let trip = create_trip(&app, &owner, "Rome", "2090-05-01", "2090-05-03").await;
    let places_uri = format!("/api/trips/{}/places", trip["id"].as_str().unwrap_or_default());

    let p1 = json!({"id": "p1", "name": "Colosseum", "type": "attraction"});
    let resp = app.post(&places_uri, Some(&owner), Some(p1.clone())).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ids(resp.data()), ["p1"]);

    let resp = app.post(&places_uri, Some(&owner), Some(p1)).await;
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = app
        .post(&places_uri, Some(&owner), Some(json!({"id": "p2", "name": "Trevi"})))
        .await;
    assert_eq!(ids(resp.data()), ["p1", "p2"]);

    let resp = app
        .put(
            &places_uri,
            Some(&owner),
            json!({"places": [{"id": "p2", "name": "Trevi"}, {"id": "p1", "name": "Colosseum"}]}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ids(resp.data()), ["p2", "p1"]);

    let resp = app
        .put(
            &places_uri,
            Some(&owner),
            json!({"places": [{"id": "p2", "name": "Trevi"}, {"id": "p9", "name": "Elsewhere"}]}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.delete(&format!("{places_uri}/p1"), Some(&owner)).await;
    assert_eq!(ids(resp.data()), ["p2"]);

    let resp = app.delete(&format!("{places_uri}/p1"), Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ids(resp.data()), ["p2"]);

    let intruder = app.token("u2");
    let resp = app
        .post(&places_uri, Some(&intruder), Some(json!({"name": "Sneaky"})))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_itinerary_uses_rules_without_provider() {
    let app = TestApp::new();
    let owner = app.token("u1");
    let trip = create_trip(&app, &owner, "Porto", "2090-07-01", "2090-07-03").await;
    let id = trip["id"].as_str().unwrap_or_default().to_owned();

    for name in ["Ribeira", "Livraria Lello", "Serralves", "Foz"] {
        app.post(
            &format!("/api/trips/{id}/places"),
            Some(&owner),
            Some(json!({"name": name})),
        )
        .await;
    }

    let resp = app
        .post(&format!("/api/trips/{id}/itinerary"), Some(&owner), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let itinerary = resp.data();
    assert_eq!(itinerary["source"], "rules");
    assert_eq!(itinerary["days"].as_array().map(Vec::len), Some(3));
    assert_eq!(itinerary["days"][0]["places"], json!(["Ribeira", "Livraria Lello"]));
    assert_eq!(itinerary["days"][0]["date"], "2090-07-01");
    // moderate (150) x couple (2) x 3 days
    assert_eq!(itinerary["estimatedBudget"]["total"], "900");

    let intruder = app.token("u2");
    let resp = app
        .post(&format!("/api/trips/{id}/itinerary"), Some(&intruder), None)
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}
