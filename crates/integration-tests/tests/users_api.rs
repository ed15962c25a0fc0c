//! End-to-end tests for `/api/users`.

use axum::http::StatusCode;
use serde_json::json;
use tripnest_integration_tests::TestApp;

#[tokio::test]
async fn test_profile_created_on_first_access() {
    let app = TestApp::new();
    let token = app.token("marta");

    let resp = app.get("/api/users/marta", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.message(), "Profile not found");

    let resp = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let me = resp.data().clone();
    assert_eq!(me["uid"], "marta");
    assert_eq!(me["email"], "marta@example.com");
    assert_eq!(me["displayName"], "marta");
    assert_eq!(me["stats"]["tripsCount"], 0);

    let resp = app.get("/api/users/marta", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["uid"], me["uid"]);
    assert_eq!(resp.data()["displayName"], me["displayName"]);
    assert_eq!(resp.data()["stats"], me["stats"]);
    assert!(resp.data().get("email").is_none());

    let resp = app.get("/api/users/me", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile_allow_list() {
    let app = TestApp::new();
    let token = app.token("marta");

    let resp = app
        .put(
            "/api/users/me",
            Some(&token),
            json!({"bio": "Slow travel", "photoURL": "https://img.example/m.png"}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["bio"], "Slow travel");
    assert_eq!(resp.data()["photoURL"], "https://img.example/m.png");
    assert_eq!(resp.data()["email"], "marta@example.com");

    for body in [
        json!({"email": "someone@else.com"}),
        json!({"stats": {"tripsCount": 99}}),
        json!({"uid": "root"}),
    ] {
        let resp = app.put("/api/users/me", Some(&token), body).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    }

    let resp = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(resp.data()["uid"], "marta");
    assert_eq!(resp.data()["stats"]["tripsCount"], 0);
}

#[tokio::test]
async fn test_stats_follow_activity() {
    let app = TestApp::new();
    let token = app.token("marta");

    app.post(
        "/api/trips",
        Some(&token),
        Some(json!({"title": "Rome", "startDate": "2090-01-01", "endDate": "2090-01-03"})),
    )
    .await;
    app.post(
        "/api/stories",
        Some(&token),
        Some(json!({"title": "Gelato", "content": "Pistachio wins", "isPublic": false})),
    )
    .await;

    let resp = app.get("/api/users/me", Some(&token)).await;
    assert_eq!(resp.data()["stats"]["tripsCount"], 1);
    assert_eq!(resp.data()["stats"]["storiesCount"], 1);
}
