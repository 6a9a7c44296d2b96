use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use winerama::api::{create_router, AppState};

fn create_test_server() -> TestServer {
    let state = AppState::in_memory();
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_user(server: &TestServer, username: &str) {
    server
        .post("/users")
        .json(&json!({ "username": username }))
        .await
        .assert_status(StatusCode::CREATED);
}

async fn create_wine(server: &TestServer, name: &str) -> i64 {
    let response = server.post("/wines").json(&json!({ "name": name })).await;
    response.assert_status(StatusCode::CREATED);
    let wine: Value = response.json();
    wine["id"].as_i64().unwrap()
}

async fn post_review(server: &TestServer, wine_id: i64, user_name: &str, rating: i32) -> Value {
    let response = server
        .post("/reviews")
        .json(&json!({
            "wine_id": wine_id,
            "user_name": user_name,
            "rating": rating,
            "comment": "Tasted blind"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let server = create_test_server();
    create_user(&server, "ana").await;

    let response = server.post("/users").json(&json!({ "username": "ana" })).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_overlong_usernames_are_bad_requests() {
    let server = create_test_server();
    let too_long = "a".repeat(101);

    let response = server.post("/users").json(&json!({ "username": &too_long })).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let wine_id = create_wine(&server, "Gruner Veltliner").await;
    let response = server
        .post("/reviews")
        .json(&json!({ "wine_id": wine_id, "user_name": &too_long, "rating": 4 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_get_wine() {
    let server = create_test_server();
    let rioja = create_wine(&server, "Rioja Reserva").await;
    create_wine(&server, "Albarino").await;

    post_review(&server, rioja, "ana", 4).await;
    post_review(&server, rioja, "bo", 3).await;

    // Wines come back sorted by name, descending
    let response = server.get("/wines").await;
    response.assert_status_ok();
    let wines: Vec<Value> = response.json();
    assert_eq!(wines.len(), 2);
    assert_eq!(wines[0]["name"], "Rioja Reserva");
    assert_eq!(wines[0]["average_rating"], 3.5);
    assert_eq!(wines[0]["review_count"], 2);
    assert_eq!(wines[1]["average_rating"], Value::Null);

    let response = server.get(&format!("/wines/{}", rioja)).await;
    response.assert_status_ok();
    let detail: Value = response.json();
    assert_eq!(detail["name"], "Rioja Reserva");
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_wine_is_not_found() {
    let server = create_test_server();
    let response = server.get("/wines/42").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_reviews_are_rejected() {
    let server = create_test_server();
    let wine_id = create_wine(&server, "Barolo").await;

    let response = server
        .post("/reviews")
        .json(&json!({ "wine_id": wine_id, "user_name": "ana", "rating": 6 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/reviews")
        .json(&json!({ "wine_id": wine_id + 100, "user_name": "ana", "rating": 3 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let reviews: Vec<Value> = server.get("/reviews").await.json();
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_fifth_review_rebuilds_clusters() {
    let server = create_test_server();
    for name in ["ana", "bo", "cy"] {
        create_user(&server, name).await;
    }
    let red = create_wine(&server, "Syrah").await;
    let white = create_wine(&server, "Riesling").await;

    post_review(&server, red, "ana", 5).await;
    post_review(&server, white, "ana", 1).await;
    post_review(&server, red, "bo", 5).await;
    post_review(&server, white, "cy", 5).await;

    let clusters: Vec<Value> = server.get("/clusters").await.json();
    assert!(clusters.is_empty());

    post_review(&server, red, "cy", 1).await;

    let response = server.get("/clusters").await;
    response.assert_status_ok();
    let clusters: Vec<Value> = response.json();
    assert_eq!(clusters.len(), 2);

    let mut members: Vec<String> = clusters
        .iter()
        .flat_map(|c| c["members"].as_array().unwrap().clone())
        .map(|m| m.as_str().unwrap().to_string())
        .collect();
    members.sort();
    assert_eq!(members, vec!["ana", "bo", "cy"]);
}

#[tokio::test]
async fn test_rebuild_without_users_is_skipped() {
    let server = create_test_server();
    let response = server.post("/clusters/rebuild").await;
    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["status"], "skipped");
}

#[tokio::test]
async fn test_rebuild_reports_completed_pass() {
    let server = create_test_server();
    create_user(&server, "ana").await;

    let response = server.post("/clusters/rebuild").await;
    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["users"], 1);
    assert_eq!(outcome["clusters"], 1);

    let clusters: Vec<Value> = server.get("/clusters").await.json();
    assert_eq!(clusters[0]["members"], json!(["ana"]));
}

#[tokio::test]
async fn test_latest_reviews_are_capped() {
    let server = create_test_server();
    let wine_id = create_wine(&server, "Chianti").await;

    let mut last_id = 0;
    for i in 0..12 {
        let review = post_review(&server, wine_id, &format!("taster{}", i), 3).await;
        last_id = review["id"].as_i64().unwrap();
    }

    let response = server.get("/reviews").await;
    response.assert_status_ok();
    let reviews: Vec<Value> = response.json();
    assert_eq!(reviews.len(), 9);
    assert_eq!(reviews[0]["id"], last_id);

    let response = server.get(&format!("/reviews/{}", last_id)).await;
    response.assert_status_ok();
    let review: Value = response.json();
    assert_eq!(review["user_name"], "taster11");

    server.get("/reviews/999").await.assert_status(StatusCode::NOT_FOUND);
}
