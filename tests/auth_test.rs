//! Authentication and service status tests.

mod common;

use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn health_check_is_public() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn metrics_endpoint_is_public() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("jewelbooks_"));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn login_rejects_unknown_user() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": "nobody", "password": "admin123" }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn login_returns_token_and_sanitized_user() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": "admin", "password": "admin123" }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn business_routes_require_bearer_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/api/customers", app.address))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(format!("{}/api/customers", app.address))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 401);
}
