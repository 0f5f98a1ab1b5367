//! Payment-promise reminder tests.

mod common;

use chrono::{Duration, FixedOffset, Utc};
use common::{dec, spawn_app};
use serde_json::Value;

fn ist_today() -> chrono::NaiveDate {
    let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
    Utc::now().with_timezone(&ist).date_naive()
}

#[tokio::test]
async fn reminder_lifecycle() {
    let app = spawn_app().await;
    let customer_id = app.create_customer("Promiser", "5000.00", false).await;

    let response = app
        .post(
            "/api/reminders",
            &serde_json::json!({
                "customer_id": customer_id,
                "reminder_date": ist_today().to_string(),
                "amount_promised": "2000.00",
                "notes": "Promised after salary day",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let reminder: Value = response.json().await.unwrap();
    let reminder_id = reminder["id"].as_i64().unwrap();
    assert_eq!(reminder["status"], "pending");
    assert_eq!(dec(&reminder["amount_promised"]), "2000.00".parse().unwrap());

    let pending: Vec<Value> = app.get("/api/reminders").await.json().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["customer_name"], "Promiser");

    let today: Vec<Value> = app.get("/api/reminders/today").await.json().await.unwrap();
    assert_eq!(today.len(), 1);

    let response = app
        .put_empty(&format!("/api/reminders/{}/complete", reminder_id))
        .await;
    assert_eq!(response.status(), 200);

    let pending: Vec<Value> = app.get("/api/reminders").await.json().await.unwrap();
    assert!(pending.is_empty());
    let today: Vec<Value> = app.get("/api/reminders/today").await.json().await.unwrap();
    assert!(today.is_empty());
}

#[tokio::test]
async fn today_excludes_future_reminders() {
    let app = spawn_app().await;
    let customer_id = app.create_customer("Future Promiser", "0", false).await;

    let next_week = ist_today() + Duration::days(7);
    app.post(
        "/api/reminders",
        &serde_json::json!({
            "customer_id": customer_id,
            "reminder_date": next_week.to_string(),
            "amount_promised": "500.00",
        }),
    )
    .await;

    let pending: Vec<Value> = app.get("/api/reminders").await.json().await.unwrap();
    assert_eq!(pending.len(), 1);
    let today: Vec<Value> = app.get("/api/reminders/today").await.json().await.unwrap();
    assert!(today.is_empty());
}

#[tokio::test]
async fn reminder_joins_invoice_number_when_linked() {
    let app = spawn_app().await;
    let customer_id = app.create_customer("Linked Promiser", "0", false).await;

    let invoice: Value = app
        .post(
            "/api/invoices",
            &common::invoice_payload(customer_id, "non_gst", "800.00", "0"),
        )
        .await
        .json()
        .await
        .unwrap();

    app.post(
        "/api/reminders",
        &serde_json::json!({
            "customer_id": customer_id,
            "invoice_id": invoice["id"],
            "reminder_date": ist_today().to_string(),
            "amount_promised": "800.00",
        }),
    )
    .await;

    let pending: Vec<Value> = app.get("/api/reminders").await.json().await.unwrap();
    assert_eq!(pending[0]["invoice_number"], invoice["invoice_number"]);
}

#[tokio::test]
async fn reminder_validation_and_missing_ids() {
    let app = spawn_app().await;

    // Unknown customer.
    let response = app
        .post(
            "/api/reminders",
            &serde_json::json!({
                "customer_id": 999999,
                "reminder_date": ist_today().to_string(),
                "amount_promised": "100.00",
            }),
        )
        .await;
    assert_eq!(response.status(), 404);

    // Non-positive promised amount.
    let customer_id = app.create_customer("Zero Promiser", "0", false).await;
    let response = app
        .post(
            "/api/reminders",
            &serde_json::json!({
                "customer_id": customer_id,
                "reminder_date": ist_today().to_string(),
                "amount_promised": "0",
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    assert_eq!(app.put_empty("/api/reminders/999999/complete").await.status(), 404);
    assert_eq!(app.delete("/api/reminders/999999").await.status(), 404);
}

#[tokio::test]
async fn reminder_delete_removes_it() {
    let app = spawn_app().await;
    let customer_id = app.create_customer("Deleted Promiser", "0", false).await;

    let reminder: Value = app
        .post(
            "/api/reminders",
            &serde_json::json!({
                "customer_id": customer_id,
                "reminder_date": ist_today().to_string(),
                "amount_promised": "300.00",
            }),
        )
        .await
        .json()
        .await
        .unwrap();

    let response = app
        .delete(&format!("/api/reminders/{}", reminder["id"].as_i64().unwrap()))
        .await;
    assert_eq!(response.status(), 200);

    let pending: Vec<Value> = app.get("/api/reminders").await.json().await.unwrap();
    assert!(pending.is_empty());
}
