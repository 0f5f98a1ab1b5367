//! Dashboard aggregate tests.

mod common;

use common::{dec, invoice_payload, spawn_app};
use rust_decimal::Decimal;
use serde_json::Value;

#[tokio::test]
async fn empty_shop_has_zeroed_stats() {
    let app = spawn_app().await;

    let stats: Value = app.get("/api/dashboard/stats").await.json().await.unwrap();
    assert_eq!(stats["total_customers"], 0);
    assert_eq!(stats["total_invoices"], 0);
    assert_eq!(dec(&stats["pending_amount"]), Decimal::ZERO);
    assert_eq!(dec(&stats["today_sales"]), Decimal::ZERO);
}

#[tokio::test]
async fn stats_count_regular_customers_only() {
    let app = spawn_app().await;
    app.create_customer("Regular One", "0", false).await;
    app.create_customer("Regular Two", "0", false).await;
    app.create_customer("GST Traders", "0", true).await;

    let stats: Value = app.get("/api/dashboard/stats").await.json().await.unwrap();
    assert_eq!(stats["total_customers"], 2);
}

#[tokio::test]
async fn stats_aggregate_invoices_and_sales() {
    let app = spawn_app().await;
    let id = app.create_customer("Buyer", "0", false).await;

    // 500 unpaid and 300 fully paid, both created today.
    app.post("/api/invoices", &invoice_payload(id, "non_gst", "500.00", "0"))
        .await;
    app.post("/api/invoices", &invoice_payload(id, "non_gst", "300.00", "300.00"))
        .await;

    let stats: Value = app.get("/api/dashboard/stats").await.json().await.unwrap();
    assert_eq!(stats["total_invoices"], 2);
    assert_eq!(dec(&stats["pending_amount"]), "500.00".parse().unwrap());
    assert_eq!(dec(&stats["today_sales"]), "800.00".parse().unwrap());
}

#[tokio::test]
async fn pending_amount_includes_gst_balances() {
    let app = spawn_app().await;
    let id = app.create_customer("GST Buyer", "0", true).await;

    app.post("/api/invoices", &invoice_payload(id, "gst", "1200.00", "200.00"))
        .await;

    let stats: Value = app.get("/api/dashboard/stats").await.json().await.unwrap();
    assert_eq!(dec(&stats["pending_amount"]), "1000.00".parse().unwrap());
}
