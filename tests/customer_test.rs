//! Customer directory and direct repayment tests.

mod common;

use common::{dec, invoice_payload, spawn_app};
use rust_decimal::Decimal;
use serde_json::Value;

#[tokio::test]
async fn customer_crud_round_trip() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/customers",
            &serde_json::json!({
                "name": "Asha Verma",
                "mobile": "9876543210",
                "email": "asha@example.com",
                "city": "Jaipur",
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["country"], "India");
    assert_eq!(dec(&created["ledger_balance"]), Decimal::ZERO);

    let response = app.get(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["name"], "Asha Verma");
    assert_eq!(fetched["total_invoices"], 0);
    assert_eq!(dec(&fetched["total_pending"]), Decimal::ZERO);

    let response = app
        .put(
            &format!("/api/customers/{}", id),
            &serde_json::json!({ "name": "Asha Sharma", "city": "Jaipur" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Asha Sharma");

    let response = app.delete(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 200);

    let response = app.get(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn customer_update_without_ledger_balance_keeps_it() {
    let app = spawn_app().await;
    let id = app.create_customer("Kiran", "2500.00", false).await;

    let response = app
        .put(
            &format!("/api/customers/{}", id),
            &serde_json::json!({ "name": "Kiran" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(dec(&updated["ledger_balance"]), "2500.00".parse().unwrap());
}

#[tokio::test]
async fn customer_list_filter_separates_gst_and_regular() {
    let app = spawn_app().await;
    app.create_customer("Regular One", "0", false).await;
    app.create_customer("Regular Two", "0", false).await;
    app.create_customer("GST Traders", "0", true).await;

    let all: Vec<Value> = app.get("/api/customers").await.json().await.unwrap();
    assert_eq!(all.len(), 3);

    let gst: Vec<Value> = app
        .get("/api/customers?filter=gst")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(gst.len(), 1);
    assert_eq!(gst[0]["name"], "GST Traders");

    let regular: Vec<Value> = app
        .get("/api/customers?filter=regular")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(regular.len(), 2);
}

#[tokio::test]
async fn invalid_customer_payload_is_rejected() {
    let app = spawn_app().await;

    let response = app
        .post("/api/customers", &serde_json::json!({ "name": "" }))
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn direct_repayment_reduces_ledger_balance() {
    let app = spawn_app().await;
    let id = app.create_customer("Debtor", "1500.00", false).await;

    let response = app
        .post(
            &format!("/api/customers/{}/repayment", id),
            &serde_json::json!({ "amount": "400.00", "payment_method": "upi" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(dec(&outcome["previous_balance"]), "1500.00".parse().unwrap());
    assert_eq!(dec(&outcome["repayment_amount"]), "400.00".parse().unwrap());
    assert_eq!(dec(&outcome["new_balance"]), "1100.00".parse().unwrap());
    assert_eq!(outcome["payment_method"], "upi");

    let customer: Value = app
        .get(&format!("/api/customers/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&customer["ledger_balance"]), "1100.00".parse().unwrap());
}

#[tokio::test]
async fn repayment_can_push_ledger_negative() {
    let app = spawn_app().await;
    let id = app.create_customer("Overpayer", "100.00", false).await;

    let response = app
        .post(
            &format!("/api/customers/{}/repayment", id),
            &serde_json::json!({ "amount": "250.00" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(dec(&outcome["new_balance"]), "-150.00".parse().unwrap());
}

#[tokio::test]
async fn repayment_rejects_non_positive_amount() {
    let app = spawn_app().await;
    let id = app.create_customer("Debtor", "500.00", false).await;

    let response = app
        .post(
            &format!("/api/customers/{}/repayment", id),
            &serde_json::json!({ "amount": "0" }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .post(
            &format!("/api/customers/{}/repayment", id),
            &serde_json::json!({ "amount": "-10" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn repayment_for_missing_customer_is_404() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/customers/999999/repayment",
            &serde_json::json!({ "amount": "100" }),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn customer_with_invoices_cannot_be_deleted() {
    let app = spawn_app().await;
    let id = app.create_customer("Invoiced", "0", false).await;

    let response = app
        .post("/api/invoices", &invoice_payload(id, "non_gst", "500.00", "0"))
        .await;
    assert_eq!(response.status(), 201);

    let response = app.delete(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn customer_transactions_lists_their_invoices_only() {
    let app = spawn_app().await;
    let a = app.create_customer("Customer A", "0", false).await;
    let b = app.create_customer("Customer B", "0", false).await;

    app.post("/api/invoices", &invoice_payload(a, "non_gst", "500.00", "0"))
        .await;
    app.post("/api/invoices", &invoice_payload(a, "non_gst", "300.00", "0"))
        .await;
    app.post("/api/invoices", &invoice_payload(b, "non_gst", "900.00", "0"))
        .await;

    let transactions: Vec<Value> = app
        .get(&format!("/api/customers/{}/transactions", a))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(transactions.len(), 2);
    for t in &transactions {
        assert_eq!(t["customer_id"].as_i64().unwrap(), a);
    }

    let response = app.get("/api/customers/999999/transactions").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn total_pending_includes_gst_but_ledger_does_not() {
    let app = spawn_app().await;
    let id = app.create_customer("Mixed", "0", true).await;

    // A GST invoice with an unpaid balance feeds total_pending but never
    // posts to the ledger.
    let response = app
        .post("/api/invoices", &invoice_payload(id, "gst", "1000.00", "0"))
        .await;
    assert_eq!(response.status(), 201);

    let customer: Value = app
        .get(&format!("/api/customers/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&customer["total_pending"]), "1000.00".parse().unwrap());
    assert_eq!(dec(&customer["ledger_balance"]), Decimal::ZERO);
    assert_eq!(customer["total_invoices"], 1);
}
