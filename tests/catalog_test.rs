//! Inventory catalog tests: item groups and items.

mod common;

use common::{dec, spawn_app};
use serde_json::Value;

#[tokio::test]
async fn item_group_crud_round_trip() {
    let app = spawn_app().await;

    let response = app
        .post(
            "/api/item-groups",
            &serde_json::json!({ "name": "Rings", "description": "Gold rings" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let group: Value = response.json().await.unwrap();
    let id = group["id"].as_i64().unwrap();

    let response = app
        .put(
            &format!("/api/item-groups/{}", id),
            &serde_json::json!({ "name": "Gold Rings" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Gold Rings");

    let groups: Vec<Value> = app.get("/api/item-groups").await.json().await.unwrap();
    assert_eq!(groups.len(), 1);

    let response = app.delete(&format!("/api/item-groups/{}", id)).await;
    assert_eq!(response.status(), 200);

    let groups: Vec<Value> = app.get("/api/item-groups").await.json().await.unwrap();
    assert!(groups.is_empty());
}

#[tokio::test]
async fn item_group_with_items_cannot_be_deleted() {
    let app = spawn_app().await;

    let group: Value = app
        .post("/api/item-groups", &serde_json::json!({ "name": "Chains" }))
        .await
        .json()
        .await
        .unwrap();
    let group_id = group["id"].as_i64().unwrap();

    let response = app
        .post(
            "/api/items",
            &serde_json::json!({ "name": "Rope Chain", "group_id": group_id, "price": "45000.00" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let item: Value = response.json().await.unwrap();

    let response = app.delete(&format!("/api/item-groups/{}", group_id)).await;
    assert_eq!(response.status(), 409);

    // After removing the item, the group can go.
    let response = app
        .delete(&format!("/api/items/{}", item["id"].as_i64().unwrap()))
        .await;
    assert_eq!(response.status(), 200);
    let response = app.delete(&format!("/api/item-groups/{}", group_id)).await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn item_list_joins_group_name() {
    let app = spawn_app().await;

    let group: Value = app
        .post("/api/item-groups", &serde_json::json!({ "name": "Bangles" }))
        .await
        .json()
        .await
        .unwrap();
    let group_id = group["id"].as_i64().unwrap();

    app.post(
        "/api/items",
        &serde_json::json!({ "name": "Kada", "group_id": group_id, "price": "30000.00" }),
    )
    .await;
    app.post(
        "/api/items",
        &serde_json::json!({ "name": "Loose Stone" }),
    )
    .await;

    let items: Vec<Value> = app.get("/api/items").await.json().await.unwrap();
    assert_eq!(items.len(), 2);

    let kada = items.iter().find(|i| i["name"] == "Kada").unwrap();
    assert_eq!(kada["group_name"], "Bangles");
    assert_eq!(dec(&kada["price"]), "30000.00".parse().unwrap());

    let stone = items.iter().find(|i| i["name"] == "Loose Stone").unwrap();
    assert!(stone["group_name"].is_null());
}

#[tokio::test]
async fn item_update_and_missing_ids() {
    let app = spawn_app().await;

    let item: Value = app
        .post("/api/items", &serde_json::json!({ "name": "Pendant", "price": "12000.00" }))
        .await
        .json()
        .await
        .unwrap();
    let id = item["id"].as_i64().unwrap();

    let response = app
        .put(
            &format!("/api/items/{}", id),
            &serde_json::json!({ "name": "Pendant", "price": "12500.00" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(dec(&updated["price"]), "12500.00".parse().unwrap());

    assert_eq!(
        app.put("/api/items/999999", &serde_json::json!({ "name": "X" }))
            .await
            .status(),
        404
    );
    assert_eq!(app.delete("/api/items/999999").await.status(), 404);
    assert_eq!(
        app.put("/api/item-groups/999999", &serde_json::json!({ "name": "X" }))
            .await
            .status(),
        404
    );
}
