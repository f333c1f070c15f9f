//! Cart to order checkout and the order lifecycle.
//!
//! Requires a migrated and seeded database and the API server running.

use bookstore_integration_tests::{admin, create_book, expect_error, expect_json, new_user};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_merges_lines_and_totals() {
    let admin = admin().await;
    let user = new_user("cart").await;
    let book = create_book(&admin, "Cart Merge", "Tech", 10.0).await;

    let body = expect_json(
        user.api.post("/cart/items", &json!({ "book_id": book, "quantity": 2 })).await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Added to cart");
    let item_id = body["data"]["cart_item_id"].as_i64().unwrap();

    let body = expect_json(
        user.api.post("/cart/items", &json!({ "book_id": book })).await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(body["data"]["cart_item_id"], item_id);
    assert_eq!(body["data"]["quantity"], 3);

    let body = expect_json(user.api.get("/cart/items").await, StatusCode::OK).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["book"]["title"], "Cart Merge");

    let body = expect_json(user.api.get("/cart/summary").await, StatusCode::OK).await;
    assert_eq!(body["data"]["total_quantity"], 3);
    assert_eq!(body["data"]["total_price"], 30.0);

    let body = expect_json(
        user.api
            .patch(&format!("/cart/items/{item_id}"), &json!({ "quantity": 1 }))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["quantity"], 1);

    let body = expect_json(
        user.api.delete(&format!("/cart/items/{item_id}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["cart_item_id"], item_id);

    let body = expect_json(user.api.get("/cart/summary").await, StatusCode::OK).await;
    assert_eq!(body["data"]["total_quantity"], 0);
    assert_eq!(body["data"]["total_price"], 0.0);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_rejects_unknown_books_and_foreign_items() {
    let owner = new_user("owner").await;
    let other = new_user("other").await;

    let response = owner
        .api
        .post("/cart/items", &json!({ "book_id": 2_147_483_647 }))
        .await;
    let body = expect_error(response, StatusCode::NOT_FOUND, "BOOK_NOT_FOUND").await;
    assert_eq!(body["details"]["book_id"], 2_147_483_647);

    let admin = admin().await;
    let book = create_book(&admin, "Not Yours", "Art", 4.0).await;
    let body = expect_json(
        owner.api.post("/cart/items", &json!({ "book_id": book })).await,
        StatusCode::CREATED,
    )
    .await;
    let item_id = body["data"]["cart_item_id"].as_i64().unwrap();

    let response = other
        .api
        .patch(&format!("/cart/items/{item_id}"), &json!({ "quantity": 5 }))
        .await;
    expect_error(response, StatusCode::NOT_FOUND, "CART_ITEM_NOT_FOUND").await;

    let response = other.api.delete(&format!("/cart/items/{item_id}")).await;
    expect_error(response, StatusCode::NOT_FOUND, "CART_ITEM_NOT_FOUND").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_empty_cart_cannot_be_ordered() {
    let user = new_user("empty").await;

    let response = user.api.post("/orders", &json!({})).await;
    expect_error(response, StatusCode::BAD_REQUEST, "CART_EMPTY").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_place_and_cancel_order() {
    let admin = admin().await;
    let user = new_user("order").await;
    let first = create_book(&admin, "Order One", "History", 12.5).await;
    let second = create_book(&admin, "Order Two", "History", 7.5).await;

    user.api
        .post("/cart/items", &json!({ "book_id": first, "quantity": 2 }))
        .await;
    user.api.post("/cart/items", &json!({ "book_id": second })).await;

    let body = expect_json(user.api.post("/orders", &json!({})).await, StatusCode::CREATED).await;
    let order = &body["data"];
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total_price"], 32.5);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    let order_id = order["order_id"].as_i64().unwrap();

    let body = expect_json(user.api.get("/cart/items").await, StatusCode::OK).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    let body = expect_json(user.api.get("/orders").await, StatusCode::OK).await;
    assert_eq!(body["data"]["totalElements"], 1);
    assert_eq!(body["data"]["content"][0]["order_id"], order_id);

    let body = expect_json(
        user.api.get(&format!("/orders/{order_id}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["items"][0]["price"], 12.5);

    let body = expect_json(
        user.api
            .patch(&format!("/orders/{order_id}/cancel"), &json!({}))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["status"], "CANCELED");

    let response = user
        .api
        .patch(&format!("/orders/{order_id}/cancel"), &json!({}))
        .await;
    expect_error(response, StatusCode::CONFLICT, "STATE_CONFLICT").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_orders_are_private() {
    let admin = admin().await;
    let owner = new_user("private").await;
    let other = new_user("snoop").await;
    let book = create_book(&admin, "Private Order", "Art", 2.0).await;

    owner.api.post("/cart/items", &json!({ "book_id": book })).await;
    let body = expect_json(owner.api.post("/orders", &json!({})).await, StatusCode::CREATED).await;
    let order_id = body["data"]["order_id"].as_i64().unwrap();

    let response = other.api.get(&format!("/orders/{order_id}")).await;
    expect_error(response, StatusCode::NOT_FOUND, "ORDER_NOT_FOUND").await;

    let response = other
        .api
        .patch(&format!("/orders/{order_id}/cancel"), &json!({}))
        .await;
    expect_error(response, StatusCode::NOT_FOUND, "ORDER_NOT_FOUND").await;

    let body = expect_json(
        admin.get(&format!("/orders/admin/{order_id}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["user_id"], owner.id);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_status_transitions() {
    let admin = admin().await;
    let user = new_user("lifecycle").await;
    let book = create_book(&admin, "Lifecycle", "Science", 20.0).await;

    user.api.post("/cart/items", &json!({ "book_id": book })).await;
    let body = expect_json(user.api.post("/orders", &json!({})).await, StatusCode::CREATED).await;
    let order_id = body["data"]["order_id"].as_i64().unwrap();
    let path = format!("/orders/admin/{order_id}/status");

    let body = expect_json(
        admin.patch(&path, &json!({ "status": "paid" })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["status"], "PAID");

    let response = admin.patch(&path, &json!({ "status": "PENDING" })).await;
    expect_error(response, StatusCode::CONFLICT, "STATE_CONFLICT").await;

    let response = user
        .api
        .patch(&format!("/orders/{order_id}/cancel"), &json!({}))
        .await;
    expect_error(response, StatusCode::CONFLICT, "STATE_CONFLICT").await;

    let body = expect_json(
        admin
            .get(&format!("/orders/admin?status=PAID&userId={}", user.id))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["totalElements"], 1);

    let response = admin.get("/orders/admin?status=SHIPPED").await;
    expect_error(response, StatusCode::BAD_REQUEST, "INVALID_QUERY_PARAM").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_quantity_caps_and_large_totals() {
    let admin = admin().await;
    let user = new_user("cap").await;
    let book = create_book(&admin, "Costly Folio", "Art", 99_999_999.99).await;

    let response = user
        .api
        .post("/cart/items", &json!({ "book_id": book, "quantity": 2_000_000 }))
        .await;
    expect_error(response, StatusCode::BAD_REQUEST, "CART_INVALID_QUANTITY").await;

    expect_json(
        user.api.post("/cart/items", &json!({ "book_id": book, "quantity": 60 })).await,
        StatusCode::CREATED,
    )
    .await;

    // Merging past the per-line limit leaves the line as it was
    let response = user
        .api
        .post("/cart/items", &json!({ "book_id": book, "quantity": 40 }))
        .await;
    expect_error(response, StatusCode::BAD_REQUEST, "CART_INVALID_QUANTITY").await;

    let body = expect_json(user.api.get("/cart/summary").await, StatusCode::OK).await;
    assert_eq!(body["data"]["total_quantity"], 60);

    let second = create_book(&admin, "Costly Folio II", "Art", 99_999_999.99).await;
    expect_json(
        user.api.post("/cart/items", &json!({ "book_id": second, "quantity": 99 })).await,
        StatusCode::CREATED,
    )
    .await;

    expect_json(user.api.get("/cart/summary").await, StatusCode::OK).await;
    let body = expect_json(user.api.post("/orders", &json!({})).await, StatusCode::CREATED).await;
    assert_eq!(body["data"]["status"], "PENDING");
}
