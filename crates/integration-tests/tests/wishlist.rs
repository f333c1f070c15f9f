//! Wishlist management.
//!
//! Requires a migrated and seeded database and the API server running.

use bookstore_integration_tests::{admin, create_book, expect_error, expect_json, new_user};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_add_is_idempotent() {
    let admin = admin().await;
    let user = new_user("wish").await;
    let book = create_book(&admin, "Wanted", "Fiction", 14.0).await;

    let body = expect_json(
        user.api.post("/wishlist/items", &json!({ "book_id": book })).await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(body["message"], "Added to wishlist");
    let wishlist_id = body["data"]["wishlist_id"].as_i64().unwrap();

    let body = expect_json(
        user.api.post("/wishlist/items", &json!({ "book_id": book })).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["message"], "Already in wishlist");
    assert_eq!(body["data"]["wishlist_id"], wishlist_id);

    let body = expect_json(user.api.get("/wishlist").await, StatusCode::OK).await;
    assert_eq!(body["data"]["count"], 1);
    let line = &body["data"]["items"][0];
    assert_eq!(line["wishlist_id"], wishlist_id);
    assert_eq!(line["book"]["title"], "Wanted");
    assert_eq!(line["book"]["isBestseller"], false);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_remove_by_entry_and_by_book() {
    let admin = admin().await;
    let user = new_user("unwish").await;
    let first = create_book(&admin, "Unwanted One", "Tech", 3.0).await;
    let second = create_book(&admin, "Unwanted Two", "Tech", 4.0).await;

    let body = expect_json(
        user.api.post("/wishlist/items", &json!({ "book_id": first })).await,
        StatusCode::CREATED,
    )
    .await;
    let wishlist_id = body["data"]["wishlist_id"].as_i64().unwrap();
    user.api.post("/wishlist/items", &json!({ "book_id": second })).await;

    let body = expect_json(
        user.api.delete(&format!("/wishlist/items/{wishlist_id}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["wishlist_id"], wishlist_id);

    let response = user.api.delete(&format!("/wishlist/items/{wishlist_id}")).await;
    expect_error(response, StatusCode::NOT_FOUND, "WISHLIST_ITEM_NOT_FOUND").await;

    let body = expect_json(
        user.api
            .delete(&format!("/wishlist/items/book/{second}"))
            .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["data"]["book_id"], second);

    let body = expect_json(user.api.get("/wishlist").await, StatusCode::OK).await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_clear_and_unknown_book() {
    let admin = admin().await;
    let user = new_user("clearwish").await;
    let book = create_book(&admin, "Cleared", "Art", 5.0).await;

    let response = user
        .api
        .post("/wishlist/items", &json!({ "book_id": 2_147_483_647 }))
        .await;
    expect_error(response, StatusCode::NOT_FOUND, "BOOK_NOT_FOUND").await;

    user.api.post("/wishlist/items", &json!({ "book_id": book })).await;

    let body = expect_json(user.api.delete("/wishlist").await, StatusCode::OK).await;
    assert_eq!(body["message"], "Wishlist cleared");

    let body = expect_json(user.api.get("/wishlist").await, StatusCode::OK).await;
    assert_eq!(body["data"]["count"], 0);
}
