//! Profile and user administration.
//!
//! Requires a migrated and seeded database and the API server running.

use bookstore_integration_tests::{
    Api, TEST_PASSWORD, admin, expect_error, expect_json, login, new_user,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_update_own_name() {
    let user = new_user("rename").await;

    let response = user.api.patch("/users/me", &json!({ "name": "  Renamed  " })).await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["name"], "Renamed");

    let response = user.api.patch("/users/me", &json!({ "name": "   " })).await;
    expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_lists_users() {
    let admin = admin().await;

    let body = expect_json(admin.get("/users?size=5").await, StatusCode::OK).await;
    assert_eq!(body["size"], 5);
    assert!(body["totalElements"].as_i64().unwrap() >= 1);
    assert_eq!(body["sort"], "created_at,DESC");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_promote_takes_effect_after_refresh() {
    let admin = admin().await;
    let user = new_user("promote").await;

    let response = user.api.get("/users").await;
    expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let response = admin
        .patch(&format!("/users/{}/role", user.id), &json!({ "role": "admin" }))
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["role"], "ADMIN");

    let (access, _) = login(&user.email, TEST_PASSWORD).await;
    let response = Api::new().with_token(access).get("/users").await;
    expect_json(response, StatusCode::OK).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_invalid_role_is_rejected() {
    let admin = admin().await;
    let user = new_user("badrole").await;

    let response = admin
        .patch(&format!("/users/{}/role", user.id), &json!({ "role": "OWNER" }))
        .await;
    expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_deactivated_user_is_locked_out() {
    let admin = admin().await;
    let user = new_user("deactivate").await;

    let response = admin
        .patch(&format!("/users/{}/deactivate", user.id), &json!({}))
        .await;
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["isActive"], false);

    let response = Api::new()
        .post(
            "/auth/login",
            &json!({ "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;

    let response = user.api.get("/users/me").await;
    expect_error(response, StatusCode::FORBIDDEN, "FORBIDDEN").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_unknown_user_is_not_found() {
    let admin = admin().await;

    let response = admin
        .patch("/users/2147483647/deactivate", &json!({}))
        .await;
    expect_error(response, StatusCode::NOT_FOUND, "USER_NOT_FOUND").await;
}
