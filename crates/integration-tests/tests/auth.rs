//! Signup, login and token refresh against a running server.
//!
//! Requires a migrated and seeded database and the API server running.
//! Run with: cargo test -p bookstore-integration-tests -- --ignored

use bookstore_integration_tests::{
    Api, TEST_PASSWORD, expect_error, expect_json, login, new_user, unique_email,
};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_signup_then_login() {
    let user = new_user("auth").await;

    let body = expect_json(user.api.get("/users/me").await, StatusCode::OK).await;
    assert_eq!(body["email"], user.email.as_str());
    assert_eq!(body["role"], "USER");
    assert_eq!(body["isActive"], true);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_signup_conflicts() {
    let user = new_user("dup").await;

    let response = Api::new()
        .post(
            "/auth/signup",
            &json!({ "name": "Again", "email": user.email, "password": TEST_PASSWORD }),
        )
        .await;
    expect_error(response, StatusCode::CONFLICT, "DUPLICATE_RESOURCE").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_signup_validation() {
    let api = Api::new();

    let response = api
        .post(
            "/auth/signup",
            &json!({ "name": "Shorty", "email": unique_email("weak"), "password": "short" }),
        )
        .await;
    expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;

    let response = api
        .post(
            "/auth/signup",
            &json!({ "name": "No At", "email": "not-an-email", "password": TEST_PASSWORD }),
        )
        .await;
    expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION_FAILED").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let user = new_user("creds").await;
    let api = Api::new();

    let wrong_password = api
        .post(
            "/auth/login",
            &json!({ "email": user.email, "password": "Wrong-pass-1" }),
        )
        .await;
    let wrong = expect_error(wrong_password, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let unknown_email = api
        .post(
            "/auth/login",
            &json!({ "email": unique_email("ghost"), "password": TEST_PASSWORD }),
        )
        .await;
    let unknown = expect_error(unknown_email, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    assert_eq!(wrong["message"], unknown["message"]);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_refresh_issues_new_access_token() {
    let user = new_user("refresh").await;

    let response = Api::new()
        .with_token(&user.refresh_token)
        .request(reqwest::Method::POST, "/auth/refresh")
        .send()
        .await
        .expect("refresh request failed");
    let body = expect_json(response, StatusCode::OK).await;
    let access = body["accessToken"].as_str().unwrap();
    assert_eq!(body["tokenType"], "Bearer");

    let me = Api::new().with_token(access).get("/users/me").await;
    expect_json(me, StatusCode::OK).await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_refresh_token_is_not_an_access_token() {
    let user = new_user("typ").await;

    let response = Api::new()
        .with_token(&user.refresh_token)
        .get("/users/me")
        .await;
    expect_error(response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN").await;
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_is_case_insensitive_on_email() {
    let user = new_user("Case").await;
    let (access, _) = login(&user.email.to_uppercase(), TEST_PASSWORD).await;
    assert!(!access.is_empty());
}
