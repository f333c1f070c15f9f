//! End-to-end HTTP tests for the bookstore API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p bookstore-cli -- migrate
//! cargo run -p bookstore-cli -- seed
//! RATELIMIT_ENABLED=false cargo run -p bookstore-api &
//! cargo test -p bookstore-integration-tests -- --ignored
//! ```
//!
//! The tests talk to a running server (`BOOKSTORE_BASE_URL`, default
//! `http://localhost:8080`) and log in as the seeded admin. Every test signs up
//! its own users with unique emails, so runs don't interfere with each other.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Seeded admin account.
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

/// Password used for every user created by the tests.
pub const TEST_PASSWORD: &str = "Test1234!";

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BOOKSTORE_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// A fresh address no other run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@bookstore.test", Uuid::new_v4().simple())
}

/// Thin client that prefixes the base URL and carries an optional bearer token.
#[derive(Clone)]
pub struct Api {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new()
    }
}

impl Api {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: base_url(),
            token: None,
        }
    }

    /// Same client, authenticated with `token`.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(Method::GET, path)
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.request(Method::DELETE, path)
            .send()
            .await
            .expect("DELETE request failed")
    }

    pub async fn post(&self, path: &str, body: &impl Serialize) -> Response {
        self.request(Method::POST, path)
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn patch(&self, path: &str, body: &impl Serialize) -> Response {
        self.request(Method::PATCH, path)
            .json(body)
            .send()
            .await
            .expect("PATCH request failed")
    }
}

/// Assert the status and return the JSON body.
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    let actual = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    assert_eq!(actual, status, "unexpected status, body: {body}");
    body
}

/// Assert an error envelope with the given status and code.
pub async fn expect_error(response: Response, status: StatusCode, code: &str) -> Value {
    let body = expect_json(response, status).await;
    assert_eq!(body["code"], code, "unexpected error body: {body}");
    assert_eq!(body["status"], status.as_u16());
    body
}

/// A signed-up, logged-in user.
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub api: Api,
}

/// Log in and return `(access, refresh)` tokens.
pub async fn login(email: &str, password: &str) -> (String, String) {
    let response = Api::new()
        .post("/auth/login", &json!({ "email": email, "password": password }))
        .await;
    let body = expect_json(response, StatusCode::OK).await;

    (
        body["accessToken"].as_str().unwrap().to_owned(),
        body["refreshToken"].as_str().unwrap().to_owned(),
    )
}

/// Sign up a new user and log them in.
pub async fn new_user(prefix: &str) -> TestUser {
    let email = unique_email(prefix);
    let response = Api::new()
        .post(
            "/auth/signup",
            &json!({ "name": format!("{prefix} tester"), "email": email, "password": TEST_PASSWORD }),
        )
        .await;
    let body = expect_json(response, StatusCode::CREATED).await;
    let id = body["userId"].as_i64().unwrap();

    let (access_token, refresh_token) = login(&email, TEST_PASSWORD).await;
    TestUser {
        id,
        email,
        api: Api::new().with_token(&access_token),
        access_token,
        refresh_token,
    }
}

/// Client logged in as the seeded admin.
pub async fn admin() -> Api {
    let (access_token, _) = login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    Api::new().with_token(access_token)
}

/// Create a book as admin and return its ID.
pub async fn create_book(admin: &Api, title: &str, category: &str, price: f64) -> i64 {
    let response = admin
        .post(
            "/books",
            &json!({
                "title": title,
                "author": "Integration Author",
                "category": category,
                "price": price,
                "stock": 10,
            }),
        )
        .await;
    let body = expect_json(response, StatusCode::CREATED).await;
    body["bookId"].as_i64().unwrap()
}
