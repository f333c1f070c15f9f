//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                                 - Banner
//! GET    /health                           - Liveness
//! GET    /health/ready                     - Readiness (database)
//!
//! # Auth
//! POST   /auth/signup                      - Register
//! POST   /auth/login                       - Issue access + refresh tokens
//! POST   /auth/refresh                     - Exchange refresh token (Bearer)
//!
//! # Users
//! GET    /users/me                         - Own profile
//! PATCH  /users/me                         - Update own name
//! GET    /users                            - List users (admin)
//! PATCH  /users/{id}/role                  - Change role (admin)
//! PATCH  /users/{id}/deactivate            - Deactivate (admin)
//!
//! # Books
//! GET    /books                            - Search catalog
//! POST   /books                            - Create (admin)
//! GET    /books/{id}                       - Detail
//! PATCH  /books/{id}                       - Update (admin)
//! DELETE /books/{id}                       - Delete (admin)
//! GET    /books/{id}/reviews               - Reviews of a book
//! POST   /books/{id}/reviews               - Review a book
//!
//! # Reviews
//! GET    /reviews                          - Filtered listing
//! GET    /reviews/{id}                     - Detail
//! PATCH  /reviews/{id}                     - Edit (owner or admin)
//! DELETE /reviews/{id}                     - Delete (owner or admin)
//! POST   /reviews/{id}/like                - Like
//!
//! # Cart
//! GET    /cart/items                       - Lines with book details
//! POST   /cart/items                       - Add (merges quantities)
//! PATCH  /cart/items/{id}                  - Set quantity
//! DELETE /cart/items/{id}                  - Remove line
//! DELETE /cart                             - Clear
//! GET    /cart/summary                     - Totals
//!
//! # Orders
//! POST   /orders                           - Place order from cart
//! GET    /orders                           - Own orders
//! GET    /orders/{id}                      - Own order detail
//! PATCH  /orders/{id}/cancel               - Cancel pending order
//! GET    /orders/admin                     - All orders (admin)
//! GET    /orders/admin/{id}                - Any order (admin)
//! PATCH  /orders/admin/{id}/status         - Change status (admin)
//!
//! # Wishlist
//! GET    /wishlist                         - Entries with book details
//! DELETE /wishlist                         - Clear
//! POST   /wishlist/items                   - Add
//! DELETE /wishlist/items/{id}              - Remove entry
//! DELETE /wishlist/items/book/{book_id}    - Remove by book
//! ```

pub mod auth;
pub mod books;
pub mod cart;
pub mod health;
pub mod orders;
pub mod reviews;
pub mod users;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use crate::db::RepositoryError;
use crate::error::{AppError, ErrorCode};
use crate::models::Page;
use crate::state::AppState;

/// All API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::banner))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/books", book_routes())
        .nest("/reviews", review_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/wishlist", wishlist_routes())
        .fallback(not_found)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/me", get(users::me).patch(users::update_me))
        .route("/{id}/role", patch(users::set_role))
        .route("/{id}/deactivate", patch(users::deactivate))
}

fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::search).post(books::create))
        .route(
            "/{id}",
            get(books::detail).patch(books::update).delete(books::remove),
        )
        .route(
            "/{id}/reviews",
            get(reviews::list_for_book).post(reviews::create),
        )
}

fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(reviews::list))
        .route(
            "/{id}",
            get(reviews::detail)
                .patch(reviews::update)
                .delete(reviews::remove),
        )
        .route("/{id}/like", post(reviews::like))
}

fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", delete(cart::clear))
        .route("/items", get(cart::list).post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
        .route("/summary", get(cart::summary))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::detail))
        .route("/{id}/cancel", patch(orders::cancel))
        .route("/admin", get(orders::admin_list))
        .route("/admin/{id}", get(orders::admin_detail))
        .route("/admin/{id}/status", patch(orders::admin_set_status))
}

fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::list).delete(wishlist::clear))
        .route("/items", post(wishlist::add))
        .route("/items/{id}", delete(wishlist::remove))
        .route("/items/book/{book_id}", delete(wishlist::remove_book))
}

async fn not_found() -> AppError {
    AppError::not_found(ErrorCode::ResourceNotFound, "Resource not found")
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Paged listing body: `{ content, page, size, totalElements, totalPages, sort? }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl<T> PageBody<T> {
    pub fn new<U>(page: Page<U>, view: impl FnMut(U) -> T) -> Self {
        let total_pages = page.total_pages();
        let page = page.map(view);
        Self {
            content: page.items,
            page: page.request.page,
            size: page.request.size,
            total_elements: page.total_elements,
            total_pages,
            sort: None,
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort: String) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// Map `RepositoryError::NotFound` to a resource-specific 404.
fn not_found_as(
    code: ErrorCode,
    message: &'static str,
) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::not_found(code, message),
        other => other.into(),
    }
}

/// A required, non-blank string field.
fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// An optional string field that must not be blank when present.
fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, AppError> {
    value.map(|v| required(Some(v), field)).transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::PageRequest;

    #[test]
    fn test_required_trims() {
        assert_eq!(required(Some("  Dune ".to_string()), "title").unwrap(), "Dune");
        assert!(matches!(
            required(Some("   ".to_string()), "title"),
            Err(AppError::Validation(msg)) if msg == "title is required"
        ));
        assert!(required(None, "title").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None, "name").unwrap(), None);
        assert!(non_blank(Some(String::new()), "name").is_err());
    }

    #[test]
    fn test_page_body_serialization() {
        let page = Page {
            items: vec![1, 2],
            request: PageRequest { page: 2, size: 2 },
            total_elements: 5,
        };
        let body = PageBody::new(page, |n| n * 10).with_sort("price,ASC".to_string());
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["content"], serde_json::json!([10, 20]));
        assert_eq!(value["page"], 2);
        assert_eq!(value["totalElements"], 5);
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["sort"], "price,ASC");
    }
}
