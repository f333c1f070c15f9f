//! Wishlist.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, Price, UserId, WishlistId};

use super::not_found_as;
use crate::db::wishlist::AddOutcome;
use crate::db::{RepositoryError, WishlistRepository};
use crate::error::{AppError, ErrorCode, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{WishlistEntry, WishlistLine};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EntryView {
    wishlist_id: WishlistId,
    user_id: UserId,
    book_id: BookId,
    created_at: DateTime<Utc>,
}

impl From<WishlistEntry> for EntryView {
    fn from(entry: WishlistEntry) -> Self {
        Self {
            wishlist_id: entry.id,
            user_id: entry.user_id,
            book_id: entry.book_id,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WishlistBookView {
    book_id: BookId,
    title: String,
    author: String,
    price: Price,
    category: String,
    #[serde(rename = "isBestseller")]
    is_bestseller: bool,
}

#[derive(Debug, Serialize)]
pub struct LineView {
    #[serde(flatten)]
    entry: EntryView,
    book: WishlistBookView,
}

impl From<WishlistLine> for LineView {
    fn from(line: WishlistLine) -> Self {
        let book_id = line.entry.book_id;
        Self {
            entry: line.entry.into(),
            book: WishlistBookView {
                book_id,
                title: line.title,
                author: line.author,
                price: line.price,
                category: line.category,
                is_bestseller: line.is_bestseller,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WishlistBody {
    items: Vec<LineView>,
    count: usize,
}

#[derive(Debug, Serialize)]
pub struct RemovedEntry {
    wishlist_id: WishlistId,
}

#[derive(Debug, Serialize)]
pub struct RemovedBook {
    book_id: BookId,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    book_id: Option<BookId>,
}

/// The caller's wishlist, newest first.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<WishlistBody>>> {
    let lines = WishlistRepository::new(state.pool()).lines(caller.id).await?;

    Ok(Json(ApiResponse::success(WishlistBody {
        count: lines.len(),
        items: lines.into_iter().map(LineView::from).collect(),
    })))
}

/// Add a book. Adding it twice returns the existing entry with 200.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<AddRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EntryView>>)> {
    let book_id = body
        .book_id
        .ok_or_else(|| AppError::Validation("book_id is required".to_string()))?;

    let outcome = WishlistRepository::new(state.pool())
        .add(caller.id, book_id)
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict(_) => {
                AppError::not_found(ErrorCode::BookNotFound, "Book not found")
            }
            other => other.into(),
        })?;

    let (status, entry, message) = match outcome {
        AddOutcome::Created(entry) => (StatusCode::CREATED, entry, "Added to wishlist"),
        AddOutcome::Existing(entry) => (StatusCode::OK, entry, "Already in wishlist"),
    };

    Ok((status, Json(ApiResponse::with_message(entry.into(), message))))
}

#[instrument(skip_all, fields(user_id = %caller.id, wishlist_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<WishlistId>,
) -> Result<Json<ApiResponse<RemovedEntry>>> {
    WishlistRepository::new(state.pool())
        .remove(caller.id, id)
        .await
        .map_err(not_found_as(
            ErrorCode::WishlistItemNotFound,
            "Wishlist item not found",
        ))?;

    Ok(Json(ApiResponse::with_message(
        RemovedEntry { wishlist_id: id },
        "Removed from wishlist",
    )))
}

#[instrument(skip_all, fields(user_id = %caller.id, book_id = %book_id))]
pub async fn remove_book(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(book_id): ApiPath<BookId>,
) -> Result<Json<ApiResponse<RemovedBook>>> {
    WishlistRepository::new(state.pool())
        .remove_book(caller.id, book_id)
        .await
        .map_err(not_found_as(
            ErrorCode::WishlistItemNotFound,
            "Book is not in the wishlist",
        ))?;

    Ok(Json(ApiResponse::with_message(
        RemovedBook { book_id },
        "Removed from wishlist",
    )))
}

#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<Option<()>>>> {
    let removed = WishlistRepository::new(state.pool()).clear(caller.id).await?;

    tracing::debug!(removed, "wishlist cleared");
    Ok(Json(ApiResponse::with_message(None, "Wishlist cleared")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_line_view_shape() {
        let line = WishlistLine {
            entry: WishlistEntry {
                id: WishlistId::new(4),
                user_id: UserId::new(1),
                book_id: BookId::new(8),
                created_at: Utc::now(),
            },
            title: "Sapiens".to_string(),
            author: "Yuval Noah Harari".to_string(),
            price: Price::new(Decimal::new(2200, 2)).unwrap(),
            category: "History".to_string(),
            is_bestseller: true,
        };

        let value = serde_json::to_value(LineView::from(line)).unwrap();
        assert_eq!(value["wishlist_id"], 4);
        assert_eq!(value["book_id"], 8);
        assert_eq!(value["book"]["category"], "History");
        assert_eq!(value["book"]["isBestseller"], true);
    }
}
