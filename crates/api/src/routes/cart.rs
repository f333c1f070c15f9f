//! Shopping cart.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use bookstore_core::{BookId, CartItemId, Price};

use super::not_found_as;
use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, ErrorCode, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartLine, CartSummary};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CartItemView {
    cart_item_id: CartItemId,
    book_id: BookId,
    quantity: i32,
}

impl From<CartItem> for CartItemView {
    fn from(item: CartItem) -> Self {
        Self {
            cart_item_id: item.id,
            book_id: item.book_id,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartBookView {
    book_id: BookId,
    title: String,
    author: String,
    price: Price,
}

#[derive(Debug, Serialize)]
pub struct CartLineView {
    cart_item_id: CartItemId,
    book_id: BookId,
    quantity: i32,
    created_at: DateTime<Utc>,
    book: CartBookView,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        Self {
            cart_item_id: line.item.id,
            book_id: line.item.book_id,
            quantity: line.item.quantity,
            created_at: line.item.created_at,
            book: CartBookView {
                book_id: line.item.book_id,
                title: line.title,
                author: line.author,
                price: line.price,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartItemsBody {
    items: Vec<CartLineView>,
}

#[derive(Debug, Serialize)]
pub struct RemovedItem {
    cart_item_id: CartItemId,
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    total_quantity: i64,
    total_price: Price,
}

impl From<CartSummary> for SummaryView {
    fn from(summary: CartSummary) -> Self {
        Self {
            total_quantity: summary.total_quantity,
            total_price: summary.total_price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    book_id: Option<BookId>,
    quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    quantity: Option<i32>,
}

fn positive_quantity(quantity: i32) -> Result<i32> {
    if quantity <= 0 {
        return Err(AppError::bad_request(
            ErrorCode::CartInvalidQuantity,
            "Quantity must be at least 1",
        ));
    }
    if quantity > CartItem::MAX_QUANTITY {
        return Err(quantity_limit());
    }
    Ok(quantity)
}

fn quantity_limit() -> AppError {
    AppError::bad_request(
        ErrorCode::CartInvalidQuantity,
        format!("Quantity cannot exceed {} per book", CartItem::MAX_QUANTITY),
    )
}

/// Add a book, merging with an existing line for it.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartItemView>>)> {
    let book_id = body
        .book_id
        .ok_or_else(|| AppError::Validation("book_id is required".to_string()))?;
    let quantity = positive_quantity(body.quantity.unwrap_or(1))?;

    let item = CartRepository::new(state.pool())
        .add(caller.id, book_id, quantity, CartItem::MAX_QUANTITY)
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict(_) => {
                AppError::not_found(ErrorCode::BookNotFound, "Book not found")
                    .with_details(json!({ "book_id": book_id }))
            }
            other => other.into(),
        })?
        .ok_or_else(quantity_limit)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(item.into(), "Added to cart")),
    ))
}

/// The caller's cart, newest lines first.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<CartItemsBody>>> {
    let lines = CartRepository::new(state.pool()).lines(caller.id).await?;

    Ok(Json(ApiResponse::success(CartItemsBody {
        items: lines.into_iter().map(CartLineView::from).collect(),
    })))
}

/// Set the quantity of a line.
#[instrument(skip_all, fields(user_id = %caller.id, cart_item_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<ApiResponse<CartItemView>>> {
    let quantity = positive_quantity(
        body.quantity
            .ok_or_else(|| AppError::Validation("quantity is required".to_string()))?,
    )?;

    let item = CartRepository::new(state.pool())
        .update_quantity(caller.id, id, quantity)
        .await
        .map_err(not_found_as(ErrorCode::CartItemNotFound, "Cart item not found"))?;

    Ok(Json(ApiResponse::with_message(item.into(), "Cart updated")))
}

#[instrument(skip_all, fields(user_id = %caller.id, cart_item_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<Json<ApiResponse<RemovedItem>>> {
    CartRepository::new(state.pool())
        .remove(caller.id, id)
        .await
        .map_err(not_found_as(ErrorCode::CartItemNotFound, "Cart item not found"))?;

    Ok(Json(ApiResponse::with_message(
        RemovedItem { cart_item_id: id },
        "Removed from cart",
    )))
}

#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<Option<()>>>> {
    let removed = CartRepository::new(state.pool()).clear(caller.id).await?;

    tracing::debug!(removed, "cart cleared");
    Ok(Json(ApiResponse::with_message(None, "Cart cleared")))
}

/// Totals at current book prices.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<SummaryView>>> {
    let summary = CartRepository::new(state.pool()).summary(caller.id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use bookstore_core::UserId;

    #[test]
    fn test_positive_quantity() {
        assert_eq!(positive_quantity(2).unwrap(), 2);
        assert!(matches!(
            positive_quantity(0),
            Err(AppError::BadRequest {
                code: ErrorCode::CartInvalidQuantity,
                ..
            })
        ));
        assert!(positive_quantity(-4).is_err());
    }

    #[test]
    fn test_quantity_upper_bound() {
        assert_eq!(
            positive_quantity(CartItem::MAX_QUANTITY).unwrap(),
            CartItem::MAX_QUANTITY
        );
        for quantity in [CartItem::MAX_QUANTITY + 1, 2_000_000, i32::MAX] {
            assert!(matches!(
                positive_quantity(quantity),
                Err(AppError::BadRequest {
                    code: ErrorCode::CartInvalidQuantity,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_line_view_nests_book() {
        let line = CartLine {
            item: CartItem {
                id: CartItemId::new(7),
                user_id: UserId::new(1),
                book_id: BookId::new(3),
                quantity: 2,
                created_at: Utc::now(),
            },
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            price: Price::new(Decimal::new(1999, 2)).unwrap(),
        };

        let value = serde_json::to_value(CartLineView::from(line)).unwrap();
        assert_eq!(value["cart_item_id"], 7);
        assert_eq!(value["book"]["book_id"], 3);
        assert_eq!(value["book"]["title"], "Dune");
        assert!((value["book"]["price"].as_f64().unwrap() - 19.99).abs() < 1e-9);
    }

    #[test]
    fn test_add_request_quantity_is_optional() {
        let body: AddItemRequest = serde_json::from_str(r#"{"book_id":3}"#).unwrap();
        assert_eq!(body.book_id, Some(BookId::new(3)));
        assert!(body.quantity.is_none());
    }
}
