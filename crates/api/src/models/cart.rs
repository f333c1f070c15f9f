//! Cart domain types.

use chrono::{DateTime, Utc};

use bookstore_core::{BookId, CartItemId, Price, UserId};

/// One book in a user's cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Most copies of one book a single line may hold, merges included.
    pub const MAX_QUANTITY: i32 = 99;
}

/// A cart item joined with the book it refers to.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub title: String,
    pub author: String,
    pub price: Price,
}

/// Totals over the current cart, priced at current book prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    pub total_quantity: i64,
    pub total_price: Price,
}
