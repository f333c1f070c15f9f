//! Wishlist domain types.

use chrono::{DateTime, Utc};

use bookstore_core::{BookId, Price, UserId, WishlistId};

#[derive(Debug, Clone)]
pub struct WishlistEntry {
    pub id: WishlistId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub created_at: DateTime<Utc>,
}

/// A wishlist entry joined with book details.
#[derive(Debug, Clone)]
pub struct WishlistLine {
    pub entry: WishlistEntry,
    pub title: String,
    pub author: String,
    pub price: Price,
    pub category: String,
    pub is_bestseller: bool,
}
