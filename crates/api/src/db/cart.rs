//! Shopping cart repository.
//!
//! Every operation is scoped to the owning user; a line that belongs to
//! someone else behaves exactly like a missing one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bookstore_core::{BookId, CartItemId, Price, UserId};

use super::RepositoryError;
use crate::models::{CartItem, CartLine, CartSummary};

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    cart_item_id: i32,
    user_id: i32,
    book_id: i32,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.cart_item_id),
            user_id: UserId::new(row.user_id),
            book_id: BookId::new(row.book_id),
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    #[sqlx(flatten)]
    item: CartItemRow,
    title: String,
    author: String,
    price: Price,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item: row.item.into(),
            title: row.title,
            author: row.author,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    total_quantity: i64,
    total_price: Price,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add `quantity` of a book, merging with an existing line for the same book.
    ///
    /// Returns `None`, leaving the line untouched, when the merged quantity
    /// would exceed `max_quantity`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the book no longer exists.
    pub async fn add(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (user_id, book_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, book_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            WHERE cart_items.quantity::BIGINT + EXCLUDED.quantity <= $4
            RETURNING cart_item_id, user_id, book_id, quantity, created_at
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(quantity)
        .bind(max_quantity)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "book does not exist"))?;

        Ok(row.map(Into::into))
    }

    /// The user's cart with book details, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT c.cart_item_id, c.user_id, c.book_id, c.quantity, c.created_at,
                   b.title, b.author, b.price
            FROM cart_items c
            JOIN books b ON b.book_id = c.book_id
            WHERE c.user_id = $1
            ORDER BY c.created_at DESC, c.cart_item_id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Set the quantity of one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or isn't the user's.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE cart_items
            SET quantity = $3
            WHERE cart_item_id = $1 AND user_id = $2
            RETURNING cart_item_id, user_id, book_id, quantity, created_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Remove one of the user's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist or isn't the user's.
    pub async fn remove(&self, user_id: UserId, id: CartItemId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE cart_item_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Empty the user's cart, returning how many lines were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Totals at current book prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, user_id: UserId) -> Result<CartSummary, RepositoryError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT COALESCE(SUM(c.quantity), 0)::BIGINT AS total_quantity,
                   ROUND(COALESCE(SUM(c.quantity * b.price), 0), 2) AS total_price
            FROM cart_items c
            JOIN books b ON b.book_id = c.book_id
            WHERE c.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(CartSummary {
            total_quantity: row.total_quantity,
            total_price: row.total_price,
        })
    }
}
