//! Wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bookstore_core::{BookId, Price, UserId, WishlistId};

use super::RepositoryError;
use crate::models::{WishlistEntry, WishlistLine};

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    wishlist_id: i32,
    user_id: i32,
    book_id: i32,
    created_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistEntry {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: WishlistId::new(row.wishlist_id),
            user_id: UserId::new(row.user_id),
            book_id: BookId::new(row.book_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistLineRow {
    #[sqlx(flatten)]
    entry: WishlistRow,
    title: String,
    author: String,
    price: Price,
    category: String,
    is_bestseller: bool,
}

impl From<WishlistLineRow> for WishlistLine {
    fn from(row: WishlistLineRow) -> Self {
        Self {
            entry: row.entry.into(),
            title: row.title,
            author: row.author,
            price: row.price,
            category: row.category,
            is_bestseller: row.is_bestseller,
        }
    }
}

/// Outcome of adding a book to a wishlist.
#[derive(Debug, Clone)]
pub enum AddOutcome {
    Created(WishlistEntry),
    Existing(WishlistEntry),
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a book, or return the entry that already holds it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the book no longer exists.
    pub async fn add(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<AddOutcome, RepositoryError> {
        let inserted = sqlx::query_as::<_, WishlistRow>(
            r"
            INSERT INTO wishlists (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            RETURNING wishlist_id, user_id, book_id, created_at
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "book does not exist"))?;

        if let Some(row) = inserted {
            return Ok(AddOutcome::Created(row.into()));
        }

        let existing = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT wishlist_id, user_id, book_id, created_at
            FROM wishlists
            WHERE user_id = $1 AND book_id = $2
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(self.pool)
        .await?;

        // Removed concurrently between the two statements.
        existing
            .map(|row| AddOutcome::Existing(row.into()))
            .ok_or(RepositoryError::NotFound)
    }

    /// The user's wishlist with book details, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<WishlistLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistLineRow>(
            r"
            SELECT w.wishlist_id, w.user_id, w.book_id, w.created_at,
                   b.title, b.author, b.price, b.category, b.is_bestseller
            FROM wishlists w
            JOIN books b ON b.book_id = w.book_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC, w.wishlist_id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Remove an entry by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry doesn't exist or isn't the user's.
    pub async fn remove(&self, user_id: UserId, id: WishlistId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlists WHERE wishlist_id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove the entry holding `book_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book isn't on the wishlist.
    pub async fn remove_book(&self, user_id: UserId, book_id: BookId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Empty the wishlist, returning how many entries were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
