//! Book catalog repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use bookstore_core::{BookId, Price};

use super::{CountRow, RepositoryError};
use crate::models::{Book, BookChanges, BookFilter, BookSort, NewBook, Page, PageRequest, Sort};

const BOOK_COLUMNS: &str = "book_id, title, author, category, price, stock, is_bestseller, \
                            description, image_url, created_at, updated_at";

/// Internal row type for `PostgreSQL` book queries.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    book_id: i32,
    title: String,
    author: String,
    category: String,
    price: Price,
    stock: i32,
    is_bestseller: bool,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: BookId::new(row.book_id),
            title: row.title,
            author: row.author,
            category: row.category,
            price: row.price,
            stock: row.stock,
            is_bestseller: row.is_bestseller,
            description: row.description,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Append `WHERE ...` for `filter` to `builder`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    builder.push(" WHERE TRUE");

    if let Some(keyword) = filter.keyword.as_deref() {
        let pattern = format!("%{}%", escape_like(keyword));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category.as_deref() {
        builder.push(" AND category = ").push_bind(category.to_owned());
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
}

/// Escape `LIKE` wildcards so keywords match literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Repository for book database operations.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = $1");
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Whether a book with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: BookId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE book_id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Search the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &BookFilter,
        sort: Sort<BookSort>,
        request: PageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {BOOK_COLUMNS} FROM books"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(sort.order_by("book_id"))
            .push(" LIMIT ")
            .push_bind(request.limit())
            .push(" OFFSET ")
            .push_bind(request.offset());

        let rows = query
            .build_query_as::<BookRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM books");
        push_filters(&mut count, filter);
        let count = count
            .build_query_as::<CountRow>()
            .fetch_one(self.pool)
            .await?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            request,
            total_elements: count.total,
        })
    }

    /// Insert a new book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, book: &NewBook) -> Result<Book, RepositoryError> {
        let sql = format!(
            "INSERT INTO books (title, author, category, price, stock, is_bestseller, \
             description, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.category)
            .bind(book.price)
            .bind(book.stock)
            .bind(book.is_bestseller)
            .bind(book.description.as_deref())
            .bind(book.image_url.as_deref())
            .fetch_one(self.pool)
            .await?;

        Ok(row.into())
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book doesn't exist.
    pub async fn update(&self, id: BookId, changes: &BookChanges) -> Result<Book, RepositoryError> {
        let sql = format!(
            "UPDATE books SET \
             title = COALESCE($2, title), \
             author = COALESCE($3, author), \
             category = COALESCE($4, category), \
             price = COALESCE($5, price), \
             stock = COALESCE($6, stock), \
             is_bestseller = COALESCE($7, is_bestseller), \
             description = COALESCE($8, description), \
             image_url = COALESCE($9, image_url) \
             WHERE book_id = $1 \
             RETURNING {BOOK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .bind(changes.title.as_deref())
            .bind(changes.author.as_deref())
            .bind(changes.category.as_deref())
            .bind(changes.price)
            .bind(changes.stock)
            .bind(changes.is_bestseller)
            .bind(changes.description.as_deref())
            .bind(changes.image_url.as_deref())
            .fetch_optional(self.pool)
            .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a book. Cart lines, wishlist entries and reviews go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book doesn't exist.
    /// Returns `RepositoryError::Conflict` if the book appears in an order.
    pub async fn delete(&self, id: BookId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_constraint(e, "book is referenced by existing orders")
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
