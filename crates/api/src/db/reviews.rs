//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use bookstore_core::{BookId, ReviewId, UserId};

use super::{CountRow, RepositoryError};
use crate::models::{Page, PageRequest, Review, ReviewFilter, ReviewSort, Sort};

const REVIEW_COLUMNS: &str =
    "review_id, user_id, book_id, rating, content, likes_count, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    review_id: i32,
    user_id: i32,
    book_id: i32,
    rating: i32,
    content: Option<String>,
    likes_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.review_id),
            user_id: UserId::new(row.user_id),
            book_id: BookId::new(row.book_id),
            rating: row.rating,
            content: row.content,
            likes_count: row.likes_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: ReviewFilter) {
    builder.push(" WHERE TRUE");

    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(book_id) = filter.book_id {
        builder.push(" AND book_id = ").push_bind(book_id);
    }
    if let Some(min) = filter.min_rating {
        builder.push(" AND rating >= ").push_bind(min);
    }
    if let Some(max) = filter.max_rating {
        builder.push(" AND rating <= ").push_bind(max);
    }
}

/// Unique violation: the user already reviewed the book. Foreign-key
/// violation: the book was deleted before the insert.
fn insert_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::NotFound
        }
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict("book already reviewed by user".to_owned())
        }
        other => RepositoryError::Database(other),
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE review_id = $1");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List reviews matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: ReviewFilter,
        sort: Sort<ReviewSort>,
        request: PageRequest,
    ) -> Result<Page<Review>, RepositoryError> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {REVIEW_COLUMNS} FROM reviews"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(sort.order_by("review_id"))
            .push(" LIMIT ")
            .push_bind(request.limit())
            .push(" OFFSET ")
            .push_bind(request.offset());

        let rows = query
            .build_query_as::<ReviewRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM reviews");
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

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the book,
    /// or `RepositoryError::NotFound` if the book no longer exists.
    pub async fn create(
        &self,
        user_id: UserId,
        book_id: BookId,
        rating: i32,
        content: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let sql = format!(
            "INSERT INTO reviews (user_id, book_id, rating, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(user_id)
            .bind(book_id)
            .bind(rating)
            .bind(content)
            .fetch_one(self.pool)
            .await
            .map_err(insert_error)?;

        Ok(row.into())
    }

    /// Update rating and/or content. `None` keeps the current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn update(
        &self,
        id: ReviewId,
        rating: Option<i32>,
        content: Option<&str>,
    ) -> Result<Review, RepositoryError> {
        let sql = format!(
            "UPDATE reviews SET \
             rating = COALESCE($2, rating), \
             content = COALESCE($3, content) \
             WHERE review_id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .bind(rating)
            .bind(content)
            .fetch_optional(self.pool)
            .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Increment the like counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn like(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        let sql = format!(
            "UPDATE reviews SET likes_count = likes_count + 1 \
             WHERE review_id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE review_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct Violation {
        foreign_key: bool,
    }

    impl std::fmt::Display for Violation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("constraint violation")
        }
    }

    impl std::error::Error for Violation {}

    impl DatabaseError for Violation {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.foreign_key {
                ErrorKind::ForeignKeyViolation
            } else {
                ErrorKind::UniqueViolation
            }
        }
    }

    fn violation(foreign_key: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(Violation { foreign_key }))
    }

    #[test]
    fn test_insert_error_separates_duplicate_from_missing_book() {
        assert!(matches!(insert_error(violation(false)), RepositoryError::Conflict(_)));
        assert!(matches!(insert_error(violation(true)), RepositoryError::NotFound));
        assert!(matches!(
            insert_error(sqlx::Error::RowNotFound),
            RepositoryError::Database(_)
        ));
    }

    #[test]
    fn test_empty_filter_adds_no_binds() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM reviews");
        push_filters(&mut query, ReviewFilter::default());
        assert_eq!(query.sql(), "SELECT 1 FROM reviews WHERE TRUE");
    }

    #[test]
    fn test_rating_range_filter() {
        let filter = ReviewFilter {
            book_id: Some(BookId::new(7)),
            min_rating: Some(2),
            max_rating: Some(4),
            ..ReviewFilter::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM reviews");
        push_filters(&mut query, filter);
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM reviews WHERE TRUE AND book_id = $1 AND rating >= $2 AND rating <= $3"
        );
    }
}
