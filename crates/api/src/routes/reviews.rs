//! Book reviews and likes.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, ReviewId, UserId};

use super::users::load_active_user;
use super::{PageBody, not_found_as};
use crate::db::{BookRepository, RepositoryError, ReviewRepository};
use crate::error::{AppError, ErrorCode, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::review::{MAX_RATING, MIN_RATING, is_valid_rating};
use crate::models::{CurrentUser, PageRequest, Review, ReviewFilter, ReviewSort, Sort};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    review_id: ReviewId,
    user_id: UserId,
    book_id: BookId,
    rating: i32,
    content: Option<String>,
    likes_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            review_id: review.id,
            user_id: review.user_id,
            book_id: review.book_id,
            rating: review.rating,
            content: review.content,
            likes_count: review.likes_count,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Reviews of one book, with the book ID alongside the page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookReviewsBody {
    book_id: BookId,
    #[serde(flatten)]
    page: PageBody<ReviewView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    user_id: Option<UserId>,
    book_id: Option<BookId>,
    min_rating: Option<i32>,
    max_rating: Option<i32>,
    sort: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    rating: Option<i32>,
    content: Option<String>,
}

fn check_rating(rating: i32) -> Result<i32> {
    if !is_valid_rating(rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(rating)
}

fn review_not_found() -> AppError {
    AppError::not_found(ErrorCode::ReviewNotFound, "Review not found")
}

/// Load a review the caller may modify.
async fn owned_review(state: &AppState, caller: &CurrentUser, id: ReviewId) -> Result<Review> {
    let review = ReviewRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(review_not_found)?;

    if !caller.can_modify(review.user_id) {
        return Err(AppError::Forbidden(
            "You can only modify your own reviews".to_string(),
        ));
    }

    Ok(review)
}

/// Paged reviews of a single book.
#[instrument(skip_all, fields(book_id = %book_id))]
pub async fn list_for_book(
    State(state): State<AppState>,
    ApiPath(book_id): ApiPath<BookId>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<BookReviewsBody>> {
    if !BookRepository::new(state.pool()).exists(book_id).await? {
        return Err(AppError::not_found(ErrorCode::BookNotFound, "Book not found"));
    }

    let filter = ReviewFilter {
        book_id: Some(book_id),
        min_rating: query.min_rating,
        max_rating: query.max_rating,
        ..ReviewFilter::default()
    };
    let sort = Sort::<ReviewSort>::parse(query.sort.as_deref());
    let request = PageRequest::new(query.page, query.size, DEFAULT_PAGE_SIZE);

    let page = ReviewRepository::new(state.pool())
        .list(filter, sort, request)
        .await?;

    Ok(Json(BookReviewsBody {
        book_id,
        page: PageBody::new(page, ReviewView::from).with_sort(sort.describe()),
    }))
}

/// Filtered listing across all books.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<PageBody<ReviewView>>> {
    let filter = ReviewFilter {
        user_id: query.user_id,
        book_id: query.book_id,
        min_rating: query.min_rating,
        max_rating: query.max_rating,
    };
    let sort = Sort::<ReviewSort>::parse(query.sort.as_deref());
    let request = PageRequest::new(query.page, query.size, DEFAULT_PAGE_SIZE);

    let page = ReviewRepository::new(state.pool())
        .list(filter, sort, request)
        .await?;

    Ok(Json(
        PageBody::new(page, ReviewView::from).with_sort(sort.describe()),
    ))
}

/// Review a book. One review per user and book.
#[instrument(skip_all, fields(book_id = %book_id, user_id = %caller.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(book_id): ApiPath<BookId>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewView>)> {
    let rating = check_rating(
        body.rating
            .ok_or_else(|| AppError::Validation("rating is required".to_string()))?,
    )?;
    let user = load_active_user(&state, &caller).await?;

    if !BookRepository::new(state.pool()).exists(book_id).await? {
        return Err(AppError::not_found(ErrorCode::BookNotFound, "Book not found"));
    }

    let review = ReviewRepository::new(state.pool())
        .create(user.id, book_id, rating, body.content.as_deref())
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict(_) => AppError::conflict(
                ErrorCode::DuplicateReview,
                "You have already reviewed this book",
            ),
            RepositoryError::NotFound => {
                AppError::not_found(ErrorCode::BookNotFound, "Book not found")
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(review.into())))
}

/// A single review.
#[instrument(skip_all, fields(review_id = %id))]
pub async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<Json<ReviewView>> {
    let review = ReviewRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(review_not_found)?;

    Ok(Json(review.into()))
}

/// Edit rating and/or content. Owner or admin only.
#[instrument(skip_all, fields(review_id = %id, user_id = %caller.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(body): ApiJson<ReviewRequest>,
) -> Result<Json<ReviewView>> {
    let rating = body.rating.map(check_rating).transpose()?;
    owned_review(&state, &caller, id).await?;

    let review = ReviewRepository::new(state.pool())
        .update(id, rating, body.content.as_deref())
        .await
        .map_err(not_found_as(ErrorCode::ReviewNotFound, "Review not found"))?;

    Ok(Json(review.into()))
}

/// Delete a review. Owner or admin only.
#[instrument(skip_all, fields(review_id = %id, user_id = %caller.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<StatusCode> {
    owned_review(&state, &caller, id).await?;

    ReviewRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found_as(ErrorCode::ReviewNotFound, "Review not found"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Like a review.
#[instrument(skip_all, fields(review_id = %id, user_id = %caller.id))]
pub async fn like(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<Json<ReviewView>> {
    let review = ReviewRepository::new(state.pool())
        .like(id)
        .await
        .map_err(not_found_as(ErrorCode::ReviewNotFound, "Review not found"))?;

    Ok(Json(review.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rating() {
        assert_eq!(check_rating(3).unwrap(), 3);
        assert!(matches!(check_rating(0), Err(AppError::Validation(_))));
        assert!(matches!(check_rating(6), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_review_query_parses_camel_case() {
        let query: ReviewQuery =
            serde_json::from_str(r#"{"userId":4,"minRating":2,"page":1}"#).unwrap();
        assert_eq!(query.user_id, Some(UserId::new(4)));
        assert_eq!(query.min_rating, Some(2));
        assert!(query.book_id.is_none());
    }
}
