//! Catalog browsing and administration.

use std::str::FromStr;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, Price};

use super::{PageBody, non_blank, not_found_as, required};
use crate::db::{BookRepository, RepositoryError};
use crate::error::{AppError, ErrorCode, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::{Book, BookChanges, BookFilter, BookSort, NewBook, PageRequest, Sort};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    book_id: BookId,
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

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        Self {
            book_id: book.id,
            title: book.title,
            author: book.author,
            category: book.category,
            price: book.price,
            stock: book.stock,
            is_bestseller: book.is_bestseller,
            description: book.description,
            image_url: book.image_url,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    keyword: Option<String>,
    category: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

/// Body of both create and partial update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    title: Option<String>,
    author: Option<String>,
    category: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    is_bestseller: Option<bool>,
    description: Option<String>,
    image_url: Option<String>,
}

/// Parse a `minPrice`/`maxPrice` query value.
fn price_param(raw: Option<&str>, name: &str) -> Result<Option<Price>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let amount = Decimal::from_str(raw)
        .map_err(|_| AppError::InvalidQuery(format!("{name} must be a decimal number")))?;
    Price::new(amount)
        .map(Some)
        .map_err(|_| AppError::InvalidQuery(format!("{name} must not be negative")))
}

fn price_field(amount: Decimal) -> Result<Price> {
    Price::unit(amount).map_err(|e| AppError::Validation(e.to_string()))
}

fn stock_field(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(AppError::Validation("stock must not be negative".to_string()));
    }
    Ok(stock)
}

impl TryFrom<BookRequest> for NewBook {
    type Error = AppError;

    fn try_from(body: BookRequest) -> Result<Self> {
        Ok(Self {
            title: required(body.title, "title")?,
            author: required(body.author, "author")?,
            category: required(body.category, "category")?,
            price: price_field(
                body.price
                    .ok_or_else(|| AppError::Validation("price is required".to_string()))?,
            )?,
            stock: stock_field(
                body.stock
                    .ok_or_else(|| AppError::Validation("stock is required".to_string()))?,
            )?,
            is_bestseller: body.is_bestseller.unwrap_or(false),
            description: body.description,
            image_url: body.image_url,
        })
    }
}

impl TryFrom<BookRequest> for BookChanges {
    type Error = AppError;

    fn try_from(body: BookRequest) -> Result<Self> {
        Ok(Self {
            title: non_blank(body.title, "title")?,
            author: non_blank(body.author, "author")?,
            category: non_blank(body.category, "category")?,
            price: body.price.map(price_field).transpose()?,
            stock: body.stock.map(stock_field).transpose()?,
            is_bestseller: body.is_bestseller,
            description: body.description,
            image_url: body.image_url,
        })
    }
}

/// Search the catalog.
#[instrument(skip_all)]
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<PageBody<BookView>>> {
    let filter = BookFilter {
        keyword: query
            .keyword
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty()),
        category: query
            .category
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty()),
        min_price: price_param(query.min_price.as_deref(), "minPrice")?,
        max_price: price_param(query.max_price.as_deref(), "maxPrice")?,
    };
    let sort = Sort::<BookSort>::parse(query.sort.as_deref());
    let request = PageRequest::new(query.page, query.size, DEFAULT_PAGE_SIZE);

    let page = BookRepository::new(state.pool())
        .search(&filter, sort, request)
        .await?;

    Ok(Json(
        PageBody::new(page, BookView::from).with_sort(sort.describe()),
    ))
}

/// A single book.
#[instrument(skip_all, fields(book_id = %id))]
pub async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<BookId>,
) -> Result<Json<BookView>> {
    let book = BookRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(ErrorCode::ResourceNotFound, "Book not found"))?;

    Ok(Json(book.into()))
}

/// Add a book to the catalog.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<BookRequest>,
) -> Result<(StatusCode, Json<BookView>)> {
    let new_book = NewBook::try_from(body)?;
    let book = BookRepository::new(state.pool()).create(&new_book).await?;

    tracing::info!(admin_id = %admin.id, book_id = %book.id, "book created");
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Partially update a book.
#[instrument(skip_all, fields(book_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<BookId>,
    ApiJson(body): ApiJson<BookRequest>,
) -> Result<Json<BookView>> {
    let changes = BookChanges::try_from(body)?;
    let books = BookRepository::new(state.pool());

    let result = if changes.is_empty() {
        books
            .get(id)
            .await
            .and_then(|book| book.ok_or(RepositoryError::NotFound))
    } else {
        books.update(id, &changes).await
    };
    let book = result.map_err(not_found_as(ErrorCode::ResourceNotFound, "Book not found"))?;

    Ok(Json(book.into()))
}

/// Remove a book. Books that appear in orders cannot be removed.
#[instrument(skip_all, fields(book_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<BookId>,
) -> Result<StatusCode> {
    BookRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found_as(ErrorCode::ResourceNotFound, "Book not found"))?;

    tracing::info!(admin_id = %admin.id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
