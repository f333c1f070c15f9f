//! Book domain types.

use chrono::{DateTime, Utc};

use bookstore_core::{BookId, Price};

use super::pagination::SortField;

/// A catalog entry.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: Price,
    pub stock: i32,
    pub is_bestseller: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new catalog entry.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: Price,
    pub stock: i32,
    pub is_bestseller: bool,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub is_bestseller: Option<bool>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl BookChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.is_bestseller.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
    }
}

/// Catalog search filters.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive substring of title or author.
    pub keyword: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
}

/// Sortable book columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    #[default]
    CreatedAt,
    Title,
    Author,
    Category,
    Price,
    Stock,
    Id,
}

impl SortField for BookSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "category" => Some(Self::Category),
            "price" => Some(Self::Price),
            "stock" => Some(Self::Stock),
            "book_id" | "bookId" | "id" => Some(Self::Id),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Title => "title",
            Self::Author => "author",
            Self::Category => "category",
            Self::Price => "price",
            Self::Stock => "stock",
            Self::Id => "book_id",
        }
    }

    fn name(self) -> &'static str {
        self.column()
    }
}
