//! Review domain types.

use chrono::{DateTime, Utc};

use bookstore_core::{BookId, ReviewId, UserId};

use super::pagination::SortField;

/// Lowest allowed rating.
pub const MIN_RATING: i32 = 1;
/// Highest allowed rating.
pub const MAX_RATING: i32 = 5;

/// A user's rating of a book.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub rating: i32,
    pub content: Option<String>,
    pub likes_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review listing filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewFilter {
    pub user_id: Option<UserId>,
    pub book_id: Option<BookId>,
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
}

/// Sortable review columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    CreatedAt,
    Rating,
    Likes,
}

impl SortField for ReviewSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "rating" => Some(Self::Rating),
            "likes_count" | "likesCount" => Some(Self::Likes),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Rating => "rating",
            Self::Likes => "likes_count",
        }
    }

    fn name(self) -> &'static str {
        self.column()
    }
}

/// Whether `rating` is on the 1..=5 scale.
#[must_use]
pub const fn is_valid_rating(rating: i32) -> bool {
    rating >= MIN_RATING && rating <= MAX_RATING
}
