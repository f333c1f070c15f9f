//! Order domain types.

use chrono::{DateTime, Utc};

use bookstore_core::{BookId, OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::pagination::SortField;

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_price: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order. `price` is the unit price when the order was placed.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub quantity: i32,
    pub price: Price,
}

#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order listing filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
}

/// Sortable order columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    CreatedAt,
    TotalPrice,
    Status,
}

impl SortField for OrderSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "total_price" | "totalPrice" => Some(Self::TotalPrice),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::TotalPrice => "total_price",
            Self::Status => "status",
        }
    }

    fn name(self) -> &'static str {
        self.column()
    }
}
