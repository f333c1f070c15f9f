//! Order repository.
//!
//! Orders are created from a user's cart inside a single transaction: the
//! cart lines are locked, each book's current price is copied onto the order
//! line, and the cart is emptied before commit.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use bookstore_core::{BookId, OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::{CountRow, RepositoryError};
use crate::models::{Order, OrderFilter, OrderItem, OrderSort, OrderWithItems, Page, PageRequest, Sort};

const ORDER_COLUMNS: &str = "order_id, user_id, total_price, status, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: i32,
    user_id: i32,
    total_price: Price,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.order_id),
            user_id: UserId::new(row.user_id),
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_item_id: i32,
    order_id: i32,
    book_id: i32,
    quantity: i32,
    price: Price,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.order_item_id),
            order_id: OrderId::new(row.order_id),
            book_id: BookId::new(row.book_id),
            quantity: row.quantity,
            price: row.price,
        }
    }
}

/// A locked cart line with the book's current price.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PricedLine {
    book_id: i32,
    quantity: i32,
    price: Price,
}

/// Sum of quantity times unit price over `lines`.
fn order_total(lines: &[PricedLine]) -> Price {
    lines.iter().map(|l| l.price.times(l.quantity)).sum()
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: OrderFilter) {
    builder.push(" WHERE TRUE");

    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
}

async fn load_items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT order_item_id, order_id, book_id, quantity, price
        FROM order_items
        WHERE order_id = $1
        ORDER BY order_item_id
        ",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into a `PENDING` order.
    ///
    /// Returns `Ok(None)` when the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// committed in that case.
    pub async fn create_from_cart(
        &self,
        user_id: UserId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, PricedLine>(
            r"
            SELECT c.book_id, c.quantity, b.price
            FROM cart_items c
            JOIN books b ON b.book_id = c.book_id
            WHERE c.user_id = $1
            ORDER BY c.cart_item_id
            FOR UPDATE OF c
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let order: Order = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, total_price, status) \
             VALUES ($1, $2, $3) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(order_total(&lines))
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await?
        .into();

        let mut insert =
            QueryBuilder::<Postgres>::new("INSERT INTO order_items (order_id, book_id, quantity, price) ");
        insert.push_values(&lines, |mut row, line| {
            row.push_bind(order.id)
                .push_bind(line.book_id)
                .push_bind(line.quantity)
                .push_bind(line.price);
        });
        let items = insert
            .push(" RETURNING order_item_id, order_id, book_id, quantity, price")
            .build_query_as::<OrderItemRow>()
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// Get an order with its lines. With `owner` set, orders of other users
    /// are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: OrderId,
        owner: Option<UserId>,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE order_id = $1 AND ($2::INTEGER IS NULL OR user_id = $2)"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order: Order = row.into();
        let items = load_items(&mut *conn, order.id).await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// List orders matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: OrderFilter,
        sort: Sort<OrderSort>,
        request: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(sort.order_by("order_id"))
            .push(" LIMIT ")
            .push_bind(request.limit())
            .push(" OFFSET ")
            .push_bind(request.offset());

        let rows = query
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS total FROM orders");
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

    /// Cancel one of the user's own orders. Only `PENDING` orders can be canceled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or isn't the user's.
    /// Returns `RepositoryError::Conflict` if the order is not pending.
    pub async fn cancel(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<OrderWithItems, RepositoryError> {
        self.transition(id, Some(user_id), OrderStatus::Canceled, |current| {
            current == OrderStatus::Pending
        })
        .await
    }

    /// Move any order to `status`, following the allowed transitions.
    /// Setting the current status again succeeds without a write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderWithItems, RepositoryError> {
        self.transition(id, None, status, |current| current.can_transition_to(status))
            .await
    }

    async fn transition(
        &self,
        id: OrderId,
        owner: Option<UserId>,
        target: OrderStatus,
        allowed: impl Fn(OrderStatus) -> bool + Send,
    ) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Order = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE order_id = $1 AND ($2::INTEGER IS NULL OR user_id = $2) \
             FOR UPDATE"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .into();

        if !allowed(current.status) {
            return Err(RepositoryError::Conflict(format!(
                "cannot change order status from {} to {target}",
                current.status
            )));
        }

        let order = if current.status == target {
            current
        } else {
            sqlx::query_as::<_, OrderRow>(&format!(
                "UPDATE orders SET status = $2 WHERE order_id = $1 RETURNING {ORDER_COLUMNS}"
            ))
            .bind(id)
            .bind(target)
            .fetch_one(&mut *tx)
            .await?
            .into()
        };

        let items = load_items(&mut *tx, order.id).await?;
        tx.commit().await?;

        Ok(OrderWithItems { order, items })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(quantity: i32, cents: i64) -> PricedLine {
        PricedLine {
            book_id: 1,
            quantity,
            price: Price::new(Decimal::new(cents, 2)).unwrap(),
        }
    }

    #[test]
    fn test_order_total_sums_lines() {
        let total = order_total(&[line(2, 1999), line(1, 550), line(3, 100)]);
        assert_eq!(total.amount(), Decimal::new(4848, 2));
    }

    #[test]
    fn test_order_total_at_largest_lines_keeps_cents() {
        let max = Price::MAX_UNIT.amount().mantissa();
        let max = i64::try_from(max).unwrap();
        let total = order_total(&[line(99, max), line(99, max), line(99, max)]);
        // 3 * 99 * 99,999,999.99
        assert_eq!(total.amount(), Decimal::new(2_969_999_999_703, 2));
        assert_eq!(total.amount().scale(), 2);
    }

    #[test]
    fn test_order_total_of_no_lines_is_zero() {
        assert_eq!(order_total(&[]), Price::ZERO);
    }

    #[test]
    fn test_status_filter_sql() {
        let filter = OrderFilter {
            user_id: Some(UserId::new(3)),
            status: Some(OrderStatus::Paid),
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM orders");
        push_filters(&mut query, filter);
        assert_eq!(
            query.sql(),
            "SELECT 1 FROM orders WHERE TRUE AND user_id = $1 AND status = $2"
        );
    }
}
