//! Checkout and order management.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::{PageBody, not_found_as, required};
use crate::db::OrderRepository;
use crate::error::{AppError, ErrorCode, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderFilter, OrderItem, OrderSort, OrderWithItems, PageRequest, Sort};
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    order_item_id: OrderItemId,
    book_id: BookId,
    quantity: i32,
    price: Price,
}

impl From<OrderItem> for OrderItemView {
    fn from(item: OrderItem) -> Self {
        Self {
            order_item_id: item.id,
            book_id: item.book_id,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    order_id: OrderId,
    user_id: UserId,
    total_price: Price,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<Vec<OrderItemView>>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            user_id: order.user_id,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
            items: None,
        }
    }
}

impl From<OrderWithItems> for OrderView {
    fn from(OrderWithItems { order, items }: OrderWithItems) -> Self {
        Self {
            items: Some(items.into_iter().map(OrderItemView::from).collect()),
            ..order.into()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    status: Option<String>,
    user_id: Option<UserId>,
    sort: Option<String>,
    page: Option<i64>,
    size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    status: Option<String>,
}

fn parse_status(raw: &str) -> Option<OrderStatus> {
    raw.trim().to_ascii_uppercase().parse().ok()
}

/// `status` query filter. Unknown values are a query error.
fn status_param(raw: Option<&str>) -> Result<Option<OrderStatus>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    parse_status(raw)
        .map(Some)
        .ok_or_else(|| AppError::InvalidQuery(format!("unknown order status: {raw}")))
}

fn order_not_found() -> AppError {
    AppError::not_found(ErrorCode::OrderNotFound, "Order not found")
}

async fn page_of_orders(
    state: &AppState,
    filter: OrderFilter,
    query: &OrderQuery,
) -> Result<PageBody<OrderView>> {
    let sort = Sort::<OrderSort>::parse(query.sort.as_deref());
    let request = PageRequest::new(query.page, query.size, DEFAULT_PAGE_SIZE);

    let page = OrderRepository::new(state.pool())
        .list(filter, sort, request)
        .await?;

    Ok(PageBody::new(page, OrderView::from).with_sort(sort.describe()))
}

/// Place an order from the caller's cart.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<(StatusCode, Json<ApiResponse<OrderView>>)> {
    let order = OrderRepository::new(state.pool())
        .create_from_cart(caller.id)
        .await?
        .ok_or_else(|| AppError::bad_request(ErrorCode::CartEmpty, "Cart is empty"))?;

    add_breadcrumb("order", "Order placed", None);
    tracing::info!(
        order_id = %order.order.id,
        total = %order.order.total_price,
        lines = order.items.len(),
        "order placed"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(order.into(), "Order placed")),
    ))
}

/// The caller's orders.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<ApiResponse<PageBody<OrderView>>>> {
    let filter = OrderFilter {
        user_id: Some(caller.id),
        status: status_param(query.status.as_deref())?,
    };

    let body = page_of_orders(&state, filter, &query).await?;
    Ok(Json(ApiResponse::success(body)))
}

#[instrument(skip_all, fields(user_id = %caller.id, order_id = %id))]
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<ApiResponse<OrderView>>> {
    let order = OrderRepository::new(state.pool())
        .get(id, Some(caller.id))
        .await?
        .ok_or_else(order_not_found)?;

    Ok(Json(ApiResponse::success(order.into())))
}

/// Cancel one of the caller's pending orders.
#[instrument(skip_all, fields(user_id = %caller.id, order_id = %id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<ApiResponse<OrderView>>> {
    let order = OrderRepository::new(state.pool())
        .cancel(caller.id, id)
        .await
        .map_err(not_found_as(ErrorCode::OrderNotFound, "Order not found"))?;

    Ok(Json(ApiResponse::with_message(order.into(), "Order canceled")))
}

/// All orders, optionally filtered by status and user.
#[instrument(skip_all)]
pub async fn admin_list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> Result<Json<ApiResponse<PageBody<OrderView>>>> {
    let filter = OrderFilter {
        user_id: query.user_id,
        status: status_param(query.status.as_deref())?,
    };

    let body = page_of_orders(&state, filter, &query).await?;
    Ok(Json(ApiResponse::success(body)))
}

#[instrument(skip_all, fields(order_id = %id))]
pub async fn admin_detail(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<ApiResponse<OrderView>>> {
    let order = OrderRepository::new(state.pool())
        .get(id, None)
        .await?
        .ok_or_else(order_not_found)?;

    Ok(Json(ApiResponse::success(order.into())))
}

/// Move an order along its lifecycle.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn admin_set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<SetStatusRequest>,
) -> Result<Json<ApiResponse<OrderView>>> {
    let raw = required(body.status, "status")?;
    let status = parse_status(&raw).ok_or_else(|| {
        AppError::bad_request(
            ErrorCode::InvalidOrderStatus,
            format!("Invalid order status: {raw}"),
        )
    })?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, status)
        .await
        .map_err(not_found_as(ErrorCode::OrderNotFound, "Order not found"))?;

    tracing::info!(admin_id = %admin.id, %status, "order status changed");
    Ok(Json(ApiResponse::with_message(
        order.into(),
        "Order status updated",
    )))
}
