//! Order Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::AppError;
use shared::models::{
    OrderCreate, OrderDetail, OrderStatus, OrderStatusUpdate, OrderWithUser, PlacedOrder,
};

use crate::auth::{Capability, CurrentUser};
use crate::core::ServerState;
use crate::orders::{OrderError, query};
use crate::utils::{Paginated, PaginationParams};

#[derive(Debug, Deserialize)]
pub struct QueueFilter {
    pub status: Option<OrderStatus>,
}

/// POST /api/orders - 下单并扣款
pub async fn place(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> Result<(StatusCode, Json<PlacedOrder>), AppError> {
    Capability::PlaceOrder.check(current_user.role)?;

    match state
        .coordinator
        .place_order(current_user.id, &payload.items)
        .await
    {
        Ok(placed) => Ok((StatusCode::CREATED, Json(placed))),
        Err(e) => {
            tracing::warn!(
                user_code = %current_user.user_code,
                lines = payload.items.len(),
                error = %e,
                "Order rejected"
            );
            Err(e.into())
        }
    }
}

/// GET /api/orders/my-orders - 当前用户的订单 (newest first)
pub async fn my_orders(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<OrderDetail>>, AppError> {
    let orders = query::orders_for_user(state.pool(), current_user.id).await?;
    Ok(Json(orders))
}

/// GET /api/orders - 厨房订单队列
pub async fn queue(
    State(state): State<ServerState>,
    Query(filter): Query<QueueFilter>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<Paginated<OrderWithUser>>, AppError> {
    let (orders, total) =
        query::order_queue(state.pool(), filter.status, page.limit(), page.offset()).await?;
    Ok(Json(Paginated {
        data: orders,
        pagination: page.describe(total),
    }))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<OrderDetail>, AppError> {
    let detail = query::load_detail(state.pool(), id).await?;
    if detail.order.user_id != current_user.id
        && !Capability::ViewOrderQueue.allows(current_user.role)
    {
        return Err(OrderError::Forbidden.into());
    }
    Ok(Json(detail))
}

/// PUT /api/orders/{id}/status - 推进订单状态
pub async fn update_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> Result<Json<OrderDetail>, AppError> {
    let detail = state
        .workflow
        .advance_order(id, current_user.role, payload.status)
        .await?;

    tracing::info!(
        order_id = id,
        order_number = %detail.order.order_number,
        status = %detail.order.status,
        operator = %current_user.user_code,
        "Order status updated"
    );
    Ok(Json(detail))
}
