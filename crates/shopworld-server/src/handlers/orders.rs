use axum::{Json, extract::State};
use shopworld_api::{ApiError, ApiResponse, ApiResult};
use shopworld_core::{NewOrder, Order, OrderDetail, OrderId};
use tracing::info;

use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

/// Checkout. Lines come from `orderItems` or, when absent, from the cart;
/// the storage layer prices them and clears the cart in one step.
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<NewOrder>,
) -> ApiResult<ApiResponse<Order>> {
    payload.validate()?;
    let order = state.storage.create_order(user.id, &payload).await?;
    info!(user_id = user.id, order_id = order.id, total = %order.total, "Order placed");
    Ok(ApiResponse::created(order))
}

pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.storage.orders_for_user(user.id).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(order_id): ApiPath<OrderId>,
) -> ApiResult<Json<OrderDetail>> {
    let order = state
        .storage
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    if order.user_id != user.id && !user.is_admin {
        return Err(ApiError::forbidden("Not authorized"));
    }
    let items = state.storage.order_lines(order.id).await?;
    Ok(Json(OrderDetail { order, items }))
}
