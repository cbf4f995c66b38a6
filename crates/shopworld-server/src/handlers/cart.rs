//! Cart endpoints. Every mutation answers with the whole updated cart.

use axum::{Json, extract::State};
use serde::Deserialize;
use shopworld_api::{ApiResponse, ApiResult};
use shopworld_core::{CartItemId, CartLine, NewCartItem};

use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct MergeCartRequest {
    #[serde(default)]
    pub items: Vec<NewCartItem>,
}

pub async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(state.storage.cart_lines(user.id).await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(item): ApiJson<NewCartItem>,
) -> ApiResult<ApiResponse<Vec<CartLine>>> {
    item.validate()?;
    state
        .storage
        .add_cart_item(user.id, item.product_id, item.quantity)
        .await?;
    Ok(ApiResponse::created(state.storage.cart_lines(user.id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(item_id): ApiPath<CartItemId>,
    ApiJson(update): ApiJson<QuantityUpdate>,
) -> ApiResult<Json<Vec<CartLine>>> {
    state
        .storage
        .update_cart_item(user.id, item_id, update.quantity)
        .await?;
    Ok(Json(state.storage.cart_lines(user.id).await?))
}

pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(item_id): ApiPath<CartItemId>,
) -> ApiResult<Json<Vec<CartLine>>> {
    state.storage.remove_cart_item(user.id, item_id).await?;
    Ok(Json(state.storage.cart_lines(user.id).await?))
}

/// Folds a guest cart into the caller's cart. Unknown products and
/// non-positive quantities are skipped.
pub async fn merge_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<MergeCartRequest>,
) -> ApiResult<Json<Vec<CartLine>>> {
    Ok(Json(state.storage.merge_cart(user.id, &request.items).await?))
}

pub async fn clear_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<CartLine>>> {
    state.storage.clear_cart(user.id).await?;
    Ok(Json(Vec::new()))
}
