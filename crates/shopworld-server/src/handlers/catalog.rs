//! Public catalog reads and admin-only catalog writes.

use axum::{Json, extract::State};
use serde::Deserialize;
use shopworld_api::{ApiError, ApiResponse, ApiResult};
use shopworld_core::{Category, NewCategory, NewProduct, Product, ProductId};

use crate::auth::AdminUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Category slug
    pub category: Option<String>,
    /// Only the literal `true` selects the listing; any other value falls through.
    pub featured: Option<String>,
    pub new_arrivals: Option<String>,
    /// Applies to the featured and new-arrival listings
    pub limit: Option<usize>,
}

fn flag_set(value: Option<&str>) -> bool {
    value == Some("true")
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.storage.list_categories().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<Json<Category>> {
    state
        .storage
        .get_category_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

pub async fn create_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<NewCategory>,
) -> ApiResult<ApiResponse<Category>> {
    payload.validate()?;
    let category = state.storage.create_category(&payload).await?;
    tracing::info!(admin_id = admin.id, category_id = category.id, "Category created");
    Ok(ApiResponse::created(category))
}

/// `category` wins over `featured`, which wins over `newArrivals`.
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = if let Some(slug) = &query.category {
        let category = state
            .storage
            .get_category_by_slug(slug)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        state.storage.products_by_category(category.id).await?
    } else if flag_set(query.featured.as_deref()) {
        let limit = state.config.catalog.clamp_limit(query.limit);
        state.storage.featured_products(limit).await?
    } else if flag_set(query.new_arrivals.as_deref()) {
        let limit = state.config.catalog.clamp_limit(query.limit);
        state.storage.new_products(limit).await?
    } else {
        state.storage.list_products().await?
    };
    Ok(Json(products))
}

/// The segment is looked up as a slug first, then as a numeric id.
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    if let Some(product) = state.storage.get_product_by_slug(&slug).await? {
        return Ok(Json(product));
    }
    if let Ok(id) = slug.parse::<ProductId>()
        && let Some(product) = state.storage.get_product(id).await?
    {
        return Ok(Json(product));
    }
    Err(ApiError::not_found("Product not found"))
}

pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<NewProduct>,
) -> ApiResult<ApiResponse<Product>> {
    payload.validate()?;
    let product = state.storage.create_product(&payload).await?;
    tracing::info!(admin_id = admin.id, product_id = product.id, "Product created");
    Ok(ApiResponse::created(product))
}
