//! Category and product queries.

use shopworld_core::{Category, CategoryId, NewCategory, NewProduct, Product, ProductId};
use shopworld_storage::StorageError;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_core::row::Row;
use sqlx_postgres::{PgConnection, PgRow};

use super::{money, optional_money};
use crate::error::{PostgresError, query_error};

const CATEGORY_COLUMNS: &str = "id, name, slug, image, icon";

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, slug, description, price_cents, \
     compare_price_cents, image, images, category_id, stock, rating, num_reviews, \
     is_featured, is_new";

fn category_from_row(row: &PgRow) -> Result<Category, PostgresError> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        image: row.try_get("image")?,
        icon: row.try_get("icon")?,
    })
}

/// Decodes a product from columns named as in [`PRODUCT_COLUMNS`].
pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, PostgresError> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        price: money(row, "price_cents")?,
        compare_price: optional_money(row, "compare_price_cents")?,
        image: row.try_get("image")?,
        images: row.try_get("images")?,
        category_id: row.try_get("category_id")?,
        stock: row.try_get("stock")?,
        rating: row.try_get("rating")?,
        num_reviews: row.try_get("num_reviews")?,
        is_featured: row.try_get("is_featured")?,
        is_new: row.try_get("is_new")?,
    })
}

fn categories(rows: &[PgRow]) -> Result<Vec<Category>, StorageError> {
    rows.iter()
        .map(|row| category_from_row(row).map_err(StorageError::from))
        .collect()
}

fn products(rows: &[PgRow]) -> Result<Vec<Product>, StorageError> {
    rows.iter()
        .map(|row| product_from_row(row).map_err(StorageError::from))
        .collect()
}

pub async fn list_categories(conn: &mut PgConnection) -> Result<Vec<Category>, StorageError> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id");
    let rows = query(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Category", e))?;
    categories(&rows)
}

pub async fn get_category(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<Option<Category>, StorageError> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
    let row = query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Category", e))?;
    Ok(row.as_ref().map(category_from_row).transpose()?)
}

pub async fn get_category_by_slug(
    conn: &mut PgConnection,
    slug: &str,
) -> Result<Option<Category>, StorageError> {
    let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1");
    let row = query(&sql)
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Category", e))?;
    Ok(row.as_ref().map(category_from_row).transpose()?)
}

pub async fn create_category(
    conn: &mut PgConnection,
    category: &NewCategory,
) -> Result<Category, StorageError> {
    let sql = format!(
        "INSERT INTO categories (name, slug, image, icon) VALUES ($1, $2, $3, $4) \
         RETURNING {CATEGORY_COLUMNS}"
    );
    let row = query(&sql)
        .bind(&category.name)
        .bind(category.resolved_slug())
        .bind(&category.image)
        .bind(&category.icon)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| query_error("Category", e))?;
    Ok(category_from_row(&row)?)
}

pub async fn count_categories(conn: &mut PgConnection) -> Result<i64, StorageError> {
    query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| query_error("Category", e))
}

pub async fn list_products(conn: &mut PgConnection) -> Result<Vec<Product>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
    let rows = query(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    products(&rows)
}

pub async fn get_product(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let row = query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    Ok(row.as_ref().map(product_from_row).transpose()?)
}

/// Loads a product and locks its row until the transaction ends.
pub async fn get_product_for_update(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
    let row = query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    Ok(row.as_ref().map(product_from_row).transpose()?)
}

pub async fn get_product_by_slug(
    conn: &mut PgConnection,
    slug: &str,
) -> Result<Option<Product>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1");
    let row = query(&sql)
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    Ok(row.as_ref().map(product_from_row).transpose()?)
}

pub async fn products_by_category(
    conn: &mut PgConnection,
    category_id: CategoryId,
) -> Result<Vec<Product>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY id");
    let rows = query(&sql)
        .bind(category_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    products(&rows)
}

/// Products matching a boolean flag column, at most `limit` of them.
async fn flagged_products(
    conn: &mut PgConnection,
    flag: &str,
    limit: usize,
) -> Result<Vec<Product>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE {flag} ORDER BY id LIMIT $1");
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = query(&sql)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    products(&rows)
}

pub async fn featured_products(
    conn: &mut PgConnection,
    limit: usize,
) -> Result<Vec<Product>, StorageError> {
    flagged_products(conn, "is_featured", limit).await
}

pub async fn new_products(
    conn: &mut PgConnection,
    limit: usize,
) -> Result<Vec<Product>, StorageError> {
    flagged_products(conn, "is_new", limit).await
}

pub async fn create_product(
    conn: &mut PgConnection,
    product: &NewProduct,
) -> Result<Product, StorageError> {
    let sql = format!(
        "INSERT INTO products (name, slug, description, price_cents, compare_price_cents, \
                               image, images, category_id, stock, rating, num_reviews, \
                               is_featured, is_new) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING {PRODUCT_COLUMNS}"
    );
    let row = query(&sql)
        .bind(&product.name)
        .bind(product.resolved_slug())
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.compare_price.map(|m| m.cents()))
        .bind(&product.image)
        .bind(&product.images)
        .bind(product.category_id)
        .bind(product.stock)
        .bind(product.rating)
        .bind(product.num_reviews)
        .bind(product.is_featured)
        .bind(product.is_new)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    Ok(product_from_row(&row)?)
}

/// Subtracts `quantity` from a product's stock.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    quantity: i32,
) -> Result<(), StorageError> {
    query("UPDATE products SET stock = stock - $2 WHERE id = $1")
        .bind(id)
        .bind(quantity)
        .execute(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))?;
    Ok(())
}
