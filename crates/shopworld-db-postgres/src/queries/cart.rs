//! Cart queries.

use shopworld_core::{CartItem, CartItemId, CartLine, ProductId, UserId};
use shopworld_storage::StorageError;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_core::row::Row;
use sqlx_postgres::{PgConnection, PgRow};

use super::catalog::product_from_row;
use crate::error::{PostgresError, query_error};

const CART_COLUMNS: &str = "id, user_id, product_id, quantity";

fn cart_item_from_row(row: &PgRow) -> Result<CartItem, PostgresError> {
    Ok(CartItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
    })
}

pub async fn items(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartItem>, StorageError> {
    let sql = format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY id");
    let rows = query(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?;
    rows.iter()
        .map(|row| cart_item_from_row(row).map_err(StorageError::from))
        .collect()
}

/// Locks and returns the cart rows of `user_id`, oldest first.
pub async fn items_for_update(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartItem>, StorageError> {
    let sql =
        format!("SELECT {CART_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY id FOR UPDATE");
    let rows = query(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?;
    rows.iter()
        .map(|row| cart_item_from_row(row).map_err(StorageError::from))
        .collect()
}

/// Cart rows joined with their products.
///
/// The product columns are selected under their own names, so the row
/// decodes with [`product_from_row`]; the cart columns are aliased.
pub async fn lines(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartLine>, StorageError> {
    let rows = query(
        "SELECT c.id AS cart_id, c.user_id AS cart_user_id, c.quantity AS cart_quantity, \
                p.id, p.name, p.slug, p.description, p.price_cents, p.compare_price_cents, \
                p.image, p.images, p.category_id, p.stock, p.rating, p.num_reviews, \
                p.is_featured, p.is_new \
         FROM cart_items c JOIN products p ON p.id = c.product_id \
         WHERE c.user_id = $1 ORDER BY c.id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| query_error("Cart item", e))?;

    rows.iter()
        .map(|row| -> Result<CartLine, PostgresError> {
            let product = product_from_row(row)?;
            let item = CartItem {
                id: row.try_get("cart_id")?,
                user_id: row.try_get("cart_user_id")?,
                product_id: product.id,
                quantity: row.try_get("cart_quantity")?,
            };
            Ok(CartLine::new(item, product))
        })
        .collect::<Result<Vec<_>, PostgresError>>()
        .map_err(StorageError::from)
}

/// Inserts a row or adds to the quantity of the existing one.
pub async fn upsert_add(
    conn: &mut PgConnection,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartItem, StorageError> {
    let sql = format!(
        "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, product_id) \
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
         RETURNING {CART_COLUMNS}"
    );
    let row = query(&sql)
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?;
    Ok(cart_item_from_row(&row)?)
}

/// Sets the quantity of a row owned by `user_id`.
pub async fn set_quantity(
    conn: &mut PgConnection,
    user_id: UserId,
    item_id: CartItemId,
    quantity: i32,
) -> Result<CartItem, StorageError> {
    let sql = format!(
        "UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2 \
         RETURNING {CART_COLUMNS}"
    );
    let row = query(&sql)
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?
        .ok_or_else(|| StorageError::not_found("Cart item", item_id))?;
    Ok(cart_item_from_row(&row)?)
}

/// Deletes a row owned by `user_id`.
pub async fn remove(
    conn: &mut PgConnection,
    user_id: UserId,
    item_id: CartItemId,
) -> Result<(), StorageError> {
    let result = query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(item_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("Cart item", item_id));
    }
    Ok(())
}

pub async fn clear(conn: &mut PgConnection, user_id: UserId) -> Result<(), StorageError> {
    query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?;
    Ok(())
}

/// Deletes the listed rows of `user_id`.
pub async fn remove_many(
    conn: &mut PgConnection,
    user_id: UserId,
    item_ids: &[CartItemId],
) -> Result<(), StorageError> {
    query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(item_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| query_error("Cart item", e))?;
    Ok(())
}

/// Which of `ids` exist in the catalog.
pub async fn existing_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<ProductId>, StorageError> {
    query_scalar("SELECT id FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Product", e))
}
