//! Order queries.

use chrono::{DateTime, Utc};
use shopworld_core::{
    Money, Order, OrderId, OrderItem, OrderLine, OrderStatus, PricedLine, ShippingDetails, UserId,
};
use shopworld_storage::StorageError;
use sqlx_core::query::query;
use sqlx_core::row::Row;
use sqlx_postgres::{PgConnection, PgRow};

use super::catalog::product_from_row;
use super::{chrono_to_time, money};
use crate::error::{PostgresError, query_error};

const ORDER_COLUMNS: &str = "id, user_id, status::text AS status, total_cents, \
     shipping_address, shipping_city, shipping_state, shipping_zip_code, shipping_country, \
     payment_method, created_at";

fn order_from_row(row: &PgRow) -> Result<Order, PostgresError> {
    let status: String = row.try_get("status")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|e| PostgresError::decode(e.to_string()))?,
        total: money(row, "total_cents")?,
        shipping_address: row.try_get("shipping_address")?,
        shipping_city: row.try_get("shipping_city")?,
        shipping_state: row.try_get("shipping_state")?,
        shipping_zip_code: row.try_get("shipping_zip_code")?,
        shipping_country: row.try_get("shipping_country")?,
        payment_method: row.try_get("payment_method")?,
        created_at: chrono_to_time(created_at),
    })
}

pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    total: Money,
    shipping: &ShippingDetails,
) -> Result<Order, StorageError> {
    let sql = format!(
        "INSERT INTO orders (user_id, status, total_cents, shipping_address, shipping_city, \
                             shipping_state, shipping_zip_code, shipping_country, payment_method) \
         VALUES ($1, $2::order_status, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {ORDER_COLUMNS}"
    );
    let row = query(&sql)
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(total.cents())
        .bind(&shipping.shipping_address)
        .bind(&shipping.shipping_city)
        .bind(&shipping.shipping_state)
        .bind(&shipping.shipping_zip_code)
        .bind(&shipping.shipping_country)
        .bind(&shipping.payment_method)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| query_error("Order", e))?;
    Ok(order_from_row(&row)?)
}

pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    line: &PricedLine,
) -> Result<OrderItem, StorageError> {
    let row = query(
        "INSERT INTO order_items (order_id, product_id, quantity, price_cents) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.unit_price.cents())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| query_error("Order item", e))?;
    Ok(OrderItem {
        id: row.try_get("id").map_err(PostgresError::from)?,
        order_id,
        product_id: line.product_id,
        quantity: line.quantity,
        price: line.unit_price,
    })
}

pub async fn for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<Order>, StorageError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    );
    let rows = query(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| query_error("Order", e))?;
    rows.iter()
        .map(|row| order_from_row(row).map_err(StorageError::from))
        .collect()
}

pub async fn get(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, StorageError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("Order", e))?;
    Ok(row.as_ref().map(order_from_row).transpose()?)
}

pub async fn lines(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderLine>, StorageError> {
    let rows = query(
        "SELECT i.id AS item_id, i.quantity AS item_quantity, i.price_cents AS item_price_cents, \
                p.id, p.name, p.slug, p.description, p.price_cents, p.compare_price_cents, \
                p.image, p.images, p.category_id, p.stock, p.rating, p.num_reviews, \
                p.is_featured, p.is_new \
         FROM order_items i JOIN products p ON p.id = i.product_id \
         WHERE i.order_id = $1 ORDER BY i.id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| query_error("Order item", e))?;

    rows.iter()
        .map(|row| -> Result<OrderLine, PostgresError> {
            let product = product_from_row(row)?;
            let item = OrderItem {
                id: row.try_get("item_id")?,
                order_id,
                product_id: product.id,
                quantity: row.try_get("item_quantity")?,
                price: money(row, "item_price_cents")?,
            };
            Ok(OrderLine::new(item, product))
        })
        .collect::<Result<Vec<_>, PostgresError>>()
        .map_err(StorageError::from)
}
