//! SQL query implementations for the PostgreSQL storage backend.
//!
//! Every function takes a `&mut PgConnection`, so the same query runs on a
//! pooled connection or inside a transaction (`&mut *tx`).

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod users;

use chrono::{DateTime, Utc};
use shopworld_core::Money;
use sqlx_core::row::Row;
use sqlx_postgres::PgRow;
use time::OffsetDateTime;

use crate::error::PostgresError;

/// Converts chrono DateTime to time OffsetDateTime.
pub(crate) fn chrono_to_time(dt: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(dt.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
        + time::Duration::nanoseconds(i64::from(dt.timestamp_subsec_nanos()))
}

/// Reads a cents column into [`Money`].
pub(crate) fn money(row: &PgRow, column: &str) -> Result<Money, PostgresError> {
    let cents: i64 = row.try_get(column)?;
    Money::from_cents(cents).map_err(|e| PostgresError::decode(format!("{column}: {e}")))
}

pub(crate) fn optional_money(row: &PgRow, column: &str) -> Result<Option<Money>, PostgresError> {
    let cents: Option<i64> = row.try_get(column)?;
    cents
        .map(Money::from_cents)
        .transpose()
        .map_err(|e| PostgresError::decode(format!("{column}: {e}")))
}
