//! User queries.

use shopworld_core::{NewUser, User, UserId, UserUpdate};
use shopworld_storage::StorageError;
use sqlx_core::query::query;
use sqlx_core::row::Row;
use sqlx_postgres::{PgConnection, PgRow};

use crate::error::{PostgresError, query_error};

const USER_COLUMNS: &str = "id, username, password, email, first_name, last_name, address, \
                            city, state, zip_code, country, phone, is_admin";

fn user_from_row(row: &PgRow) -> Result<User, PostgresError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        country: row.try_get("country")?,
        phone: row.try_get("phone")?,
        is_admin: row.try_get("is_admin")?,
    })
}

async fn fetch_one_where(
    conn: &mut PgConnection,
    predicate: &str,
    value: &str,
) -> Result<Option<User>, StorageError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
    let row = query(&sql)
        .bind(value)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("User", e))?;
    row.as_ref()
        .map(user_from_row)
        .transpose()
        .map_err(StorageError::from)
}

pub async fn get(conn: &mut PgConnection, id: UserId) -> Result<Option<User>, StorageError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("User", e))?;
    row.as_ref()
        .map(user_from_row)
        .transpose()
        .map_err(StorageError::from)
}

pub async fn get_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> Result<Option<User>, StorageError> {
    fetch_one_where(conn, "LOWER(username) = LOWER($1)", username).await
}

pub async fn get_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<User>, StorageError> {
    fetch_one_where(conn, "LOWER(email) = LOWER($1)", email).await
}

pub async fn create(conn: &mut PgConnection, user: &NewUser) -> Result<User, StorageError> {
    let sql = format!(
        "INSERT INTO users (username, password, email, first_name, last_name, address, \
                            city, state, zip_code, country, phone) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {USER_COLUMNS}"
    );
    let row = query(&sql)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.address)
        .bind(&user.city)
        .bind(&user.state)
        .bind(&user.zip_code)
        .bind(&user.country)
        .bind(&user.phone)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| query_error("User", e))?;
    Ok(user_from_row(&row)?)
}

/// Applies the present fields; `COALESCE` keeps the stored value for the rest.
pub async fn update(
    conn: &mut PgConnection,
    id: UserId,
    update: &UserUpdate,
) -> Result<User, StorageError> {
    let sql = format!(
        "UPDATE users SET \
             username = COALESCE($2, username), \
             password = COALESCE($3, password), \
             email = COALESCE($4, email), \
             first_name = COALESCE($5, first_name), \
             last_name = COALESCE($6, last_name), \
             address = COALESCE($7, address), \
             city = COALESCE($8, city), \
             state = COALESCE($9, state), \
             zip_code = COALESCE($10, zip_code), \
             country = COALESCE($11, country), \
             phone = COALESCE($12, phone) \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    );
    let row = query(&sql)
        .bind(id)
        .bind(&update.username)
        .bind(&update.password)
        .bind(&update.email)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.address)
        .bind(&update.city)
        .bind(&update.state)
        .bind(&update.zip_code)
        .bind(&update.country)
        .bind(&update.phone)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| query_error("User", e))?
        .ok_or_else(|| StorageError::not_found("User", id))?;
    Ok(user_from_row(&row)?)
}

/// Promotes an existing user to administrator.
pub async fn set_admin(
    conn: &mut PgConnection,
    id: UserId,
    is_admin: bool,
) -> Result<(), StorageError> {
    let result = query("UPDATE users SET is_admin = $2 WHERE id = $1")
        .bind(id)
        .bind(is_admin)
        .execute(&mut *conn)
        .await
        .map_err(|e| query_error("User", e))?;
    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("User", id));
    }
    Ok(())
}
