//! Error types for the PostgreSQL storage backend.

use shopworld_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// PostgreSQL error code for unique violation (23505).
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL error code for foreign key violation (23503).
pub const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Checks if a sqlx error has a specific PostgreSQL error code.
pub fn has_pg_error_code(err: &SqlxError, code: &str) -> bool {
    if let SqlxError::Database(db_err) = err {
        db_err.code().as_deref() == Some(code)
    } else {
        false
    }
}

fn constraint_name(err: &SqlxError) -> Option<&str> {
    match err {
        SqlxError::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

/// The unique column behind a constraint or index name.
fn unique_field(constraint: &str) -> &'static str {
    if constraint.contains("username") {
        "username"
    } else if constraint.contains("email") {
        "email"
    } else if constraint.contains("slug") {
        "slug"
    } else {
        "id"
    }
}

/// The referenced entity behind a foreign key constraint name.
fn referenced_entity(constraint: &str) -> &'static str {
    if constraint.contains("category_id") {
        "Category"
    } else if constraint.contains("product_id") {
        "Product"
    } else if constraint.contains("order_id") {
        "Order"
    } else {
        "User"
    }
}

/// Maps a query failure on `entity` into a [`StorageError`].
///
/// Unique violations become `AlreadyExists`, foreign key violations become
/// `NotFound` on the referenced entity, everything else goes through
/// [`PostgresError`].
pub(crate) fn query_error(entity: &'static str, err: SqlxError) -> StorageError {
    if has_pg_error_code(&err, PG_UNIQUE_VIOLATION) {
        let field = constraint_name(&err).map(unique_field).unwrap_or("id");
        return StorageError::already_exists(entity, field);
    }
    if has_pg_error_code(&err, PG_FOREIGN_KEY_VIOLATION) {
        let constraint = constraint_name(&err).unwrap_or_default();
        return StorageError::not_found(referenced_entity(constraint), constraint);
    }
    PostgresError::from(err).into()
}

/// Errors specific to the PostgreSQL storage backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored value could not be turned back into a domain type.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Database(e) => match e {
                SqlxError::PoolTimedOut
                | SqlxError::PoolClosed
                | SqlxError::Io(_)
                | SqlxError::Tls(_) => StorageError::connection(e.to_string()),
                other => StorageError::internal(other.to_string()),
            },
            PostgresError::Migration(e) => StorageError::internal(format!("Migration error: {e}")),
            PostgresError::Decode { message } => {
                StorageError::internal(format!("Decode error: {message}"))
            }
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostgresError::config("invalid URL");
        assert!(err.to_string().contains("Configuration error"));

        let err = PostgresError::decode("negative price");
        assert!(err.to_string().contains("Decode error"));
    }

    #[test]
    fn test_conversion_to_storage_error() {
        let storage_err: StorageError = PostgresError::config("test error").into();
        assert!(matches!(storage_err, StorageError::Internal { .. }));

        let storage_err: StorageError = PostgresError::Database(SqlxError::PoolTimedOut).into();
        assert!(matches!(storage_err, StorageError::Connection { .. }));
    }

    #[test]
    fn constraint_names_map_to_fields_and_entities() {
        assert_eq!(unique_field("users_username_lower_key"), "username");
        assert_eq!(unique_field("users_email_lower_key"), "email");
        assert_eq!(unique_field("products_slug_key"), "slug");
        assert_eq!(referenced_entity("products_category_id_fkey"), "Category");
        assert_eq!(referenced_entity("cart_items_product_id_fkey"), "Product");
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = query_error("Product", SqlxError::RowNotFound);
        assert!(matches!(err, StorageError::Internal { .. }));
    }
}
