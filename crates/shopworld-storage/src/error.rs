//! Storage error types for the storefront storage layer.

use std::fmt;

use shopworld_core::{CoreError, ProductId};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested row was not found.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name, e.g. `Product`.
        entity: &'static str,
        /// The id or slug that was looked up.
        id: String,
    },

    /// A unique field already holds the given value.
    #[error("{entity} with this {field} already exists")]
    AlreadyExists {
        entity: &'static str,
        /// The unique column, e.g. `username`.
        field: &'static str,
    },

    /// The input was rejected by a domain rule.
    #[error("{message}")]
    Validation { message: String },

    /// Checkout asked for more units than a product has in stock.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// An error occurred during a transaction.
    #[error("Transaction error: {message}")]
    Transaction { message: String },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(entity: &'static str, field: &'static str) -> Self {
        Self::AlreadyExists { entity, field }
    }

    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `InsufficientStock` error.
    #[must_use]
    pub fn insufficient_stock(product_id: ProductId, requested: i32, available: i32) -> Self {
        Self::InsufficientStock {
            product_id,
            requested,
            available,
        }
    }

    /// Creates a new `Transaction` error.
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns `true` if checkout failed on stock.
    #[must_use]
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::InsufficientStock { .. } => ErrorCategory::Conflict,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Transaction { .. } => ErrorCategory::Transaction,
            Self::Connection { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<CoreError> for StorageError {
    fn from(err: CoreError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Categories of storage errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    /// Uniqueness or stock conflict.
    Conflict,
    Validation,
    Transaction,
    /// Connection or pool failure.
    Infrastructure,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Transaction => write!(f, "transaction"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("Product", 42);
        assert_eq!(err.to_string(), "Product with id 42 not found");

        let err = StorageError::already_exists("User", "email");
        assert_eq!(err.to_string(), "User with this email already exists");

        let err = StorageError::validation("Order items are required");
        assert_eq!(err.to_string(), "Order items are required");

        let err = StorageError::insufficient_stock(3, 5, 2);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 3: requested 5, available 2"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found("Order", 1);
        assert!(err.is_not_found());
        assert!(!err.is_already_exists());
        assert!(!err.is_insufficient_stock());

        let err = StorageError::insufficient_stock(1, 2, 0);
        assert!(err.is_insufficient_stock());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("Product", 1).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::already_exists("Category", "slug").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::insufficient_stock(1, 2, 1).category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::validation("bad").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            StorageError::connection("refused").category().to_string(),
            "infrastructure"
        );
    }

    #[test]
    fn core_errors_become_validation_errors() {
        let err: StorageError = CoreError::invalid_field("quantity", "must be at least 1").into();
        assert!(matches!(err, StorageError::Validation { .. }));
        assert_eq!(err.to_string(), "quantity: must be at least 1");

        let err: StorageError = CoreError::AmountOverflow("order total").into();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}
