//! # shopworld-storage
//!
//! Storage abstraction layer for the ShopWorld server.
//!
//! This crate defines the trait that every storage backend implements and
//! the error type shared by all of them. It contains no implementations;
//! those live in `shopworld-db-memory` and `shopworld-db-postgres`.
//!
//! ## Example
//!
//! ```ignore
//! use shopworld_storage::{ShopStorage, StorageError};
//!
//! async fn cart_size(storage: &dyn ShopStorage, user_id: i32) -> Result<i32, StorageError> {
//!     let items = storage.cart_items(user_id).await?;
//!     Ok(items.iter().map(|item| item.quantity).sum())
//! }
//! ```

mod error;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::ShopStorage;

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn ShopStorage>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use shopworld_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::ShopStorage;
    pub use crate::{DynStorage, StorageResult};
}
