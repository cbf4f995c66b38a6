//! In-memory storage backend for the ShopWorld server.
//!
//! This crate provides an implementation of the `ShopStorage` trait from
//! `shopworld-storage` that keeps every table in process memory. It is the
//! backend used by tests and by `storage.backend = "memory"`.
//!
//! # Example
//!
//! ```ignore
//! use shopworld_db_memory::InMemoryStorage;
//! use shopworld_storage::ShopStorage;
//!
//! let storage = InMemoryStorage::new();
//! let categories = storage.list_categories().await?;
//! ```

mod shop_impl;
pub mod storage;

pub use shopworld_storage::{DynStorage, ShopStorage, StorageError};
pub use storage::InMemoryStorage;

/// Creates a new, empty in-memory storage behind a shared trait object.
pub fn create_storage() -> DynStorage {
    std::sync::Arc::new(InMemoryStorage::new())
}
