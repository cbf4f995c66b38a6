//! The storage trait implemented by every backend.

use async_trait::async_trait;
use shopworld_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, NewCartItem, NewCategory, NewOrder,
    NewProduct, NewUser, Order, OrderId, OrderLine, Product, ProductId, User, UserId, UserUpdate,
};

use crate::error::StorageError;

/// The storefront storage contract.
///
/// Implementations must be thread-safe (`Send + Sync`). Lookups return
/// `Ok(None)` for missing rows; only mutations report `NotFound`.
///
/// Passwords never reach this layer in plaintext: the `password` fields of
/// [`NewUser`] and [`UserUpdate`] carry an already computed hash.
#[async_trait]
pub trait ShopStorage: Send + Sync {
    // ==================== Users ====================

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Case-insensitive username lookup.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Case-insensitive email lookup.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError>;

    /// Applies the fields present in `update`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    /// Returns `StorageError::AlreadyExists` if the new username or email
    /// belongs to another user.
    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, StorageError>;

    /// Grants or revokes administrator rights.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), StorageError>;

    // ==================== Catalog ====================

    /// All categories ordered by id.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError>;

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the slug is taken.
    async fn create_category(&self, category: &NewCategory) -> Result<Category, StorageError>;

    /// Number of categories, used to decide whether to seed the catalog.
    async fn count_categories(&self) -> Result<i64, StorageError>;

    /// All products ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, StorageError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError>;

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StorageError>;

    async fn products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, StorageError>;

    /// Up to `limit` products flagged `is_featured`, ordered by id.
    async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, StorageError>;

    /// Up to `limit` products flagged `is_new`, ordered by id.
    async fn new_products(&self, limit: usize) -> Result<Vec<Product>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the slug is taken.
    /// Returns `StorageError::NotFound` when `category_id` names no category.
    async fn create_product(&self, product: &NewProduct) -> Result<Product, StorageError>;

    // ==================== Cart ====================

    /// The user's cart rows in insertion order.
    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, StorageError>;

    /// The user's cart rows joined with their products, in insertion order.
    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, StorageError>;

    /// Adds `quantity` units of a product to the cart.
    ///
    /// A product already in the cart has its row's quantity increased; no
    /// second row is ever created for the same product.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the product does not exist.
    /// Returns `StorageError::Validation` if `quantity < 1`.
    async fn add_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StorageError>;

    /// Sets the quantity of one of the user's cart rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row does not exist or belongs
    /// to another user.
    /// Returns `StorageError::Validation` if `quantity < 1`.
    async fn update_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the row does not exist or belongs
    /// to another user.
    async fn remove_cart_item(&self, user_id: UserId, item_id: CartItemId)
    -> Result<(), StorageError>;

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StorageError>;

    /// Reconciles a guest cart with the stored cart in one atomic step.
    ///
    /// Quantities of products present on both sides are summed. Unknown
    /// products and non-positive quantities are skipped. Returns the
    /// resulting cart lines.
    async fn merge_cart(
        &self,
        user_id: UserId,
        items: &[NewCartItem],
    ) -> Result<Vec<CartLine>, StorageError>;

    // ==================== Orders ====================

    /// Places an order atomically.
    ///
    /// Lines come from `order.order_items` when present, otherwise from the
    /// user's cart. Every line is priced from the catalog, stock is checked
    /// and decremented, and the cart is emptied. Nothing is written unless
    /// every step succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` when there are no lines.
    /// Returns `StorageError::NotFound` for an unknown product.
    /// Returns `StorageError::InsufficientStock` when a line exceeds stock.
    async fn create_order(&self, user_id: UserId, order: &NewOrder) -> Result<Order, StorageError>;

    /// The user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StorageError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError>;

    /// The order's items joined with their products, ordered by item id.
    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StorageError>;

    // ==================== Metadata ====================

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` when it is not.
    async fn health_check(&self) -> Result<(), StorageError>;

    /// Short backend identifier for logs, e.g. `"memory"`.
    fn backend_name(&self) -> &'static str;
}
