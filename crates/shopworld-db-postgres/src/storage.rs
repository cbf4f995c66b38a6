//! PostgreSQL implementation of the `ShopStorage` trait.

use async_trait::async_trait;
use shopworld_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, NewCartItem, NewCategory, NewOrder,
    NewProduct, NewUser, Order, OrderId, OrderLine, PricedLine, Product, ProductId, User, UserId,
    UserUpdate, merge_quantities, order_total,
};
use shopworld_storage::{ShopStorage, StorageError};
use sqlx_core::pool::PoolConnection;
use sqlx_postgres::{PgPool, PgTransaction, Postgres};
use tracing::{debug, instrument};

use crate::config::PostgresConfig;
use crate::error::PostgresError;
use crate::queries::{cart, catalog, orders, users};
use crate::{migrations, pool};

fn check_quantity(quantity: i32) -> Result<(), StorageError> {
    if quantity < 1 {
        return Err(StorageError::validation("Quantity must be at least 1"));
    }
    Ok(())
}

/// PostgreSQL storage backend for the storefront.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new `PostgresStorage` with the given configuration.
    ///
    /// This creates the connection pool and, if configured, runs migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Creates a new `PostgresStorage` from an existing connection pool.
    ///
    /// Migrations are not run automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn conn(&self) -> Result<PoolConnection<Postgres>, StorageError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| PostgresError::from(e).into())
    }

    async fn begin(&self) -> Result<PgTransaction<'static>, StorageError> {
        self.pool
            .begin()
            .await
            .map_err(|e| StorageError::transaction(format!("Failed to begin transaction: {e}")))
    }

    async fn commit(tx: PgTransaction<'static>) -> Result<(), StorageError> {
        tx.commit()
            .await
            .map_err(|e| StorageError::transaction(format!("Failed to commit transaction: {e}")))?;
        debug!("Transaction committed successfully");
        Ok(())
    }
}

#[async_trait]
impl ShopStorage for PostgresStorage {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        users::get(&mut *self.conn().await?, id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        users::get_by_username(&mut *self.conn().await?, username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        users::get_by_email(&mut *self.conn().await?, email).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        users::create(&mut *self.conn().await?, user).await
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, StorageError> {
        users::update(&mut *self.conn().await?, id, update).await
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), StorageError> {
        users::set_admin(&mut *self.conn().await?, id, is_admin).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        catalog::list_categories(&mut *self.conn().await?).await
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        catalog::get_category(&mut *self.conn().await?, id).await
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StorageError> {
        catalog::get_category_by_slug(&mut *self.conn().await?, slug).await
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, StorageError> {
        category.validate()?;
        catalog::create_category(&mut *self.conn().await?, category).await
    }

    async fn count_categories(&self) -> Result<i64, StorageError> {
        catalog::count_categories(&mut *self.conn().await?).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        catalog::list_products(&mut *self.conn().await?).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError> {
        catalog::get_product(&mut *self.conn().await?, id).await
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StorageError> {
        catalog::get_product_by_slug(&mut *self.conn().await?, slug).await
    }

    async fn products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, StorageError> {
        catalog::products_by_category(&mut *self.conn().await?, category_id).await
    }

    async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, StorageError> {
        catalog::featured_products(&mut *self.conn().await?, limit).await
    }

    async fn new_products(&self, limit: usize) -> Result<Vec<Product>, StorageError> {
        catalog::new_products(&mut *self.conn().await?, limit).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, StorageError> {
        product.validate()?;
        catalog::create_product(&mut *self.conn().await?, product).await
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, StorageError> {
        cart::items(&mut *self.conn().await?, user_id).await
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, StorageError> {
        cart::lines(&mut *self.conn().await?, user_id).await
    }

    async fn add_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StorageError> {
        check_quantity(quantity)?;
        let mut conn = self.conn().await?;
        if catalog::get_product(&mut conn, product_id).await?.is_none() {
            return Err(StorageError::not_found("Product", product_id));
        }
        cart::upsert_add(&mut conn, user_id, product_id, quantity).await
    }

    async fn update_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, StorageError> {
        check_quantity(quantity)?;
        cart::set_quantity(&mut *self.conn().await?, user_id, item_id, quantity).await
    }

    async fn remove_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), StorageError> {
        cart::remove(&mut *self.conn().await?, user_id, item_id).await
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StorageError> {
        cart::clear(&mut *self.conn().await?, user_id).await
    }

    #[instrument(skip(self, items), fields(incoming = items.len()))]
    async fn merge_cart(
        &self,
        user_id: UserId,
        items: &[NewCartItem],
    ) -> Result<Vec<CartLine>, StorageError> {
        let mut tx = self.begin().await?;

        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let known = cart::existing_products(&mut tx, &ids).await?;
        let incoming: Vec<(ProductId, i32)> = items
            .iter()
            .filter(|item| known.contains(&item.product_id))
            .map(|item| (item.product_id, item.quantity))
            .collect();

        // Additive upserts, so rows written concurrently keep their quantity.
        for (product_id, quantity) in merge_quantities(&[], &incoming) {
            cart::upsert_add(&mut tx, user_id, product_id, quantity).await?;
        }
        let lines = cart::lines(&mut tx, user_id).await?;
        Self::commit(tx).await?;
        Ok(lines)
    }

    #[instrument(skip(self, order))]
    async fn create_order(&self, user_id: UserId, order: &NewOrder) -> Result<Order, StorageError> {
        order.validate()?;
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.begin().await?;

        let cart_rows = cart::items_for_update(&mut tx, user_id).await?;
        let requested: Vec<(ProductId, i32)> = match &order.order_items {
            Some(items) => items.iter().map(|i| (i.product_id, i.quantity)).collect(),
            None => cart_rows.iter().map(|i| (i.product_id, i.quantity)).collect(),
        };
        let mut requested = merge_quantities(&[], &requested);
        if requested.is_empty() {
            return Err(StorageError::validation("Order items are required"));
        }
        // Products are locked in id order so overlapping checkouts cannot deadlock.
        requested.sort_unstable_by_key(|(product_id, _)| *product_id);

        let mut priced = Vec::with_capacity(requested.len());
        for (product_id, quantity) in requested {
            let product = catalog::get_product_for_update(&mut tx, product_id)
                .await?
                .ok_or_else(|| StorageError::not_found("Product", product_id))?;
            if product.stock < quantity {
                return Err(StorageError::insufficient_stock(
                    product_id,
                    quantity,
                    product.stock,
                ));
            }
            priced.push(PricedLine {
                product_id,
                quantity,
                unit_price: product.price,
            });
        }
        let total = order_total(&priced)?;

        let created = orders::insert_order(&mut tx, user_id, total, &order.shipping).await?;
        for line in &priced {
            orders::insert_item(&mut tx, created.id, line).await?;
            catalog::decrement_stock(&mut tx, line.product_id, line.quantity).await?;
        }
        let cleared: Vec<CartItemId> = cart_rows.iter().map(|item| item.id).collect();
        cart::remove_many(&mut tx, user_id, &cleared).await?;

        Self::commit(tx).await?;
        debug!(order_id = created.id, total = %created.total, "Order created");
        Ok(created)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StorageError> {
        orders::for_user(&mut *self.conn().await?, user_id).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        orders::get(&mut *self.conn().await?, id).await
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StorageError> {
        orders::lines(&mut *self.conn().await?, order_id).await
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        pool::test_connection(&self.pool)
            .await
            .map_err(|e| StorageError::connection(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
