//! `ShopStorage` implementation for [`InMemoryStorage`].

use async_trait::async_trait;
use shopworld_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, NewCartItem, NewCategory, NewOrder,
    NewProduct, NewUser, Order, OrderId, OrderItem, OrderLine, OrderStatus, PricedLine, Product,
    ProductId, User, UserId, UserUpdate, merge_quantities, order_total,
};
use shopworld_storage::{ShopStorage, StorageError};
use time::OffsetDateTime;

use crate::storage::InMemoryStorage;

fn check_quantity(quantity: i32) -> Result<(), StorageError> {
    if quantity < 1 {
        return Err(StorageError::validation("Quantity must be at least 1"));
    }
    Ok(())
}

#[async_trait]
impl ShopStorage for InMemoryStorage {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.state.read().await.user_with_username(username).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self.state.read().await.user_with_email(email).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let mut state = self.state.write().await;
        if state.user_with_username(&user.username).is_some() {
            return Err(StorageError::already_exists("User", "username"));
        }
        if state.user_with_email(&user.email).is_some() {
            return Err(StorageError::already_exists("User", "email"));
        }
        let created = User {
            id: state.seq.next_user(),
            username: user.username.clone(),
            password_hash: user.password.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            address: user.address.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            zip_code: user.zip_code.clone(),
            country: user.country.clone(),
            phone: user.phone.clone(),
            is_admin: false,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, StorageError> {
        let mut state = self.state.write().await;
        if let Some(username) = &update.username
            && state
                .user_with_username(username)
                .is_some_and(|other| other.id != id)
        {
            return Err(StorageError::already_exists("User", "username"));
        }
        if let Some(email) = &update.email
            && state.user_with_email(email).is_some_and(|other| other.id != id)
        {
            return Err(StorageError::already_exists("User", "email"));
        }
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("User", id))?;

        if let Some(v) = &update.username {
            user.username = v.clone();
        }
        if let Some(v) = &update.password {
            user.password_hash = v.clone();
        }
        if let Some(v) = &update.email {
            user.email = v.clone();
        }
        let optional = [
            (&mut user.first_name, &update.first_name),
            (&mut user.last_name, &update.last_name),
            (&mut user.address, &update.address),
            (&mut user.city, &update.city),
            (&mut user.state, &update.state),
            (&mut user.zip_code, &update.zip_code),
            (&mut user.country, &update.country),
            (&mut user.phone, &update.phone),
        ];
        for (field, value) in optional {
            if value.is_some() {
                field.clone_from(value);
            }
        }
        Ok(user.clone())
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("User", id))?;
        user.is_admin = is_admin;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StorageError> {
        let state = self.state.read().await;
        Ok(state.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, StorageError> {
        category.validate()?;
        let slug = category.resolved_slug();
        let mut state = self.state.write().await;
        if state.categories.values().any(|c| c.slug == slug) {
            return Err(StorageError::already_exists("Category", "slug"));
        }
        let created = Category {
            id: state.seq.next_category(),
            name: category.name.clone(),
            slug,
            image: category.image.clone(),
            icon: category.icon.clone(),
        };
        state.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn count_categories(&self) -> Result<i64, StorageError> {
        Ok(self.state.read().await.categories.len() as i64)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StorageError> {
        Ok(self.state.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StorageError> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StorageError> {
        let state = self.state.read().await;
        Ok(state.products.values().find(|p| p.slug == slug).cloned())
    }

    async fn products_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.category_id == Some(category_id))
            .cloned()
            .collect())
    }

    async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.is_featured)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn new_products(&self, limit: usize) -> Result<Vec<Product>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.is_new)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, StorageError> {
        product.validate()?;
        let slug = product.resolved_slug();
        let mut state = self.state.write().await;
        if let Some(category_id) = product.category_id
            && !state.categories.contains_key(&category_id)
        {
            return Err(StorageError::not_found("Category", category_id));
        }
        if state.products.values().any(|p| p.slug == slug) {
            return Err(StorageError::already_exists("Product", "slug"));
        }
        let created = Product {
            id: state.seq.next_product(),
            name: product.name.clone(),
            slug,
            description: product.description.clone(),
            price: product.price,
            compare_price: product.compare_price,
            image: product.image.clone(),
            images: product.images.clone(),
            category_id: product.category_id,
            stock: product.stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            is_featured: product.is_featured,
            is_new: product.is_new,
        };
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, StorageError> {
        Ok(self.state.read().await.user_cart(user_id).cloned().collect())
    }

    async fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, StorageError> {
        self.state.read().await.cart_lines(user_id)
    }

    async fn add_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StorageError> {
        check_quantity(quantity)?;
        let mut state = self.state.write().await;
        if !state.products.contains_key(&product_id) {
            return Err(StorageError::not_found("Product", product_id));
        }
        if let Some(row) = state.cart_row_mut(user_id, product_id) {
            row.quantity = row.quantity.saturating_add(quantity);
            return Ok(row.clone());
        }
        Ok(state.insert_cart_row(user_id, product_id, quantity))
    }

    async fn update_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, StorageError> {
        check_quantity(quantity)?;
        let mut state = self.state.write().await;
        let row = state.owned_cart_row_mut(user_id, item_id)?;
        row.quantity = quantity;
        Ok(row.clone())
    }

    async fn remove_cart_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.owned_cart_row_mut(user_id, item_id)?;
        state.cart_items.remove(&item_id);
        Ok(())
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.cart_items.retain(|_, item| item.user_id != user_id);
        Ok(())
    }

    async fn merge_cart(
        &self,
        user_id: UserId,
        items: &[NewCartItem],
    ) -> Result<Vec<CartLine>, StorageError> {
        let mut state = self.state.write().await;
        let existing: Vec<(ProductId, i32)> = state
            .user_cart(user_id)
            .map(|item| (item.product_id, item.quantity))
            .collect();
        let incoming: Vec<(ProductId, i32)> = items
            .iter()
            .filter(|item| state.products.contains_key(&item.product_id))
            .map(|item| (item.product_id, item.quantity))
            .collect();

        for (product_id, quantity) in merge_quantities(&existing, &incoming) {
            match state.cart_row_mut(user_id, product_id) {
                Some(row) => row.quantity = quantity,
                None => {
                    state.insert_cart_row(user_id, product_id, quantity);
                }
            }
        }
        state.cart_lines(user_id)
    }

    async fn create_order(&self, user_id: UserId, order: &NewOrder) -> Result<Order, StorageError> {
        order.validate()?;
        let mut state = self.state.write().await;

        let requested: Vec<(ProductId, i32)> = match &order.order_items {
            Some(items) => items.iter().map(|i| (i.product_id, i.quantity)).collect(),
            None => state
                .user_cart(user_id)
                .map(|i| (i.product_id, i.quantity))
                .collect(),
        };
        let requested = merge_quantities(&[], &requested);
        if requested.is_empty() {
            return Err(StorageError::validation("Order items are required"));
        }

        // Check everything before the first write so a failure leaves no trace.
        let mut priced = Vec::with_capacity(requested.len());
        for (product_id, quantity) in requested {
            let product = state
                .products
                .get(&product_id)
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

        let shipping = &order.shipping;
        let created = Order {
            id: state.seq.next_order(),
            user_id,
            status: OrderStatus::Pending,
            total,
            shipping_address: shipping.shipping_address.clone(),
            shipping_city: shipping.shipping_city.clone(),
            shipping_state: shipping.shipping_state.clone(),
            shipping_zip_code: shipping.shipping_zip_code.clone(),
            shipping_country: shipping.shipping_country.clone(),
            payment_method: shipping.payment_method.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        state.orders.insert(created.id, created.clone());

        for line in &priced {
            let item = OrderItem {
                id: state.seq.next_order_item(),
                order_id: created.id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.unit_price,
            };
            state.order_items.insert(item.id, item);
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
            }
        }
        state.cart_items.retain(|_, item| item.user_id != user_id);

        Ok(created)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StorageError> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StorageError> {
        self.state.read().await.order_lines(order_id)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopworld_core::{Money, OrderItemRequest, ShippingDetails};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: "$argon2id$hash".into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            country: None,
            phone: None,
        }
    }

    fn new_product(name: &str, price: i64, stock: i32) -> NewProduct {
        NewProduct {
            name: name.into(),
            slug: None,
            description: format!("{name} description"),
            price: Money::from_units(price).unwrap(),
            compare_price: None,
            image: "https://img/p.jpg".into(),
            images: vec![],
            category_id: None,
            stock,
            rating: None,
            num_reviews: 0,
            is_featured: false,
            is_new: false,
        }
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            shipping_address: "1 Main St".into(),
            shipping_city: "Springfield".into(),
            shipping_state: "IL".into(),
            shipping_zip_code: "62701".into(),
            shipping_country: "US".into(),
            payment_method: "card".into(),
        }
    }

    fn order_from_cart() -> NewOrder {
        NewOrder {
            shipping: shipping(),
            order_items: None,
        }
    }

    async fn setup() -> (InMemoryStorage, User, Product, Product) {
        let storage = InMemoryStorage::new();
        let user = storage
            .create_user(&new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let phone = storage
            .create_product(&new_product("Smartphone X", 799, 10))
            .await
            .unwrap();
        let headphones = storage
            .create_product(&new_product("Wireless Headphones", 249, 1))
            .await
            .unwrap();
        (storage, user, phone, headphones)
    }

    #[tokio::test]
    async fn usernames_and_emails_are_unique_ignoring_case() {
        let (storage, _, _, _) = setup().await;
        let err = storage
            .create_user(&new_user("ALICE", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::AlreadyExists {
                field: "username",
                ..
            }
        ));
        let err = storage
            .create_user(&new_user("bob", "Alice@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { field: "email", .. }));
        assert!(storage.get_user_by_username("Alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_user_ignores_own_row_for_uniqueness() {
        let (storage, alice, _, _) = setup().await;
        let bob = storage
            .create_user(&new_user("bob", "bob@example.com"))
            .await
            .unwrap();

        let update = UserUpdate {
            email: Some("alice@example.com".into()),
            city: Some("Springfield".into()),
            ..Default::default()
        };
        let updated = storage.update_user(alice.id, &update).await.unwrap();
        assert_eq!(updated.city.as_deref(), Some("Springfield"));

        let steal = UserUpdate {
            username: Some("alice".into()),
            ..Default::default()
        };
        let err = storage.update_user(bob.id, &steal).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn adding_the_same_product_twice_merges_rows() {
        let (storage, user, phone, _) = setup().await;
        storage.add_cart_item(user.id, phone.id, 1).await.unwrap();
        let row = storage.add_cart_item(user.id, phone.id, 2).await.unwrap();
        assert_eq!(row.quantity, 3);

        let items = storage.cart_items(user.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn add_cart_item_rejects_unknown_product_and_bad_quantity() {
        let (storage, user, phone, _) = setup().await;
        assert!(
            storage
                .add_cart_item(user.id, 999, 1)
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(matches!(
            storage.add_cart_item(user.id, phone.id, 0).await,
            Err(StorageError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn cart_rows_are_only_touched_by_their_owner() {
        let (storage, alice, phone, _) = setup().await;
        let bob = storage
            .create_user(&new_user("bob", "bob@example.com"))
            .await
            .unwrap();
        let row = storage.add_cart_item(alice.id, phone.id, 1).await.unwrap();

        assert!(
            storage
                .update_cart_item(bob.id, row.id, 5)
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            storage
                .remove_cart_item(bob.id, row.id)
                .await
                .unwrap_err()
                .is_not_found()
        );
        storage.update_cart_item(alice.id, row.id, 4).await.unwrap();
        assert_eq!(storage.cart_items(alice.id).await.unwrap()[0].quantity, 4);
        storage.remove_cart_item(alice.id, row.id).await.unwrap();
        assert!(storage.cart_items(alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merge_cart_sums_and_skips_unknown_products() {
        let (storage, user, phone, headphones) = setup().await;
        storage.add_cart_item(user.id, phone.id, 1).await.unwrap();

        let guest = [
            NewCartItem {
                product_id: phone.id,
                quantity: 2,
            },
            NewCartItem {
                product_id: 404,
                quantity: 1,
            },
            NewCartItem {
                product_id: headphones.id,
                quantity: 0,
            },
            NewCartItem {
                product_id: headphones.id,
                quantity: 1,
            },
        ];
        let lines = storage.merge_cart(user.id, &guest).await.unwrap();
        let summary: Vec<(ProductId, i32)> =
            lines.iter().map(|l| (l.product_id, l.quantity)).collect();
        assert_eq!(summary, vec![(phone.id, 3), (headphones.id, 1)]);
        assert_eq!(lines[0].product.name, "Smartphone X");
    }

    #[tokio::test]
    async fn create_order_from_cart_prices_decrements_and_clears() {
        let (storage, user, phone, headphones) = setup().await;
        storage.add_cart_item(user.id, phone.id, 2).await.unwrap();
        storage.add_cart_item(user.id, headphones.id, 1).await.unwrap();

        let order = storage.create_order(user.id, &order_from_cart()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.to_string(), "1847.00");

        let lines = storage.order_lines(order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].price, phone.price);
        assert!(storage.cart_items(user.id).await.unwrap().is_empty());
        let phone_after = storage.get_product(phone.id).await.unwrap().unwrap();
        assert_eq!(phone_after.stock, 8);
    }

    #[tokio::test]
    async fn create_order_with_insufficient_stock_writes_nothing() {
        let (storage, user, phone, headphones) = setup().await;
        storage.add_cart_item(user.id, phone.id, 1).await.unwrap();
        storage.add_cart_item(user.id, headphones.id, 2).await.unwrap();

        let err = storage
            .create_order(user.id, &order_from_cart())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert!(storage.orders_for_user(user.id).await.unwrap().is_empty());
        assert_eq!(storage.cart_items(user.id).await.unwrap().len(), 2);
        let phone_after = storage.get_product(phone.id).await.unwrap().unwrap();
        assert_eq!(phone_after.stock, 10);
    }

    #[tokio::test]
    async fn create_order_requires_lines() {
        let (storage, user, _, _) = setup().await;
        let err = storage
            .create_order(user.id, &order_from_cart())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Order items are required");
    }

    #[tokio::test]
    async fn explicit_items_ignore_the_cart_and_unknown_products_fail() {
        let (storage, user, phone, headphones) = setup().await;
        storage.add_cart_item(user.id, headphones.id, 1).await.unwrap();

        let order = NewOrder {
            shipping: shipping(),
            order_items: Some(vec![OrderItemRequest {
                product_id: phone.id,
                quantity: 1,
            }]),
        };
        let placed = storage.create_order(user.id, &order).await.unwrap();
        assert_eq!(placed.total, phone.price);

        let missing = NewOrder {
            shipping: shipping(),
            order_items: Some(vec![OrderItemRequest {
                product_id: 77,
                quantity: 1,
            }]),
        };
        let err = storage.create_order(user.id, &missing).await.unwrap_err();
        assert_eq!(err.to_string(), "Product with id 77 not found");
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() {
        let (storage, user, phone, _) = setup().await;
        let order = NewOrder {
            shipping: shipping(),
            order_items: Some(vec![OrderItemRequest {
                product_id: phone.id,
                quantity: 1,
            }]),
        };
        let first = storage.create_order(user.id, &order).await.unwrap();
        let second = storage.create_order(user.id, &order).await.unwrap();
        let ids: Vec<OrderId> = storage
            .orders_for_user(user.id)
            .await
            .unwrap()
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn featured_and_new_listings_respect_limit() {
        let storage = InMemoryStorage::new();
        for i in 0..4 {
            let mut product = new_product(&format!("Item {i}"), 10, 1);
            product.is_featured = i % 2 == 0;
            product.is_new = true;
            storage.create_product(&product).await.unwrap();
        }
        assert_eq!(storage.featured_products(10).await.unwrap().len(), 2);
        assert_eq!(storage.new_products(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn product_slugs_are_unique_and_categories_must_exist() {
        let (storage, _, _, _) = setup().await;
        let err = storage
            .create_product(&new_product("Smartphone X", 1, 1))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        let mut orphan = new_product("Lamp", 30, 1);
        orphan.category_id = Some(42);
        assert!(storage.create_product(&orphan).await.unwrap_err().is_not_found());
    }
}
