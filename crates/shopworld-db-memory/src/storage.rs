use std::collections::BTreeMap;

use shopworld_core::{
    CartItem, CartItemId, CartLine, Category, CategoryId, Order, OrderId, OrderItem, OrderItemId,
    OrderLine, Product, ProductId, User, UserId,
};
use shopworld_storage::StorageError;
use tokio::sync::RwLock;

/// In-memory storefront storage.
///
/// Every table lives in one [`State`] behind a single `RwLock`. Each
/// mutating operation holds the write guard for its whole duration, so
/// checkout and cart merges are atomic with respect to every other call.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    pub(crate) state: RwLock<State>,
}

impl InMemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-table id sequences. Every sequence starts at 1, like `SERIAL`.
#[derive(Debug)]
pub(crate) struct Sequences {
    user: i32,
    category: i32,
    product: i32,
    cart_item: i32,
    order: i32,
    order_item: i32,
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            user: 1,
            category: 1,
            product: 1,
            cart_item: 1,
            order: 1,
            order_item: 1,
        }
    }
}

fn bump(counter: &mut i32) -> i32 {
    let id = *counter;
    *counter += 1;
    id
}

impl Sequences {
    pub(crate) fn next_user(&mut self) -> UserId {
        bump(&mut self.user)
    }

    pub(crate) fn next_category(&mut self) -> CategoryId {
        bump(&mut self.category)
    }

    pub(crate) fn next_product(&mut self) -> ProductId {
        bump(&mut self.product)
    }

    pub(crate) fn next_cart_item(&mut self) -> CartItemId {
        bump(&mut self.cart_item)
    }

    pub(crate) fn next_order(&mut self) -> OrderId {
        bump(&mut self.order)
    }

    pub(crate) fn next_order_item(&mut self) -> OrderItemId {
        bump(&mut self.order_item)
    }
}

/// The tables. `BTreeMap` keeps rows in id order, which is insertion order.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) categories: BTreeMap<CategoryId, Category>,
    pub(crate) products: BTreeMap<ProductId, Product>,
    pub(crate) cart_items: BTreeMap<CartItemId, CartItem>,
    pub(crate) orders: BTreeMap<OrderId, Order>,
    pub(crate) order_items: BTreeMap<OrderItemId, OrderItem>,
    pub(crate) seq: Sequences,
}

impl State {
    pub(crate) fn user_with_username(&self, username: &str) -> Option<&User> {
        let needle = username.to_lowercase();
        self.users
            .values()
            .find(|u| u.username.to_lowercase() == needle)
    }

    pub(crate) fn user_with_email(&self, email: &str) -> Option<&User> {
        let needle = email.to_lowercase();
        self.users.values().find(|u| u.email.to_lowercase() == needle)
    }

    pub(crate) fn user_cart(&self, user_id: UserId) -> impl Iterator<Item = &CartItem> {
        self.cart_items
            .values()
            .filter(move |item| item.user_id == user_id)
    }

    /// The user's row for `product_id`, if any.
    pub(crate) fn cart_row_mut(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Option<&mut CartItem> {
        self.cart_items
            .values_mut()
            .find(|item| item.user_id == user_id && item.product_id == product_id)
    }

    /// The row `item_id` if it belongs to `user_id`.
    pub(crate) fn owned_cart_row_mut(
        &mut self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<&mut CartItem, StorageError> {
        self.cart_items
            .get_mut(&item_id)
            .filter(|item| item.user_id == user_id)
            .ok_or_else(|| StorageError::not_found("Cart item", item_id))
    }

    pub(crate) fn insert_cart_row(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> CartItem {
        let item = CartItem {
            id: self.seq.next_cart_item(),
            user_id,
            product_id,
            quantity,
        };
        self.cart_items.insert(item.id, item.clone());
        item
    }

    pub(crate) fn cart_lines(&self, user_id: UserId) -> Result<Vec<CartLine>, StorageError> {
        self.user_cart(user_id)
            .map(|item| {
                let product = self
                    .products
                    .get(&item.product_id)
                    .cloned()
                    .ok_or_else(|| {
                        StorageError::internal(format!(
                            "cart item {} references missing product {}",
                            item.id, item.product_id
                        ))
                    })?;
                Ok(CartLine::new(item.clone(), product))
            })
            .collect()
    }

    pub(crate) fn order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, StorageError> {
        self.order_items
            .values()
            .filter(|item| item.order_id == order_id)
            .map(|item| {
                let product = self
                    .products
                    .get(&item.product_id)
                    .cloned()
                    .ok_or_else(|| StorageError::internal(format!(
                        "order item {} references missing product {}",
                        item.id, item.product_id
                    )))?;
                Ok(OrderLine::new(item.clone(), product))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_start_at_one_and_are_independent() {
        let mut seq = Sequences::default();
        assert_eq!(seq.next_user(), 1);
        assert_eq!(seq.next_user(), 2);
        assert_eq!(seq.next_product(), 1);
        assert_eq!(seq.next_order(), 1);
    }

    #[test]
    fn owned_cart_row_rejects_other_users() {
        let mut state = State::default();
        let item = state.insert_cart_row(1, 10, 2);
        assert!(state.owned_cart_row_mut(1, item.id).is_ok());
        let err = state.owned_cart_row_mut(2, item.id).unwrap_err();
        assert!(err.is_not_found());
    }
}
