//! Request payloads and their validation rules.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::{CategoryId, ProductId, slugify};
use crate::money::Money;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 64;
const PASSWORD_MIN: usize = 6;

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(CoreError::invalid_field(
            "username",
            format!("must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(CoreError::invalid_field(
            "username",
            "may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CoreError::invalid_field("email", "is not a valid email address"))
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(CoreError::invalid_field(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid_field(field, "is required"));
    }
    Ok(())
}

/// Registration payload.
///
/// `password` holds the plaintext on the way in; the server replaces it with
/// the Argon2 hash before handing the value to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        Ok(())
    }
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        if self.resolved_slug().is_empty() {
            return Err(CoreError::invalid_field("slug", "is required"));
        }
        Ok(())
    }

    /// The explicit slug, or one derived from the name.
    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => slugify(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub compare_price: Option<Money>,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub num_reviews: i32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new: bool,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        require("image", &self.image)?;
        if self.resolved_slug().is_empty() {
            return Err(CoreError::invalid_field("slug", "is required"));
        }
        if self.stock < 0 {
            return Err(CoreError::invalid_field("stock", "must not be negative"));
        }
        if self.num_reviews < 0 {
            return Err(CoreError::invalid_field("numReviews", "must not be negative"));
        }
        if let Some(rating) = self.rating
            && !(0.0..=5.0).contains(&rating)
        {
            return Err(CoreError::invalid_field("rating", "must be between 0 and 5"));
        }
        Ok(())
    }

    pub fn resolved_slug(&self) -> String {
        match &self.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => slugify(&self.name),
        }
    }
}

fn default_quantity() -> i32 {
    1
}

/// Body of `POST /api/cart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl NewCartItem {
    pub fn validate(&self) -> Result<()> {
        if self.quantity < 1 {
            return Err(CoreError::invalid_field("quantity", "must be at least 1"));
        }
        Ok(())
    }
}

/// One explicitly requested order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl OrderItemRequest {
    pub fn validate(&self) -> Result<()> {
        if self.quantity < 1 {
            return Err(CoreError::invalid_field("quantity", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_zip_code: String,
    pub shipping_country: String,
    pub payment_method: String,
}

impl ShippingDetails {
    pub fn validate(&self) -> Result<()> {
        require("shippingAddress", &self.shipping_address)?;
        require("shippingCity", &self.shipping_city)?;
        require("shippingState", &self.shipping_state)?;
        require("shippingZipCode", &self.shipping_zip_code)?;
        require("shippingCountry", &self.shipping_country)?;
        require("paymentMethod", &self.payment_method)?;
        Ok(())
    }
}

/// Body of `POST /api/orders`.
///
/// With `order_items` absent the order is built from the caller's cart.
/// Any client-supplied total is ignored; the server prices every line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub order_items: Option<Vec<OrderItemRequest>>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<()> {
        self.shipping.validate()?;
        if let Some(items) = &self.order_items {
            if items.is_empty() {
                return Err(CoreError::invalid_field("orderItems", "Order items are required"));
            }
            for item in items {
                item.validate()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_user() -> NewUser {
        NewUser {
            username: "alice".into(),
            password: "hunter22".into(),
            email: "alice@example.com".into(),
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

    #[test]
    fn new_user_accepts_valid_input() {
        assert!(new_user().validate().is_ok());
    }

    #[test]
    fn new_user_rejects_bad_fields() {
        let mut user = new_user();
        user.email = "not-an-email".into();
        assert!(user.validate().is_err());

        let mut user = new_user();
        user.email = "a@localhost".into();
        assert!(user.validate().is_err());

        let mut user = new_user();
        user.username = "a b".into();
        assert!(user.validate().is_err());

        let mut user = new_user();
        user.password = "123".into();
        let err = user.validate().unwrap_err();
        assert!(err.to_string().starts_with("password"));
    }

    #[test]
    fn user_update_only_checks_present_fields() {
        let update = UserUpdate {
            city: Some("Springfield".into()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        assert!(!update.is_empty());
        assert!(UserUpdate::default().is_empty());

        let update = UserUpdate {
            email: Some("broken".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn cart_item_quantity_defaults_to_one() {
        let item: NewCartItem = serde_json::from_value(json!({ "productId": 4 })).unwrap();
        assert_eq!(item.quantity, 1);
        let item: NewCartItem =
            serde_json::from_value(json!({ "productId": 4, "quantity": 0 })).unwrap();
        assert!(item.validate().is_err());
    }

    #[test]
    fn new_order_reads_flat_shipping_fields() {
        let order: NewOrder = serde_json::from_value(json!({
            "shippingAddress": "1 Main St",
            "shippingCity": "Springfield",
            "shippingState": "IL",
            "shippingZipCode": "62701",
            "shippingCountry": "US",
            "paymentMethod": "card",
            "total": "1.00",
            "orderItems": [{ "productId": 1, "quantity": 2 }]
        }))
        .unwrap();
        assert!(order.validate().is_ok());
        assert_eq!(order.shipping.shipping_city, "Springfield");
        assert_eq!(order.order_items.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn new_order_rejects_empty_item_list_and_blank_shipping() {
        let mut order = NewOrder {
            shipping: ShippingDetails {
                shipping_address: "1 Main St".into(),
                shipping_city: "Springfield".into(),
                shipping_state: "IL".into(),
                shipping_zip_code: "62701".into(),
                shipping_country: "US".into(),
                payment_method: "card".into(),
            },
            order_items: Some(vec![]),
        };
        assert!(order.validate().is_err());
        order.order_items = None;
        order.shipping.shipping_city = "  ".into();
        assert!(order.validate().is_err());
    }

    #[test]
    fn category_slug_falls_back_to_name() {
        let category = NewCategory {
            name: "Home & Kitchen".into(),
            slug: None,
            image: None,
            icon: Some("home".into()),
        };
        assert_eq!(category.resolved_slug(), "home-kitchen");
        assert!(category.validate().is_ok());
    }

    #[test]
    fn product_rating_must_be_in_range() {
        let mut product: NewProduct = serde_json::from_value(json!({
            "name": "Casual Sneakers",
            "description": "Comfortable casual sneakers",
            "price": "89",
            "image": "https://img/sneakers.jpg",
            "rating": 4.4
        }))
        .unwrap();
        assert_eq!(product.resolved_slug(), "casual-sneakers");
        product.rating = Some(7.0);
        assert!(product.validate().is_err());
        product.rating = Some(4.4);
        assert!(product.validate().is_ok());
    }
}
