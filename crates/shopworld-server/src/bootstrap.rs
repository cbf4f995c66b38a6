//! Startup data: the sample catalog and the optional admin account.
//!
//! Both steps are idempotent. The catalog is only inserted into an empty
//! category table, and an existing admin username is promoted rather than
//! recreated.

use std::collections::HashMap;

use shopworld_core::{CategoryId, CoreError, Money, NewCategory, NewProduct, NewUser};
use shopworld_storage::{ShopStorage, StorageError};
use thiserror::Error;
use tracing::info;

use crate::config::{AdminUserConfig, BootstrapConfig};
use crate::password::{PasswordError, hash_password};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("seed product {0} references unknown category {1}")]
    UnknownCategory(&'static str, &'static str),
}

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    icon: &'static str,
}

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: i64,
    compare_price: Option<i64>,
    photo: &'static str,
    category: &'static str,
    stock: i32,
    rating: f64,
    num_reviews: i32,
    is_featured: bool,
    is_new: bool,
}

const SEED_CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "Electronics",
        slug: "electronics",
        icon: "laptop",
    },
    SeedCategory {
        name: "Fashion",
        slug: "fashion",
        icon: "tshirt",
    },
    SeedCategory {
        name: "Home & Kitchen",
        slug: "home-kitchen",
        icon: "home",
    },
    SeedCategory {
        name: "Health",
        slug: "health",
        icon: "heartbeat",
    },
    SeedCategory {
        name: "Sports",
        slug: "sports",
        icon: "futbol",
    },
    SeedCategory {
        name: "Gifts",
        slug: "gifts",
        icon: "gift",
    },
];

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Smartphone X Pro",
        slug: "smartphone-x-pro",
        description: "Latest smartphone with 108MP camera and all-day battery life",
        price: 799,
        compare_price: Some(999),
        photo: "1598327105666-5b89351aff97",
        category: "electronics",
        stock: 100,
        rating: 4.5,
        num_reviews: 128,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Wireless Earbuds Pro",
        slug: "wireless-earbuds-pro",
        description: "True wireless earbuds with noise cancellation and crystal clear audio",
        price: 129,
        compare_price: Some(149),
        photo: "1606220588913-b3aacb4d2f46",
        category: "electronics",
        stock: 200,
        rating: 4.0,
        num_reviews: 86,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Smart Watch Series 5",
        slug: "smart-watch-series-5",
        description: "Fitness tracking, heart rate monitoring and smartphone notifications",
        price: 249,
        compare_price: Some(349),
        photo: "1579586337278-3befd40fd17a",
        category: "electronics",
        stock: 150,
        rating: 5.0,
        num_reviews: 214,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Ultrabook Pro 15",
        slug: "ultrabook-pro-15",
        description: "Ultra-thin laptop with 4K display and all-day battery life",
        price: 1349,
        compare_price: Some(1499),
        photo: "1611186871348-b1ce696e52c9",
        category: "electronics",
        stock: 75,
        rating: 4.5,
        num_reviews: 92,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Digital Camera 4K",
        slug: "digital-camera-4k",
        description: "Professional-grade camera with 4K video recording and 20MP photo capability",
        price: 599,
        compare_price: Some(799),
        photo: "1581591524425-c7e0978865fc",
        category: "electronics",
        stock: 50,
        rating: 4.0,
        num_reviews: 67,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Premium Headphones",
        slug: "premium-headphones",
        description: "Wireless over-ear headphones with noise cancellation technology",
        price: 299,
        compare_price: None,
        photo: "1546435770-a3e426bf472b",
        category: "electronics",
        stock: 120,
        rating: 4.5,
        num_reviews: 42,
        is_featured: false,
        is_new: true,
    },
    SeedProduct {
        name: "Modern Coffee Table",
        slug: "modern-coffee-table",
        description: "Stylish and minimalist coffee table for your living room",
        price: 299,
        compare_price: Some(399),
        photo: "1532372320572-cda25653a694",
        category: "home-kitchen",
        stock: 30,
        rating: 4.3,
        num_reviews: 58,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Kitchen Mixer Pro",
        slug: "kitchen-mixer-pro",
        description: "Professional stand mixer for all your baking needs",
        price: 249,
        compare_price: Some(349),
        photo: "1594135356513-14291e34b848",
        category: "home-kitchen",
        stock: 45,
        rating: 4.8,
        num_reviews: 112,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Cozy Throw Blanket",
        slug: "cozy-throw-blanket",
        description: "Soft and comfortable throw blanket for your home",
        price: 49,
        compare_price: Some(69),
        photo: "1580301762395-83604beb6b18",
        category: "home-kitchen",
        stock: 100,
        rating: 4.6,
        num_reviews: 74,
        is_featured: false,
        is_new: true,
    },
    SeedProduct {
        name: "Designer Sunglasses",
        slug: "designer-sunglasses",
        description: "UV protection stylish sunglasses for men and women",
        price: 129,
        compare_price: Some(179),
        photo: "1577803645773-f96470509666",
        category: "fashion",
        stock: 80,
        rating: 4.2,
        num_reviews: 48,
        is_featured: true,
        is_new: false,
    },
    SeedProduct {
        name: "Casual Sneakers",
        slug: "casual-sneakers",
        description: "Comfortable casual sneakers for everyday wear",
        price: 89,
        compare_price: Some(119),
        photo: "1595950653106-6c9ebd614d3a",
        category: "fashion",
        stock: 120,
        rating: 4.4,
        num_reviews: 157,
        is_featured: true,
        is_new: true,
    },
];

fn image_url(photo: &str) -> String {
    format!(
        "https://images.unsplash.com/photo-{photo}?ixlib=rb-4.0.3&auto=format&fit=crop&w=500&h=500"
    )
}

impl SeedProduct {
    fn to_new_product(&self, category_id: CategoryId) -> Result<NewProduct, CoreError> {
        let compare_price = self.compare_price.map(Money::from_units).transpose()?;
        Ok(NewProduct {
            name: self.name.into(),
            slug: Some(self.slug.into()),
            description: self.description.into(),
            price: Money::from_units(self.price)?,
            compare_price,
            image: image_url(self.photo),
            images: Vec::new(),
            category_id: Some(category_id),
            stock: self.stock,
            rating: Some(self.rating),
            num_reviews: self.num_reviews,
            is_featured: self.is_featured,
            is_new: self.is_new,
        })
    }
}

/// Statistics about the bootstrap operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BootstrapStats {
    pub categories: usize,
    pub products: usize,
    pub admin_created: bool,
}

/// Inserts the sample catalog unless categories already exist.
pub async fn seed_catalog(storage: &dyn ShopStorage) -> Result<BootstrapStats, BootstrapError> {
    let mut stats = BootstrapStats::default();
    if storage.count_categories().await? > 0 {
        info!("Catalog already present, skipping seed");
        return Ok(stats);
    }

    let mut ids: HashMap<&'static str, CategoryId> = HashMap::new();
    for seed in SEED_CATEGORIES {
        let category = storage
            .create_category(&NewCategory {
                name: seed.name.into(),
                slug: Some(seed.slug.into()),
                image: None,
                icon: Some(seed.icon.into()),
            })
            .await?;
        ids.insert(seed.slug, category.id);
        stats.categories += 1;
    }

    for seed in SEED_PRODUCTS {
        let category_id = *ids
            .get(seed.category)
            .ok_or(BootstrapError::UnknownCategory(seed.slug, seed.category))?;
        storage
            .create_product(&seed.to_new_product(category_id)?)
            .await?;
        stats.products += 1;
    }

    info!(
        categories = stats.categories,
        products = stats.products,
        "Sample catalog seeded"
    );
    Ok(stats)
}

/// Creates the configured admin, or grants admin to an existing account
/// with that username. Returns whether a new account was created.
pub async fn ensure_admin(
    storage: &dyn ShopStorage,
    admin: &AdminUserConfig,
) -> Result<bool, BootstrapError> {
    if let Some(existing) = storage.get_user_by_username(&admin.username).await? {
        if !existing.is_admin {
            storage.set_admin(existing.id, true).await?;
            info!(username = %existing.username, "Existing user promoted to admin");
        }
        return Ok(false);
    }

    let mut new_user = NewUser {
        username: admin.username.clone(),
        password: admin.password.clone(),
        email: admin
            .email
            .clone()
            .unwrap_or_else(|| format!("{}@shopworld.local", admin.username)),
        first_name: None,
        last_name: None,
        address: None,
        city: None,
        state: None,
        zip_code: None,
        country: None,
        phone: None,
    };
    new_user.validate()?;
    new_user.password = hash_password(new_user.password).await?;

    let user = storage.create_user(&new_user).await?;
    storage.set_admin(user.id, true).await?;
    info!(username = %user.username, "Admin user created");
    Ok(true)
}

/// Runs every configured bootstrap step.
pub async fn run(
    storage: &dyn ShopStorage,
    config: &BootstrapConfig,
) -> Result<BootstrapStats, BootstrapError> {
    let mut stats = if config.seed_catalog {
        seed_catalog(storage).await?
    } else {
        BootstrapStats::default()
    };
    if let Some(admin) = &config.admin_user {
        stats.admin_created = ensure_admin(storage, admin).await?;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopworld_db_memory::InMemoryStorage;

    #[tokio::test]
    async fn seeds_once() {
        let storage = InMemoryStorage::new();
        let stats = seed_catalog(&storage).await.unwrap();
        assert_eq!(stats.categories, 6);
        assert_eq!(stats.products, SEED_PRODUCTS.len());

        let again = seed_catalog(&storage).await.unwrap();
        assert_eq!(again, BootstrapStats::default());
        assert_eq!(storage.list_categories().await.unwrap().len(), 6);

        let phone = storage
            .get_product_by_slug("smartphone-x-pro")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(phone.price.to_string(), "799.00");
        assert_eq!(phone.compare_price.unwrap().to_string(), "999.00");
    }

    #[tokio::test]
    async fn admin_is_created_then_left_alone() {
        let storage = InMemoryStorage::new();
        let admin = AdminUserConfig {
            username: "admin".into(),
            password: "change-me".into(),
            email: None,
        };
        assert!(ensure_admin(&storage, &admin).await.unwrap());
        assert!(!ensure_admin(&storage, &admin).await.unwrap());

        let user = storage.get_user_by_username("admin").await.unwrap().unwrap();
        assert!(user.is_admin);
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_eq!(user.email, "admin@shopworld.local");
    }
}
