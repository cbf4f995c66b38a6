pub mod cart;
pub mod error;
pub mod id;
pub mod input;
pub mod model;
pub mod money;
pub mod order;

pub use cart::merge_quantities;
pub use error::{CoreError, Result};
pub use id::{CartItemId, CategoryId, OrderId, OrderItemId, ProductId, UserId, slugify};
pub use input::{
    NewCartItem, NewCategory, NewOrder, NewProduct, NewUser, OrderItemRequest, ShippingDetails,
    UserUpdate,
};
pub use model::{
    CartItem, CartLine, Category, Order, OrderDetail, OrderItem, OrderLine, OrderStatus, Product,
    PublicUser, User,
};
pub use money::Money;
pub use order::{PricedLine, order_total};
