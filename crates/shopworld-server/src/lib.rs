pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod password;
pub mod server;
pub mod session;

pub use config::{AppConfig, PostgresStorageConfig, ServerConfig, SessionConfig, StorageBackend};
pub use observability::init_tracing;
pub use server::{AppState, ServerBuilder, ShopworldServer, build_app, open_storage};
pub use session::SessionStore;
