use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
};
use shopworld_storage::DynStorage;
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::{
    bootstrap,
    config::{AppConfig, StorageBackend},
    handlers,
    middleware::{self as app_middleware, RequestId},
    session::SessionStore,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(storage: DynStorage, config: AppConfig) -> Self {
        Self {
            storage,
            sessions: Arc::new(SessionStore::new(config.session.clone())),
            config: Arc::new(config),
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/users/profile", put(handlers::users::update_profile))
        // Catalog
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route("/categories/{slug}", get(handlers::catalog::get_category))
        .route(
            "/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route("/products/{slug}", get(handlers::catalog::get_product))
        // Cart
        .route(
            "/cart",
            get(handlers::cart::get_cart)
                .post(handlers::cart::add_item)
                .delete(handlers::cart::clear_cart),
        )
        .route("/cart/merge", post(handlers::cart::merge_cart))
        .route(
            "/cart/{id}",
            put(handlers::cart::update_item).delete(handlers::cart::remove_item),
        )
        // Orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/{id}", get(handlers::orders::get_order))
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let request_timeout = state.config.request_timeout();
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::health::root))
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .nest("/api", api_routes())
        .fallback(handlers::health::not_found)
        .with_state(state)
        // Middleware stack (order: request id -> compression/cors/trace -> timeout -> body limit)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.0.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

/// Opens the configured storage backend.
pub async fn open_storage(cfg: &AppConfig) -> anyhow::Result<DynStorage> {
    let storage = match cfg.storage.backend {
        StorageBackend::Memory => shopworld_db_memory::create_storage(),
        StorageBackend::Postgres => {
            shopworld_db_postgres::create_storage(cfg.storage.postgres.to_backend_config()).await?
        }
    };
    tracing::info!(backend = storage.backend_name(), "Storage ready");
    Ok(storage)
}

pub struct ShopworldServer {
    addr: SocketAddr,
    state: AppState,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    storage: Option<DynStorage>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            storage: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use an already opened backend instead of the configured one.
    pub fn with_storage(mut self, storage: DynStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Validates the config, opens storage (unless one was supplied) and runs
    /// the bootstrap steps.
    pub async fn build(self) -> anyhow::Result<ShopworldServer> {
        self.config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
        let storage = match self.storage {
            Some(storage) => storage,
            None => open_storage(&self.config).await?,
        };
        bootstrap::run(storage.as_ref(), &self.config.bootstrap).await?;

        Ok(ShopworldServer {
            addr: self.addr,
            state: AppState::new(storage, self.config),
        })
    }
}

impl ShopworldServer {
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let pruner: JoinHandle<()> = self.state.sessions.clone().spawn_pruner();
        let app = build_app(self.state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        pruner.abort();
        result?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
