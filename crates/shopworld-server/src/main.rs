use std::env;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use shopworld_db_postgres::{PostgresStorage, migrations, pool};
use shopworld_server::config::{AppConfig, BootstrapConfig, StorageBackend, loader::load_config};
use shopworld_server::{ServerBuilder, bootstrap, observability};

#[derive(Debug, Parser)]
#[command(name = "shopworld-server", version, about = "ShopWorld storefront backend")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply PostgreSQL migrations and exit
    Migrate,
    /// Apply migrations, seed the catalog and bootstrap the admin, then exit
    InitDb,
}

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    CliArgument,
    EnvironmentVariable,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (SHOPWORLD_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Priority: `--config`, then `SHOPWORLD_CONFIG`, then `shopworld.toml`.
fn resolve_config_path(cli: Option<String>) -> (String, ConfigSource) {
    if let Some(path) = cli {
        return (path, ConfigSource::CliArgument);
    }
    if let Ok(path) = env::var("SHOPWORLD_CONFIG")
        && !path.is_empty()
    {
        return (path, ConfigSource::EnvironmentVariable);
    }
    ("shopworld.toml".to_string(), ConfigSource::Default)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    if let Err(e) = dotenvy::dotenv()
        && !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
    {
        eprintln!("Warning: Failed to load .env file: {e}");
    }

    observability::init_tracing();

    let cli = Cli::parse();
    let (config_path, source) = resolve_config_path(cli.config);

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    tracing::info!(path = %config_path, source = %source, "Configuration loaded");
    observability::apply_logging_level(&cfg.logging.level);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::Migrate => migrate(&cfg).await,
        Command::InitDb => init_db(cfg).await,
    }
}

async fn serve(cfg: AppConfig) -> anyhow::Result<()> {
    let server = ServerBuilder::new()
        .with_config(cfg)
        .build()
        .await
        .context("server initialization failed")?;
    server.run().await
}

fn require_postgres(cfg: &AppConfig, command: &str) -> anyhow::Result<()> {
    if cfg.storage.backend != StorageBackend::Postgres {
        bail!(
            "{command} requires storage.backend = \"postgres\" (got \"{}\")",
            cfg.storage.backend
        );
    }
    Ok(())
}

async fn migrate(cfg: &AppConfig) -> anyhow::Result<()> {
    require_postgres(cfg, "migrate")?;
    let pool = pool::create_pool(&cfg.storage.postgres.to_backend_config()).await?;
    migrations::run(&pool).await?;
    tracing::info!("Migrations applied");
    pool.close().await;
    Ok(())
}

async fn init_db(cfg: AppConfig) -> anyhow::Result<()> {
    require_postgres(&cfg, "init-db")?;
    let backend = cfg
        .storage
        .postgres
        .to_backend_config()
        .with_run_migrations(true);
    let storage = PostgresStorage::new(backend).await?;
    let steps = BootstrapConfig {
        seed_catalog: true,
        ..cfg.bootstrap.clone()
    };
    let stats = bootstrap::run(&storage, &steps).await?;
    tracing::info!(
        categories = stats.categories,
        products = stats.products,
        admin_created = stats.admin_created,
        "Database initialized"
    );
    storage.pool().close().await;
    Ok(())
}
