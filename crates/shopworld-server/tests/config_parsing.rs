use std::{env, fs};

use shopworld_server::config::loader::load_config;
use shopworld_server::config::{SameSite, StorageBackend};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("shopworld.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
request_timeout_ms = 1000
body_limit_bytes = 2048

[storage]
backend = "postgres"

[storage.postgres]
host = "db"
port = 5433
user = "shop"
password = "shop"
database = "storefront"
pool_size = 4

[session]
same_site = "strict"
secure = true
max_age_secs = 3600

[catalog]
default_limit = 5
max_limit = 20

[logging]
level = "debug"

[bootstrap]
seed_catalog = false

[bootstrap.admin_user]
username = "root"
password = "root-pass"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 2048);
    assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
    assert_eq!(
        cfg.storage.postgres.connection_url(),
        "postgres://shop:shop@db:5433/storefront"
    );
    assert_eq!(cfg.session.same_site, SameSite::Strict);
    assert_eq!(cfg.session.cookie_name, "shopworld.sid");
    assert_eq!(cfg.catalog.default_limit, 5);
    assert!(!cfg.bootstrap.seed_catalog);
    assert_eq!(cfg.bootstrap.admin_user.as_ref().unwrap().username, "root");

    // 2) Env override should win over file
    unsafe {
        env::set_var("SHOPWORLD__CATALOG__DEFAULT_LIMIT", "9");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.catalog.default_limit, 9);
    unsafe {
        env::remove_var("SHOPWORLD__CATALOG__DEFAULT_LIMIT");
    }

    // 3) Invalid config (default > max) should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[catalog]
default_limit = 50
max_limit = 10
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("default_limit must be <="));

    // 4) Unknown backend is a deserialize error
    let bad_backend = dir.path().join("bad_backend.toml");
    fs::write(&bad_backend, "[storage]\nbackend = \"sqlite\"\n").expect("write toml");
    let err = load_config(bad_backend.to_str()).expect_err("expected deserialize error");
    assert!(err.contains("deserialize"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");
    let cfg = load_config(path.to_str()).expect("defaults should load");
    assert_eq!(cfg.storage.backend, StorageBackend::Memory);
    assert_eq!(cfg.server.port, 5000);
    assert!(cfg.bootstrap.seed_catalog);
}

#[test]
fn rendered_defaults_load_back() {
    let defaults = shopworld_server::AppConfig::default();
    let rendered = toml::to_string(&defaults).expect("serialize defaults");

    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("rendered.toml");
    fs::write(&path, rendered).expect("write toml");

    let cfg = load_config(path.to_str()).expect("rendered defaults should load");
    assert_eq!(cfg.server.port, defaults.server.port);
    assert_eq!(cfg.session.cookie_name, defaults.session.cookie_name);
    assert_eq!(cfg.session.same_site, SameSite::Lax);
    assert_eq!(cfg.catalog.max_limit, defaults.catalog.max_limit);
    assert_eq!(cfg.storage.postgres.database, "shopworld");
}
