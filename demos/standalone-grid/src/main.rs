//! A single-process grid: in-memory identities, friends, inventory, and two
//! regions, served over WebSocket.
//!
//! Environment:
//!
//! - `GRIDGATE_BIND` (default `127.0.0.1:8080`)
//! - `GRIDGATE_WELCOME` (default "Welcome to gridgate")
//! - `GRIDGATE_SERIALIZATION`: `global` (default) or `per-identity`
//! - `RUST_LOG` (default `info`)
//!
//! Seeded logins: `Jane Doe` / `secret` and `John Roe` / `hunter2`.

use std::sync::Arc;

use gridgate::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

struct DemoConfig {
    bind: String,
    login: LoginConfig,
}

fn parse_serialization(raw: &str) -> Result<LoginSerialization, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "global" => Ok(LoginSerialization::Global),
        "per-identity" | "per_identity" => Ok(LoginSerialization::PerIdentity),
        other => Err(format!(
            "GRIDGATE_SERIALIZATION must be `global` or `per-identity`, got `{other}`"
        )),
    }
}

fn config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<DemoConfig, String> {
    let mut login = LoginConfig::default();
    if let Some(welcome) = lookup("GRIDGATE_WELCOME") {
        login = login.welcome_message(welcome);
    }
    if let Some(raw) = lookup("GRIDGATE_SERIALIZATION") {
        login = login.serialization(parse_serialization(&raw)?);
    }
    Ok(DemoConfig {
        bind: lookup("GRIDGATE_BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        login,
    })
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn region(name: &str, grid_x: u32, grid_y: u32, port: u16) -> RegionInfo {
    RegionInfo {
        name: name.into(),
        grid_x,
        grid_y,
        sim_ip: "127.0.0.1".into(),
        sim_port: port,
        caps_url: format!("http://127.0.0.1:{port}"),
    }
}

fn seed() -> (Arc<MemoryIdentityStore>, GrantBuilder) {
    let store = Arc::new(MemoryIdentityStore::new());
    let jane = Identity::new("Jane", "Doe", "secret");
    let john = Identity::new("John", "Roe", "hunter2");

    let friends = Arc::new(MemoryFriends::new());
    friends.befriend(jane.id, john.id, 1, 1);

    store.insert(jane);
    store.insert(john);

    let regions = RegionDirectory::new()
        .with_region(region("Ahern", 1000, 1000, 9000))
        .with_region(region("Bonifacio", 1001, 1000, 9001));

    let grants = GrantBuilder::new(Arc::new(MemoryInventory::new()), friends)
        .customizer(Arc::new(regions));

    (store, grants)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = config_from(|key| std::env::var(key).ok())?;
    let (store, grants) = seed();
    tracing::info!(
        identities = store.len(),
        serialization = ?config.login.serialization,
        "seeded standalone grid"
    );

    let server = GridgateServer::builder()
        .bind(&config.bind)
        .login_config(config.login)
        .build(store, CredentialAuthenticator, grants)
        .await?;

    server.run().await?;
    Ok(())
}
