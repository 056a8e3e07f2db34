use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info, warn};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use storefront_lib::session::token::encode_unsigned;
use storefront_lib::{AppContext, AuthStateChanged, Config, Element, SharedStorage};

/// Open the shared storage named in the config, or an in-memory one
async fn open_storage(config: &Config) -> Result<Arc<SharedStorage>> {
    match &config.session.storage_path {
        Some(path) => SharedStorage::open(path)
            .await
            .with_context(|| format!("Failed to open storage at {}", path.display())),
        None => {
            debug!("No storage path configured, session lives in memory only");
            Ok(SharedStorage::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let env_file_path = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "storefront_lib=debug,storefront=debug,warn".into()
            } else {
                "storefront_lib=info,storefront=info,warn".into()
            }
        }))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("Storefront session demo starting");

    match env_file_path {
        Some(path) => info!("Loaded environment variables from {}", path.display()),
        None => debug!("No .env file found. Using existing environment variables."),
    };
    debug!("Example: RUST_LOG=storefront_lib::sync=trace,storefront_lib::api=debug");

    let config_path =
        std::env::var("STOREFRONT_CONFIG").unwrap_or_else(|_| "storefront.json".to_string());
    let config = Config::load(&config_path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    let storage = open_storage(&config).await?;

    // Two pages of the same origin
    let shop = AppContext::new(config.clone(), &storage)?;
    let account = AppContext::new(config.clone(), &storage)?;

    let admin_link = shop.document.mount(Element::new("admin-link"));
    shop.document.mount(Element::new("admin-nav"));

    let mut shop_events = shop.event_bus.subscribe();
    let watcher = tokio::spawn(async move {
        while let Some(event) = shop_events.recv().await {
            if let Some(state) = AuthStateChanged::from_event(&event) {
                info!(is_authenticated = state.is_authenticated, "Shop page saw auth change");
            }
        }
    });

    shop.initialize().await;
    account.initialize().await;

    let token = encode_unsigned(&json!({
        "sub": "demo-admin",
        "email": "admin@storefront.local",
        "name": "Demo Admin",
        "role": "admin",
    }));
    account.auth.login(&token).await?;

    let settle = config.sync.settle_delay().max(config.sync.bootstrap_delay());
    tokio::time::sleep(settle + Duration::from_millis(50)).await;
    info!(hidden = admin_link.is_hidden(), "Admin link after login in the other page");

    match shop.users.me().await {
        Ok(user) => info!(user = %user.id, role = %user.role, "Backend profile"),
        Err(e) => warn!(error = %e, "Backend unavailable, skipping profile fetch"),
    }

    account.auth.logout().await;
    tokio::time::sleep(config.sync.settle_delay() + Duration::from_millis(50)).await;
    info!(hidden = admin_link.is_hidden(), "Admin link after logout in the other page");

    let stats = shop.event_bus.get_stats().await;
    info!(
        published = stats.events_published,
        dropped = stats.events_dropped,
        "Shop page event bus"
    );

    account.shutdown().await?;
    shop.shutdown().await?;
    watcher.abort();
    Ok(())
}
