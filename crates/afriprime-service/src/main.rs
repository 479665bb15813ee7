//! AfriPrime Service - HTTP API for the AfriPrime Telegram Mini App
//!
//! This is the main entry point for the afriprime service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use afriprime_service::{create_router, AppState, ServiceConfig};
use afriprime_store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,afriprime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AfriPrime Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        telegram_configured = %config.bot_token.is_some(),
        stripe_configured = %config.stripe_api_key.is_some(),
        stripe_webhooks_configured = %config.stripe_webhook_secret.is_some(),
        paystack_configured = %config.paystack_secret_key.is_some(),
        stripe_tolerance_secs = config.stripe_tolerance.as_secs(),
        "Service configuration loaded"
    );

    let missing = config.missing_secrets();
    if !missing.is_empty() {
        if config.dev_bypass.is_enabled() {
            tracing::warn!(
                missing = ?missing,
                "Secrets missing; development bypass accepts unsigned payloads. Never use in production"
            );
        } else {
            tracing::error!(missing = ?missing, "Required secrets are not configured");
            return Err(format!("missing required secrets: {}", missing.join(", ")).into());
        }
    }

    let store = open_store(&config)?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(afriprime_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(_config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!("Built without rocksdb-backend - using in-memory store, data will not persist");
    Ok(Arc::new(afriprime_store::MemoryStore::new()))
}
