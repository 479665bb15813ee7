//! Common test utilities for afriprime integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use secrecy::SecretString;

use afriprime_core::{DevBypass, SecretMaterial};
use afriprime_service::{create_router, AppState, ServiceConfig, StripeClient};
use afriprime_store::MemoryStore;

/// Bot token the harness configures.
pub const BOT_TOKEN: &str = "123456:TEST-bot-token";

/// Stripe webhook signing secret the harness configures.
pub const STRIPE_WEBHOOK_SECRET: &str = "whsec_integration";

/// Paystack secret key the harness configures.
pub const PAYSTACK_SECRET: &str = "sk_test_integration";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a harness with every verifier secret configured.
    pub fn new() -> Self {
        Self::with_config(configured())
    }

    /// Create a harness with no secrets and the given bypass setting.
    pub fn unconfigured(bypass: DevBypass) -> Self {
        Self::with_config(ServiceConfig {
            dev_bypass: bypass,
            ..test_config()
        })
    }

    /// Create a harness whose checkout calls go to `stripe_base_url`.
    pub fn with_stripe(stripe_base_url: &str) -> Self {
        let client = StripeClient::new(SecretString::new("sk_test_checkout".into()))
            .expect("Failed to build Stripe client")
            .with_base_url(stripe_base_url);
        Self::build(configured(), Some(client))
    }

    /// Create a harness from an explicit configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: ServiceConfig, stripe: Option<StripeClient>) -> Self {
        let store = Arc::new(MemoryStore::new());

        let mut state = AppState::new(store.clone(), config);
        if let Some(client) = stripe {
            state = state.with_stripe_client(client);
        }
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Baseline configuration with no secrets.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        frontend_url: "http://localhost:3000".into(),
        ..ServiceConfig::default()
    }
}

/// Configuration with every verifier secret set.
pub fn configured() -> ServiceConfig {
    ServiceConfig {
        bot_token: Some(SecretMaterial::new(BOT_TOKEN)),
        stripe_webhook_secret: Some(SecretMaterial::new(STRIPE_WEBHOOK_SECRET)),
        paystack_secret_key: Some(SecretMaterial::new(PAYSTACK_SECRET)),
        ..test_config()
    }
}
