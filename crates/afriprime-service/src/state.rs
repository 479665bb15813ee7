//! Application state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use afriprime_core::{
    InitDataVerifier, PaystackVerifier, Provider, StripeVerifier, WebhookVerifier,
};
use afriprime_store::Store;

use crate::config::ServiceConfig;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Telegram `initData` verifier.
    pub init_data: Arc<InitDataVerifier>,

    /// Stripe webhook verifier.
    pub stripe_webhooks: Arc<dyn WebhookVerifier>,

    /// Paystack webhook verifier.
    pub paystack_webhooks: Arc<dyn WebhookVerifier>,

    /// Stripe client for checkout (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Per-event locks for webhook processing.
    pub event_locks: Arc<EventLocks>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let bypass = config.dev_bypass;

        let init_data = InitDataVerifier::new(config.bot_token.clone(), bypass);
        let stripe_webhooks = StripeVerifier::new(config.stripe_webhook_secret.clone(), bypass)
            .with_tolerance(config.stripe_tolerance);
        let paystack_webhooks = PaystackVerifier::new(config.paystack_secret_key.clone(), bypass);

        // Create Stripe client if configured
        let stripe = config
            .stripe_api_key
            .clone()
            .and_then(|key| match StripeClient::new(key) {
                Ok(client) => {
                    tracing::info!("Stripe checkout enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - checkout will not be available");
        }

        Self {
            store,
            config,
            init_data: Arc::new(init_data),
            stripe_webhooks: Arc::new(stripe_webhooks),
            paystack_webhooks: Arc::new(paystack_webhooks),
            stripe,
            event_locks: Arc::new(EventLocks::default()),
        }
    }

    /// Replace the Stripe client (tests point it at a mock server).
    #[must_use]
    pub fn with_stripe_client(mut self, client: StripeClient) -> Self {
        self.stripe = Some(Arc::new(client));
        self
    }

    /// The webhook verifier for `provider`.
    #[must_use]
    pub fn webhook_verifier(&self, provider: Provider) -> &dyn WebhookVerifier {
        match provider {
            Provider::Stripe => self.stripe_webhooks.as_ref(),
            Provider::Paystack => self.paystack_webhooks.as_ref(),
        }
    }
}

/// Keyed async locks serializing work on the same webhook event.
///
/// Distinct keys never contend. Entries are weak and are pruned once no task
/// holds or waits on them.
#[derive(Default)]
pub struct EventLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl EventLocks {
    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| lock.strong_count() > 0);

            if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
                lock
            } else {
                let lock = Arc::new(AsyncMutex::new(()));
                locks.insert(key, Arc::downgrade(&lock));
                lock
            }
        };

        lock.lock_owned().await
    }

    /// Number of keys currently held or awaited.
    #[cfg(test)]
    fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}
