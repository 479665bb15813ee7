//! Service configuration.

use std::path::Path;
use std::time::Duration;

use afriprime_core::{DevBypass, SecretMaterial, DEFAULT_TOLERANCE};
use secrecy::SecretString;
use serde::Deserialize;

/// Environment variable that turns on the development bypass.
pub const DEV_BYPASS_ENV: &str = "AFRIPRIME_DEV_BYPASS";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:$PORT", `PORT` default 8080).
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/afriprime").
    pub data_dir: String,

    /// Telegram bot token used to verify Mini App `initData`.
    pub bot_token: Option<SecretMaterial>,

    /// Stripe secret API key (optional, enables checkout).
    pub stripe_api_key: Option<SecretString>,

    /// Stripe webhook signing secret.
    pub stripe_webhook_secret: Option<SecretMaterial>,

    /// Accepted Stripe signature age, either direction.
    pub stripe_tolerance: Duration,

    /// Paystack secret key, also the webhook signing key.
    pub paystack_secret_key: Option<SecretMaterial>,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Development bypass for verifiers whose secret is missing.
    pub dev_bypass: DevBypass,
}

/// Telegram secrets file structure.
#[derive(Debug, Deserialize)]
struct TelegramSecrets {
    bot_token: String,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    webhook_secret: Option<String>,
}

/// Paystack secrets file structure.
#[derive(Debug, Deserialize)]
struct PaystackSecrets {
    secret_key: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Secrets files take precedence over environment variables
        let bot_token = load_telegram_secrets();
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();
        let paystack_secret_key = load_paystack_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| {
                let port = std::env::var("PORT").unwrap_or_else(|_| "8080".into());
                format!("0.0.0.0:{port}")
            }),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            bot_token: secret_value(bot_token),
            stripe_api_key: stripe_api_key
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::new),
            stripe_webhook_secret: secret_value(stripe_webhook_secret),
            stripe_tolerance: env_parse("STRIPE_TOLERANCE_SECONDS")
                .map_or(defaults.stripe_tolerance, Duration::from_secs),
            paystack_secret_key: secret_value(paystack_secret_key),
            frontend_url: std::env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            cors_origins: std::env::var("CORS_ORIGINS")
                .or_else(|_| std::env::var("ORIGIN"))
                .map_or(defaults.cors_origins, |origins| parse_origins(&origins)),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            dev_bypass: DevBypass::from_flag(
                std::env::var(DEV_BYPASS_ENV).is_ok_and(|v| parse_flag(&v)),
            ),
        }
    }

    /// Names of verifier secrets that are not configured.
    ///
    /// Each missing secret leaves its verifier failing closed.
    #[must_use]
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bot_token.is_none() {
            missing.push("BOT_TOKEN");
        }
        if self.stripe_webhook_secret.is_none() {
            missing.push("STRIPE_WEBHOOK_SECRET");
        }
        if self.paystack_secret_key.is_none() {
            missing.push("PAYSTACK_SECRET_KEY");
        }
        missing
    }
}

/// Secrets come from hand-edited files and env vars, so surrounding
/// whitespace (a trailing newline, say) is dropped before wrapping.
fn secret_value(value: Option<String>) -> Option<SecretMaterial> {
    SecretMaterial::from_optional(value.map(|v| v.trim().to_string()))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Load the Telegram bot token from file or environment.
fn load_telegram_secrets() -> Option<String> {
    let secret_paths = [".secrets/telegram.json", "../.secrets/telegram.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<TelegramSecrets>(path) {
            tracing::info!(path = %path, "Loaded Telegram secrets from file");
            return Some(secrets.bot_token);
        }
    }

    tracing::debug!("Telegram secrets file not found, using environment variables");
    std::env::var("BOT_TOKEN").ok()
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (secrets.api_key, secrets.webhook_secret);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load the Paystack secret key from file or environment.
fn load_paystack_secrets() -> Option<String> {
    let secret_paths = [".secrets/paystack.json", "../.secrets/paystack.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<PaystackSecrets>(path) {
            tracing::info!(path = %path, "Loaded Paystack secrets from file");
            return Some(secrets.secret_key);
        }
    }

    tracing::debug!("Paystack secrets file not found, using environment variables");
    std::env::var("PAYSTACK_SECRET_KEY").ok()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/afriprime".into(),
            bot_token: None,
            stripe_api_key: None,
            stripe_webhook_secret: None,
            stripe_tolerance: DEFAULT_TOLERANCE,
            paystack_secret_key: None,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            dev_bypass: DevBypass::Disabled,
        }
    }
}
