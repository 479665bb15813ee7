//! Stripe Checkout passthrough.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use afriprime_core::TelegramId;

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::CheckoutParams;

/// Product name shown on the Checkout page.
const PRODUCT_NAME: &str = "AfriPrime";

/// Request to start a checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Buyer's Telegram id, echoed back as `client_reference_id`.
    pub telegram_id: TelegramId,
    /// Amount in the currency's minor unit.
    pub amount_cents: i64,
    /// ISO currency code (default: usd).
    #[serde(default)]
    pub currency: Option<String>,
    /// Line item description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Checkout session handle for the client.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Stripe Checkout session ID.
    pub session_id: String,
    /// URL to redirect the user to.
    pub url: Option<String>,
}

/// Create a Stripe Checkout session.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::NotConfigured("stripe api key".into()))?;

    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.amount_cents <= 0 {
        return Err(ApiError::BadRequest("amount_cents must be positive".into()));
    }

    let currency = request
        .currency
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "usd".to_string());

    let frontend_url = state.config.frontend_url.trim_end_matches('/');
    let params = CheckoutParams {
        client_reference_id: request.telegram_id.to_string(),
        amount_minor: request.amount_cents,
        currency,
        product_name: PRODUCT_NAME.to_string(),
        description: request.description.filter(|d| !d.trim().is_empty()),
        success_url: format!("{frontend_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{frontend_url}/checkout/cancel"),
    };

    let session = stripe.create_checkout_session(&params).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to create Stripe checkout session");
        ApiError::from(e)
    })?;

    tracing::info!(
        telegram_id = %request.telegram_id,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}
