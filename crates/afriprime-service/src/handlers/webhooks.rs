//! Webhook handlers for Stripe and Paystack.
//!
//! The body is taken as raw bytes and handed to the provider's verifier
//! untouched. Nothing is parsed until the signature has been checked.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use afriprime_core::{
    Assurance, PaystackEventKind, ProcessedEvent, Provider, StripeEventKind, VerifiedEvent,
    WebhookEnvelope,
};
use afriprime_store::StoreError;

use crate::error::ApiError;
use crate::state::AppState;

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
    /// Whether the event had already been processed.
    pub duplicate: bool,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    receive(&state, Provider::Stripe, &headers, &body).await
}

/// Handle Paystack webhooks.
pub async fn paystack_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    receive(&state, Provider::Paystack, &headers, &body).await
}

async fn receive(
    state: &AppState,
    provider: Provider,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<WebhookResponse>, ApiError> {
    let verifier = state.webhook_verifier(provider);

    // Non-UTF-8 header bytes are decoded lossily and left to the verifier.
    let signature = headers
        .get(verifier.signature_header())
        .map(|value| String::from_utf8_lossy(value.as_bytes()));

    let event = verifier
        .verify(&WebhookEnvelope::new(body, signature.as_deref()))
        .map_err(|e| {
            tracing::warn!(
                provider = %provider,
                code = e.code(),
                error = %e,
                "Rejected webhook"
            );
            ApiError::from(e)
        })?;

    if event.assurance == Assurance::DevelopmentBypass {
        tracing::warn!(
            provider = %provider,
            "Accepted unsigned webhook (development bypass)"
        );
    }

    tracing::info!(
        provider = %provider,
        event_type = %event.event_type,
        event_id = ?event.event_id,
        "Received webhook"
    );

    let Some(marker) = ProcessedEvent::for_event(&event) else {
        tracing::warn!(provider = %provider, "Webhook carries no event id; idempotency skipped");
        dispatch(&event);
        return Ok(Json(WebhookResponse {
            received: true,
            duplicate: false,
        }));
    };

    let _guard = state
        .event_locks
        .acquire(format!("{provider}:{}", marker.event_id))
        .await;

    if state.store.has_processed_event(provider, &marker.event_id)? {
        tracing::info!(
            provider = %provider,
            event_id = %marker.event_id,
            "Webhook already processed"
        );
        return Ok(Json(WebhookResponse {
            received: true,
            duplicate: true,
        }));
    }

    dispatch(&event);

    match state.store.record_processed_event(&marker) {
        Ok(()) => Ok(Json(WebhookResponse {
            received: true,
            duplicate: false,
        })),
        Err(StoreError::DuplicateEvent { .. }) => Ok(Json(WebhookResponse {
            received: true,
            duplicate: true,
        })),
        Err(e) => Err(e.into()),
    }
}

/// Route a verified event to its provider's handling.
fn dispatch(event: &VerifiedEvent) {
    match event.provider {
        Provider::Stripe => handle_stripe_event(event),
        Provider::Paystack => handle_paystack_event(event),
    }
}

fn handle_stripe_event(event: &VerifiedEvent) {
    let object = &event.payload["data"]["object"];

    match StripeEventKind::classify(&event.event_type) {
        StripeEventKind::CheckoutCompleted => {
            tracing::info!(
                session_id = ?object.get("id").and_then(serde_json::Value::as_str),
                telegram_id = ?object
                    .get("client_reference_id")
                    .and_then(serde_json::Value::as_str),
                payment_status = ?object.get("payment_status").and_then(serde_json::Value::as_str),
                "Stripe checkout completed"
            );
        }
        StripeEventKind::CheckoutExpired => {
            tracing::info!(
                session_id = ?object.get("id").and_then(serde_json::Value::as_str),
                "Stripe checkout expired"
            );
        }
        StripeEventKind::PaymentSucceeded => {
            tracing::info!(
                payment_intent = ?object.get("id").and_then(serde_json::Value::as_str),
                amount = ?object.get("amount").and_then(serde_json::Value::as_i64),
                "Stripe payment succeeded"
            );
        }
        StripeEventKind::PaymentFailed => {
            tracing::warn!(
                object_id = ?object.get("id").and_then(serde_json::Value::as_str),
                "Stripe payment failed"
            );
        }
        StripeEventKind::Other => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
        }
    }
}

fn handle_paystack_event(event: &VerifiedEvent) {
    let data = &event.payload["data"];

    match PaystackEventKind::classify(&event.event_type) {
        PaystackEventKind::ChargeSuccess => {
            tracing::info!(
                reference = ?data.get("reference").and_then(serde_json::Value::as_str),
                amount = ?data.get("amount").and_then(serde_json::Value::as_i64),
                currency = ?data.get("currency").and_then(serde_json::Value::as_str),
                "Paystack charge succeeded"
            );
        }
        PaystackEventKind::TransferSuccess => {
            tracing::info!(
                reference = ?data.get("reference").and_then(serde_json::Value::as_str),
                "Paystack transfer succeeded"
            );
        }
        PaystackEventKind::TransferFailed => {
            tracing::warn!(
                reference = ?data.get("reference").and_then(serde_json::Value::as_str),
                event_type = %event.event_type,
                "Paystack transfer did not complete"
            );
        }
        PaystackEventKind::Other => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Paystack event");
        }
    }
}
