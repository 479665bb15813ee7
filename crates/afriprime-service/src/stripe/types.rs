//! Stripe API types.

use serde::Deserialize;

/// Stripe Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Checkout URL to redirect the user to.
    #[serde(default)]
    pub url: Option<String>,
    /// Payment status.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Total amount in the currency's minor unit.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Client reference ID (the buyer's Telegram id).
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Session status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Parameters for a one-item payment Checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    /// Reference echoed back in webhooks as `client_reference_id`.
    pub client_reference_id: String,
    /// Amount in the currency's minor unit.
    pub amount_minor: i64,
    /// ISO currency code, lowercase.
    pub currency: String,
    /// Line item name shown on the Checkout page.
    pub product_name: String,
    /// Optional line item description.
    pub description: Option<String>,
    /// URL to redirect on success.
    pub success_url: String,
    /// URL to redirect on cancel.
    pub cancel_url: String,
}

impl CheckoutParams {
    /// Encode as Stripe form fields.
    #[must_use]
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("mode", "payment".to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
            ("client_reference_id", self.client_reference_id.clone()),
            ("line_items[0][price_data][currency]", self.currency.clone()),
            (
                "line_items[0][price_data][product_data][name]",
                self.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                self.amount_minor.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[telegram_id]", self.client_reference_id.clone()),
        ];

        if let Some(description) = &self.description {
            params.push((
                "line_items[0][price_data][product_data][description]",
                description.clone(),
            ));
        }

        params
    }
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
