//! Telegram Mini App authentication.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use afriprime_core::{Assurance, TelegramUser, VerifiedInitData};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `initData` validation.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// The raw `initData` query string from `Telegram.WebApp.initData`.
    #[serde(rename = "initData", default)]
    pub init_data: String,
}

/// Successful validation response.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// Always true; failures are error responses.
    pub authentic: bool,
    /// Whether the hash was actually checked.
    pub assurance: Assurance,
    /// The Telegram user, when present and decodable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<TelegramUser>,
    /// Why a present `user` field could not be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_error: Option<String>,
    /// When Telegram issued the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_date: Option<DateTime<Utc>>,
    /// Inline query session id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

impl From<VerifiedInitData> for ValidateResponse {
    fn from(data: VerifiedInitData) -> Self {
        Self {
            authentic: true,
            assurance: data.assurance,
            user: data.user,
            user_error: data.user_error,
            auth_date: data.auth_date,
            query_id: data.query_id,
        }
    }
}

/// Validate Telegram Mini App `initData`.
pub async fn validate_init_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let verified = state.init_data.verify(&request.init_data).map_err(|e| {
        tracing::warn!(code = e.code(), error = %e, "Rejected Telegram initData");
        ApiError::from(e)
    })?;

    if verified.assurance == Assurance::DevelopmentBypass {
        tracing::warn!("Accepted Telegram initData without a bot token (development bypass)");
    }

    tracing::debug!(
        telegram_id = ?verified.user.as_ref().map(|u| u.id),
        "Telegram initData verified"
    );

    Ok(Json(verified.into()))
}
