//! Profile handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use afriprime_core::{Profile, ProfileUpdate, TelegramId};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for profile lookup.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    /// Telegram id of the profile owner.
    #[serde(default)]
    pub telegram_id: Option<String>,
}

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// The profile, or null when none is stored.
    pub profile: Option<Profile>,
}

/// Get a profile by Telegram id.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let raw = query
        .telegram_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing telegram_id".into()))?;

    let telegram_id = raw
        .parse::<TelegramId>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let profile = state.store.get_profile(telegram_id)?;

    Ok(Json(ProfileResponse { profile }))
}

/// Create or replace a profile.
pub async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Json(update) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let update = update.normalize()?;

    let profile = state.store.upsert_profile(update)?;

    tracing::info!(telegram_id = %profile.telegram_id, "Profile saved");

    Ok(Json(ProfileResponse {
        profile: Some(profile),
    }))
}
