//! User profile types.
//!
//! A profile is the small amount of user-editable data the Mini App stores
//! per Telegram user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::TelegramId;

// ============================================================================
// Constants
// ============================================================================

/// Maximum accepted age.
pub const MAX_AGE: u16 = 150;

/// Maximum display name length, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;

/// Maximum location length, in characters.
pub const MAX_LOCATION_CHARS: usize = 128;

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner's Telegram id.
    pub telegram_id: TelegramId,

    /// Display name.
    pub display_name: Option<String>,

    /// Age in years.
    pub age: Option<u16>,

    /// Free-form location.
    pub location: Option<String>,

    /// When the profile was first stored.
    pub created_at: DateTime<Utc>,

    /// When the profile was last written.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create an empty profile for `telegram_id`.
    #[must_use]
    pub fn new(telegram_id: TelegramId) -> Self {
        let now = Utc::now();
        Self {
            telegram_id,
            display_name: None,
            age: None,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update, replacing every editable field.
    ///
    /// Fields absent from the update are cleared; `created_at` is kept.
    pub fn apply(&mut self, update: ProfileUpdate) {
        self.display_name = update.display_name;
        self.age = update.age;
        self.location = update.location;
        self.updated_at = Utc::now();
    }
}

/// Upsert request for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// Owner's Telegram id. Accepted as a number or a numeric string.
    #[serde(deserialize_with = "telegram_id_number_or_string")]
    pub telegram_id: TelegramId,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Age in years.
    #[serde(default)]
    pub age: Option<u16>,
    /// Free-form location.
    #[serde(default)]
    pub location: Option<String>,
}

fn telegram_id_number_or_string<'de, D>(deserializer: D) -> Result<TelegramId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(TelegramId),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(id),
        Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

impl ProfileUpdate {
    /// Trim text fields (blank becomes absent) and check bounds.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Invalid` naming the offending field.
    pub fn normalize(mut self) -> Result<Self, ProfileError> {
        self.display_name = trim_to_option(self.display_name);
        self.location = trim_to_option(self.location);

        if self
            .display_name
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_DISPLAY_NAME_CHARS)
        {
            return Err(ProfileError::Invalid {
                field: "display_name",
                reason: format!("must be at most {MAX_DISPLAY_NAME_CHARS} characters"),
            });
        }

        if self
            .location
            .as_ref()
            .is_some_and(|l| l.chars().count() > MAX_LOCATION_CHARS)
        {
            return Err(ProfileError::Invalid {
                field: "location",
                reason: format!("must be at most {MAX_LOCATION_CHARS} characters"),
            });
        }

        if self.age.is_some_and(|a| a > MAX_AGE) {
            return Err(ProfileError::Invalid {
                field: "age",
                reason: format!("must be between 0 and {MAX_AGE}"),
            });
        }

        Ok(self)
    }
}

fn trim_to_option(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Profile validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// A field failed validation.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
