//! Identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A Telegram user identifier.
///
/// Telegram issues 64-bit integer ids; the value arrives either inside the
/// signed `user` object of `initData` or as a plain number from the profile API.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelegramId(i64);

impl TelegramId {
    /// Create a `TelegramId` from its raw value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Big-endian bytes, so keys sort numerically for non-negative ids.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Rebuild a `TelegramId` from [`TelegramId::to_be_bytes`] output.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidLength` if `bytes` is not 8 bytes long.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, IdError> {
        let raw: [u8; 8] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: 8,
            actual: bytes.len(),
        })?;
        Ok(Self(i64::from_be_bytes(raw)))
    }
}

impl FromStr for TelegramId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|_| IdError::InvalidTelegramId(s.to_string()))?;
        Ok(Self(id))
    }
}

impl fmt::Debug for TelegramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TelegramId({})", self.0)
    }
}

impl fmt::Display for TelegramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TelegramId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Errors from parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The value is not a valid integer Telegram id.
    #[error("invalid telegram id: {0}")]
    InvalidTelegramId(String),

    /// A byte key has the wrong length.
    #[error("invalid id length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
}
