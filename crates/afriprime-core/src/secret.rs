//! Secret key material.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// A signing or verification secret (bot token, webhook secret).
///
/// Loaded once at startup and read-only afterwards. `Debug` never prints the
/// value and the type deliberately does not implement `Serialize`.
#[derive(Clone)]
pub struct SecretMaterial(SecretString);

impl SecretMaterial {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::new(value.into()))
    }

    /// Wrap an optional value, treating empty or whitespace-only strings as
    /// absent. Present values are kept byte for byte.
    #[must_use]
    pub fn from_optional(value: Option<String>) -> Option<Self> {
        value.filter(|v| !v.trim().is_empty()).map(Self::new)
    }

    /// The secret bytes, for keyed-hash computation only.
    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial([REDACTED])")
    }
}
