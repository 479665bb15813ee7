//! Telegram Mini App `initData` verification.
//!
//! The Telegram client hands the Mini App a URL-encoded query string such as
//! `query_id=...&user=%7B...%7D&auth_date=1700000000&hash=<hex>`. The `hash`
//! is computed as:
//!
//! ```text
//! secret_key   = HMAC-SHA256(key = "WebAppData", message = bot_token)
//! check_string = sorted("key=value" for every decoded pair except hash).join("\n")
//! hash         = hex(HMAC-SHA256(key = secret_key, message = check_string))
//! ```
//!
//! Sorting is over the fully formatted `key=value` strings in byte order,
//! which differs from sorting by key when a key contains a byte below `=`
//! (for example `a-b` versus `a`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::crypto::{constant_time_eq, hmac_sha256, hmac_sha256_hex, normalize_hex};
use crate::error::VerifyError;
use crate::ids::TelegramId;
use crate::secret::SecretMaterial;
use crate::webhook::{Assurance, DevBypass};

/// Key of the HMAC used to derive the secret from the bot token.
const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Name of the signature field.
const HASH_FIELD: &str = "hash";

/// Decoded `initData` fields in their original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitDataPairs {
    pairs: Vec<(String, String)>,
}

impl InitDataPairs {
    /// Parse a URL-encoded `initData` string.
    ///
    /// Keys and values are form-decoded (`+` is a space, `%XX` escapes are
    /// expanded). Order is preserved.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if the input is blank or contains no pairs.
    /// Non-blank input is decoded exactly as given.
    pub fn parse(raw: &str) -> Result<Self, VerifyError> {
        if raw.trim().is_empty() {
            return Err(VerifyError::malformed("init data is empty"));
        }

        let pairs: Vec<(String, String)> = form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if pairs.is_empty() {
            return Err(VerifyError::malformed("init data contains no fields"));
        }

        Ok(Self { pairs })
    }

    /// Value of the first pair with the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The `hash` value.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` if there is no `hash` pair or it is empty
    /// - `MalformedInput` if `hash` appears more than once
    pub fn hash(&self) -> Result<&str, VerifyError> {
        let mut hashes = self.pairs.iter().filter(|(k, _)| k == HASH_FIELD);

        let (_, first) = hashes.next().ok_or(VerifyError::MissingSignature)?;
        if hashes.next().is_some() {
            return Err(VerifyError::malformed("duplicate hash field"));
        }
        if first.trim().is_empty() {
            return Err(VerifyError::MissingSignature);
        }

        Ok(first)
    }

    /// Every pair except `hash`, in original order.
    pub fn signed_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter(|(k, _)| k != HASH_FIELD)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build the canonical check string the client signed.
    #[must_use]
    pub fn check_string(&self) -> String {
        let mut lines: Vec<String> = self
            .signed_fields()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        lines.sort_unstable();
        lines.join("\n")
    }

    /// Re-encode the pairs as a query string (original order).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// A Telegram user as embedded in the `user` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    /// Telegram user id.
    pub id: TelegramId,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Username without `@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// IETF language tag of the user's client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    /// Whether the user has Telegram Premium.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    /// Whether the user allowed the bot to message them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_write_to_pm: Option<bool>,
    /// Profile photo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// An authenticated `initData` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedInitData {
    /// Whether the hash was checked.
    pub assurance: Assurance,
    /// `auth_date` as a timestamp, when present and numeric.
    pub auth_date: Option<DateTime<Utc>>,
    /// `query_id`, when present.
    pub query_id: Option<String>,
    /// Decoded `user` object, when present and well-formed.
    pub user: Option<TelegramUser>,
    /// Why a present `user` field could not be decoded. Does not affect
    /// authenticity.
    pub user_error: Option<String>,
    /// Every signed field (all pairs except `hash`), in original order.
    pub fields: Vec<(String, String)>,
}

impl VerifiedInitData {
    fn from_pairs(pairs: &InitDataPairs, assurance: Assurance) -> Self {
        let auth_date = pairs
            .get("auth_date")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        let (user, user_error) = match pairs.get("user") {
            None => (None, None),
            Some(raw) => match serde_json::from_str::<TelegramUser>(raw) {
                Ok(user) => (Some(user), None),
                Err(e) => (None, Some(format!("user field could not be decoded: {e}"))),
            },
        };

        Self {
            assurance,
            auth_date,
            query_id: pairs.get("query_id").map(String::from),
            user,
            user_error,
            fields: pairs
                .signed_fields()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Verifier for Telegram Mini App `initData`.
#[derive(Debug, Clone)]
pub struct InitDataVerifier {
    bot_token: Option<SecretMaterial>,
    bypass: DevBypass,
}

impl InitDataVerifier {
    /// Create a verifier for the given bot token.
    #[must_use]
    pub fn new(bot_token: Option<SecretMaterial>, bypass: DevBypass) -> Self {
        Self { bot_token, bypass }
    }

    /// Verify a raw `initData` string.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` if no bot token is set and the bypass is disabled
    /// - `MalformedInput` if the payload is blank, has no fields, or repeats `hash`
    /// - `MissingSignature` if there is no `hash`
    /// - `InvalidSignature` if the hash does not match
    pub fn verify(&self, raw: &str) -> Result<VerifiedInitData, VerifyError> {
        let Some(bot_token) = &self.bot_token else {
            if self.bypass.is_enabled() {
                let pairs = InitDataPairs::parse(raw)?;
                return Ok(VerifiedInitData::from_pairs(
                    &pairs,
                    Assurance::DevelopmentBypass,
                ));
            }
            return Err(VerifyError::NotConfigured("telegram bot token"));
        };

        let pairs = InitDataPairs::parse(raw)?;
        let provided = normalize_hex(pairs.hash()?);

        let expected = compute_hash(bot_token, &pairs.check_string());
        if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            return Err(VerifyError::InvalidSignature);
        }

        Ok(VerifiedInitData::from_pairs(&pairs, Assurance::Signed))
    }
}

/// Compute the `hash` Telegram would send for `check_string`.
fn compute_hash(bot_token: &SecretMaterial, check_string: &str) -> String {
    let secret_key = hmac_sha256(WEB_APP_DATA_KEY, bot_token.expose());
    hmac_sha256_hex(&secret_key, check_string.as_bytes())
}

/// Produce a signed `initData` query string from `fields`, the way the
/// Telegram client does.
///
/// Used by tests and local tooling.
#[must_use]
pub fn sign_init_data(bot_token: &SecretMaterial, fields: &[(&str, &str)]) -> String {
    let pairs = InitDataPairs {
        pairs: fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    };
    let hash = compute_hash(bot_token, &pairs.check_string());

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().copied())
        .append_pair(HASH_FIELD, &hash)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "t0k3n";

    fn token() -> SecretMaterial {
        SecretMaterial::new(BOT_TOKEN)
    }

    fn verifier() -> InitDataVerifier {
        InitDataVerifier::new(Some(token()), DevBypass::Disabled)
    }

    /// The reference two-step process, written out independently.
    fn reference_hash(check_string: &str) -> String {
        let secret_key = hmac_sha256(b"WebAppData", BOT_TOKEN.as_bytes());
        hmac_sha256_hex(&secret_key, check_string.as_bytes())
    }

    // ══════════════════════════════════════════════════════════════
    // Parsing and canonical form
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_decodes_values() {
        let pairs = InitDataPairs::parse("user=%7B%22id%22%3A1%7D&name=a+b").unwrap();
        assert_eq!(pairs.get("user"), Some(r#"{"id":1}"#));
        assert_eq!(pairs.get("name"), Some("a b"));
    }

    #[test]
    fn parse_rejects_blank_input() {
        assert!(matches!(
            InitDataPairs::parse(""),
            Err(VerifyError::MalformedInput(_))
        ));
        assert!(matches!(
            InitDataPairs::parse("   "),
            Err(VerifyError::MalformedInput(_))
        ));
        assert!(matches!(
            InitDataPairs::parse("&&&"),
            Err(VerifyError::MalformedInput(_))
        ));
    }

    #[test]
    fn check_string_excludes_hash_and_sorts() {
        let pairs = InitDataPairs::parse("query_id=abc&hash=ff&auth_date=100").unwrap();
        assert_eq!(pairs.check_string(), "auth_date=100\nquery_id=abc");
    }

    #[test]
    fn check_string_sorts_formatted_strings_not_keys() {
        // By key "a" < "a-b"; by formatted string "a-b=2" < "a=1" since '-' < '='.
        let pairs = InitDataPairs::parse("a=1&a-b=2").unwrap();
        assert_eq!(pairs.check_string(), "a-b=2\na=1");
    }

    #[test]
    fn hash_must_be_unique() {
        let pairs = InitDataPairs::parse("a=1&hash=aa&hash=bb").unwrap();
        assert!(matches!(pairs.hash(), Err(VerifyError::MalformedInput(_))));
    }

    #[test]
    fn empty_hash_is_missing() {
        let pairs = InitDataPairs::parse("a=1&hash=").unwrap();
        assert_eq!(pairs.hash(), Err(VerifyError::MissingSignature));
    }

    // ══════════════════════════════════════════════════════════════
    // Verification
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verifies_reference_vector() {
        let hash = reference_hash("auth_date=100\nquery_id=abc");
        let raw = format!("auth_date=100&query_id=abc&hash={hash}");

        let verified = verifier().verify(&raw).unwrap();

        assert_eq!(verified.assurance, Assurance::Signed);
        assert_eq!(verified.query_id.as_deref(), Some("abc"));
        assert_eq!(
            verified.auth_date,
            DateTime::<Utc>::from_timestamp(100, 0)
        );
    }

    #[test]
    fn trailing_whitespace_in_last_value_is_signed() {
        let hash = reference_hash("auth_date=100\nquery_id=abc ");
        let raw = format!("auth_date=100&hash={hash}&query_id=abc ");

        let verified = verifier().verify(&raw).unwrap();
        assert_eq!(verified.query_id.as_deref(), Some("abc "));
    }

    #[test]
    fn field_order_in_payload_does_not_matter() {
        let hash = reference_hash("auth_date=100\nquery_id=abc");
        let raw = format!("hash={hash}&query_id=abc&auth_date=100");
        assert!(verifier().verify(&raw).is_ok());
    }

    #[test]
    fn corrupted_hash_is_rejected() {
        let mut hash = reference_hash("auth_date=100\nquery_id=abc");
        let last = hash.pop().unwrap();
        hash.push(if last == '0' { '1' } else { '0' });
        let raw = format!("auth_date=100&query_id=abc&hash={hash}");

        assert_eq!(verifier().verify(&raw), Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn key_sorted_signature_is_rejected() {
        // A signer that sorted by key alone produces a different check string.
        let hash = reference_hash("a=1\na-b=2");
        let raw = format!("a=1&a-b=2&hash={hash}");
        assert_eq!(verifier().verify(&raw), Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn uppercase_hash_is_accepted() {
        let hash = reference_hash("auth_date=100\nquery_id=abc").to_ascii_uppercase();
        let raw = format!("auth_date=100&query_id=abc&hash={hash}");
        assert!(verifier().verify(&raw).is_ok());
    }

    #[test]
    fn wrong_token_is_rejected() {
        let raw = sign_init_data(&SecretMaterial::new("other"), &[("auth_date", "100")]);
        assert_eq!(verifier().verify(&raw), Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn missing_hash_is_missing_signature() {
        assert_eq!(
            verifier().verify("auth_date=100&query_id=abc"),
            Err(VerifyError::MissingSignature)
        );
    }

    #[test]
    fn missing_token_is_not_configured() {
        let verifier = InitDataVerifier::new(None, DevBypass::Disabled);
        let raw = sign_init_data(&token(), &[("auth_date", "100")]);

        assert_eq!(
            verifier.verify(&raw),
            Err(VerifyError::NotConfigured("telegram bot token"))
        );
    }

    #[test]
    fn missing_token_with_bypass_is_labelled() {
        let verifier = InitDataVerifier::new(None, DevBypass::AllowUnsigned);
        let verified = verifier.verify("auth_date=100&query_id=abc").unwrap();
        assert_eq!(verified.assurance, Assurance::DevelopmentBypass);
    }

    // ══════════════════════════════════════════════════════════════
    // User decoding
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn decodes_user_on_success() {
        let user = r#"{"id":279058397,"first_name":"Ada","username":"ada","language_code":"en","is_premium":true}"#;
        let raw = sign_init_data(
            &token(),
            &[("query_id", "AAHdF6IQ"), ("user", user), ("auth_date", "1700000000")],
        );

        let verified = verifier().verify(&raw).unwrap();
        let user = verified.user.unwrap();

        assert_eq!(user.id, TelegramId::new(279_058_397));
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.username.as_deref(), Some("ada"));
        assert_eq!(user.is_premium, Some(true));
        assert!(verified.user_error.is_none());
    }

    #[test]
    fn undecodable_user_is_a_note_not_a_failure() {
        let raw = sign_init_data(&token(), &[("user", "{not json"), ("auth_date", "100")]);

        let verified = verifier().verify(&raw).unwrap();

        assert_eq!(verified.assurance, Assurance::Signed);
        assert!(verified.user.is_none());
        assert!(verified.user_error.is_some());
    }

    #[test]
    fn fields_exclude_hash_in_original_order() {
        let raw = sign_init_data(&token(), &[("z", "1"), ("a", "2")]);
        let verified = verifier().verify(&raw).unwrap();

        assert_eq!(
            verified.fields,
            vec![("z".to_string(), "1".to_string()), ("a".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn non_numeric_auth_date_is_ignored() {
        let raw = sign_init_data(&token(), &[("auth_date", "yesterday")]);
        let verified = verifier().verify(&raw).unwrap();
        assert!(verified.auth_date.is_none());
    }
}
